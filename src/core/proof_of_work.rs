use crate::core::Block;
use crate::error::{BlockchainError, Result};
use crate::utils::{serialize, sha256_digest};
use data_encoding::HEXLOWER;

/// Default number of leading hex zeros a solved block hash must have
pub const DEFAULT_DIFFICULTY: usize = 4;

/// Longest meaningful prefix for a hex encoded SHA-256 digest
pub const MAX_DIFFICULTY: usize = 64;

/// Leading-zero target on the textual form of a block hash
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofOfWork {
    difficulty: usize,
    prefix: String,
}

impl ProofOfWork {
    pub fn new(difficulty: usize) -> Result<ProofOfWork> {
        if difficulty == 0 || difficulty > MAX_DIFFICULTY {
            return Err(BlockchainError::Config(format!(
                "Difficulty must be between 1 and {MAX_DIFFICULTY}, got {difficulty}"
            )));
        }
        Ok(ProofOfWork {
            difficulty,
            prefix: "0".repeat(difficulty),
        })
    }

    pub fn get_difficulty(&self) -> usize {
        self.difficulty
    }

    fn prepare_data(block: &Block) -> Result<Vec<u8>> {
        let mut data_bytes = vec![];
        data_bytes.extend(block.get_pre_block_hash().as_bytes());
        data_bytes.extend(serialize(block.get_payload())?);
        data_bytes.extend(block.get_timestamp().to_be_bytes());
        data_bytes.extend(block.get_nonce().to_be_bytes());
        Ok(data_bytes)
    }

    /// Hash of the block contents and its current nonce
    pub fn hash_block(block: &Block) -> Result<String> {
        let data = Self::prepare_data(block)?;
        Ok(HEXLOWER.encode(&sha256_digest(&data)))
    }

    pub fn meets_target(&self, hash: &str) -> bool {
        hash.starts_with(self.prefix.as_str())
    }

    /// Bump the nonce by one, rehash, and report whether the block is solved
    pub fn attempt(&self, block: &mut Block) -> Result<bool> {
        block.increment_nonce();
        let hash = Self::hash_block(block)?;
        let solved = self.meets_target(&hash);
        block.set_hash(hash);
        Ok(solved)
    }

    /// Check the stored hash against the contents and the target
    pub fn validate(&self, block: &Block) -> Result<bool> {
        let hash = Self::hash_block(block)?;
        Ok(hash == block.get_hash() && self.meets_target(&hash))
    }

    /// Attempt until solved (for testing only)
    #[cfg(test)]
    pub fn solve(&self, block: &mut Block) -> Result<()> {
        while !self.attempt(block)? {}
        Ok(())
    }
}
