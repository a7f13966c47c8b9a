use crate::core::Transaction;
use crate::error::{BlockchainError, Result};
use crate::utils::current_timestamp;
use serde::{Deserialize, Serialize};

/// Previous-hash marker carried by every genesis block
pub const GENESIS_PRE_BLOCK_HASH: &str = "None";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub enum Payload {
    /// Sentinel payload of the first block, never carries transactions
    Genesis,
    Transactions(Vec<Transaction>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct Block {
    timestamp: i64,
    pre_block_hash: String,
    hash: String,
    payload: Payload,
    nonce: u64,
}

impl Block {
    /// An empty working block extending `pre_block_hash`
    pub fn new_block(pre_block_hash: String) -> Result<Block> {
        Ok(Block {
            timestamp: current_timestamp()?,
            pre_block_hash,
            hash: String::new(),
            payload: Payload::Transactions(vec![]),
            nonce: 0,
        })
    }

    pub fn generate_genesis_block() -> Result<Block> {
        Ok(Block {
            timestamp: current_timestamp()?,
            pre_block_hash: String::from(GENESIS_PRE_BLOCK_HASH),
            hash: String::new(),
            payload: Payload::Genesis,
            nonce: 0,
        })
    }

    pub fn is_genesis(&self) -> bool {
        matches!(self.payload, Payload::Genesis)
    }

    /// Transactions in the block; empty for the genesis block
    pub fn get_transactions(&self) -> &[Transaction] {
        match &self.payload {
            Payload::Genesis => &[],
            Payload::Transactions(transactions) => transactions.as_slice(),
        }
    }

    /// Mutable staging area of a working block
    pub(crate) fn staged_transactions_mut(&mut self) -> Result<&mut Vec<Transaction>> {
        match &mut self.payload {
            Payload::Genesis => Err(BlockchainError::InvalidBlock(
                "Genesis block cannot carry transactions".to_string(),
            )),
            Payload::Transactions(transactions) => Ok(transactions),
        }
    }

    pub fn get_payload(&self) -> &Payload {
        &self.payload
    }

    pub fn get_pre_block_hash(&self) -> &str {
        self.pre_block_hash.as_str()
    }

    pub fn get_hash(&self) -> &str {
        self.hash.as_str()
    }

    pub(crate) fn set_hash(&mut self, hash: String) {
        self.hash = hash;
    }

    pub fn get_timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn get_nonce(&self) -> u64 {
        self.nonce
    }

    pub(crate) fn increment_nonce(&mut self) {
        self.nonce = self.nonce.wrapping_add(1);
    }

    /// Overwrite the link to the previous block (for testing only)
    #[cfg(test)]
    pub fn set_pre_block_hash(&mut self, pre_block_hash: &str) {
        self.pre_block_hash = pre_block_hash.to_string();
    }
}
