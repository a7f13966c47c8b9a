// The node's best chain and the index of everything committed to it.
// Both live in one store so that they are always swapped together.

use crate::core::{Block, ProofOfWork, Transaction, TransactionIndex, GENESIS_PRE_BLOCK_HASH};
use crate::error::{BlockchainError, Result};
use log::info;

#[derive(Debug, Clone, Default)]
pub struct ChainStore {
    blocks: Vec<Block>, // oldest first, blocks[0] is genesis
    index: TransactionIndex,
}

impl ChainStore {
    pub fn new() -> ChainStore {
        ChainStore::default()
    }

    /// Create the genesis block if the chain is empty.
    ///
    /// Returns true when a genesis block was created.
    pub fn bootstrap(&mut self) -> Result<bool> {
        if !self.blocks.is_empty() {
            return Ok(false);
        }

        let genesis = Block::generate_genesis_block()?;
        self.blocks.push(genesis);
        self.index = TransactionIndex::new();
        info!("Created genesis block");
        Ok(true)
    }

    pub fn get_blocks(&self) -> &[Block] {
        self.blocks.as_slice()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn tip(&self) -> Option<&Block> {
        self.blocks.last()
    }

    pub(crate) fn tip_mut(&mut self) -> Result<&mut Block> {
        self.blocks
            .last_mut()
            .ok_or_else(|| BlockchainError::InvalidBlock("Chain is empty".to_string()))
    }

    pub fn get_index(&self) -> &TransactionIndex {
        &self.index
    }

    /// Index and the tip's staging area, borrowed together for a flush
    pub(crate) fn staging_area(
        &mut self,
    ) -> Result<(&mut TransactionIndex, &mut Vec<Transaction>)> {
        let tip = self
            .blocks
            .last_mut()
            .ok_or_else(|| BlockchainError::InvalidBlock("Chain is empty".to_string()))?;
        let staged = tip.staged_transactions_mut()?;
        Ok((&mut self.index, staged))
    }

    /// Append a fresh working block on top of the tip
    pub fn push_block(&mut self) -> Result<&Block> {
        let pre_block_hash = self
            .tip()
            .map(|tip| tip.get_hash().to_string())
            .ok_or_else(|| {
                BlockchainError::InvalidBlock("Cannot extend an empty chain".to_string())
            })?;

        let block = Block::new_block(pre_block_hash.clone())?;
        self.blocks.push(block);
        info!(
            "Pushed block at height {} on top of {}",
            self.blocks.len() - 1,
            pre_block_hash
        );
        self.tip()
            .ok_or_else(|| BlockchainError::InvalidBlock("Chain is empty".to_string()))
    }

    /// Swap in a verified chain together with the index it implies
    pub fn replace(&mut self, blocks: Vec<Block>, index: TransactionIndex) {
        self.blocks = blocks;
        self.index = index;
    }
}

/// Structurally and cryptographically verify a candidate chain, replaying
/// its transactions. Returns the transaction index the chain implies.
pub fn verify_chain(blocks: &[Block], pow: &ProofOfWork) -> Result<TransactionIndex> {
    let genesis = blocks
        .first()
        .ok_or_else(|| BlockchainError::InvalidChain("Chain is empty".to_string()))?;
    if !genesis.is_genesis() || genesis.get_pre_block_hash() != GENESIS_PRE_BLOCK_HASH {
        return Err(BlockchainError::InvalidChain(
            "First block is not a genesis block".to_string(),
        ));
    }

    let mut index = TransactionIndex::new();
    for (height, block) in blocks.iter().enumerate() {
        if height > 0 {
            if block.is_genesis() {
                return Err(BlockchainError::InvalidChain(format!(
                    "Unexpected genesis block at height {height}"
                )));
            }
            let previous = &blocks[height - 1];
            if block.get_pre_block_hash() != previous.get_hash() {
                return Err(BlockchainError::InvalidChain(format!(
                    "Block at height {height} does not link to its predecessor"
                )));
            }
        }

        if !pow.validate(block)? {
            return Err(BlockchainError::InvalidChain(format!(
                "Block at height {height} fails proof-of-work"
            )));
        }

        let mut staged: Vec<Transaction> = Vec::with_capacity(block.get_transactions().len());
        for tx in block.get_transactions() {
            if !tx.verify_signature() {
                return Err(BlockchainError::InvalidChain(format!(
                    "Bad signature on transaction {} at height {height}",
                    tx.get_id_hex()
                )));
            }
            index.validate(tx, &staged).map_err(|e| {
                BlockchainError::InvalidChain(format!("Height {height}: {e}"))
            })?;
            index.commit(tx);
            staged.push(tx.clone());
        }
    }

    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::MINING_REWARD;
    use crate::testnet::{mined_chain, signed_transfer, test_identity};

    #[test]
    fn test_bootstrap_is_idempotent() {
        let mut store = ChainStore::new();

        assert!(store.bootstrap().unwrap());
        let genesis_hash = store.tip().unwrap().get_hash().to_string();
        assert!(!store.bootstrap().unwrap());

        assert_eq!(store.len(), 1);
        assert!(store.tip().unwrap().is_genesis());
        assert_eq!(store.tip().unwrap().get_hash(), genesis_hash);
        assert!(store.get_index().is_empty());
    }

    #[test]
    fn test_push_block_links_to_tip() {
        let mut store = ChainStore::new();
        store.bootstrap().unwrap();
        let pow = ProofOfWork::new(1).unwrap();
        pow.solve(store.tip_mut().unwrap()).unwrap();
        let genesis_hash = store.tip().unwrap().get_hash().to_string();

        let pushed = store.push_block().unwrap();

        assert_eq!(pushed.get_pre_block_hash(), genesis_hash);
        assert!(pushed.get_transactions().is_empty());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_push_block_on_empty_chain() {
        let mut store = ChainStore::new();
        assert!(store.push_block().is_err());
    }

    #[test]
    fn test_staging_area_rejects_genesis_tip() {
        let mut store = ChainStore::new();
        store.bootstrap().unwrap();
        assert!(store.staging_area().is_err());
    }

    #[test]
    fn test_verify_accepts_mined_chain() {
        let miner = test_identity();
        let (blocks, _) = mined_chain(&miner, 4, 1);
        let pow = ProofOfWork::new(1).unwrap();

        let index = verify_chain(&blocks, &pow).unwrap();
        // Every non-genesis block carries one coinbase
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn test_verify_rejects_empty_and_headless_chains() {
        let pow = ProofOfWork::new(1).unwrap();
        assert!(verify_chain(&[], &pow).is_err());

        let miner = test_identity();
        let (blocks, _) = mined_chain(&miner, 3, 1);
        assert!(verify_chain(&blocks[1..], &pow).is_err());
    }

    #[test]
    fn test_verify_rejects_broken_link() {
        let miner = test_identity();
        let (mut blocks, _) = mined_chain(&miner, 3, 1);
        let pow = ProofOfWork::new(1).unwrap();

        blocks[2].set_pre_block_hash("elsewhere");
        pow.solve(&mut blocks[2]).unwrap();

        assert!(verify_chain(&blocks, &pow).is_err());
    }

    #[test]
    fn test_verify_rejects_unsolved_block() {
        let miner = test_identity();
        let (mut blocks, _) = mined_chain(&miner, 3, 1);
        let pow = ProofOfWork::new(1).unwrap();

        // Find a nonce that misses the target
        while pow.attempt(&mut blocks[2]).unwrap() {}

        assert!(verify_chain(&blocks, &pow).is_err());
    }

    #[test]
    fn test_verify_rejects_double_spend_across_blocks() {
        let miner = test_identity();
        let pow = ProofOfWork::new(1).unwrap();
        let (mut blocks, _) = mined_chain(&miner, 2, 1);
        let coinbase = blocks[1].get_transactions()[0].clone();

        for recipient in [[7u8; 65], [8u8; 65]] {
            let tip_hash = blocks.last().unwrap().get_hash().to_string();
            let mut block = Block::new_block(tip_hash).unwrap();
            block
                .staged_transactions_mut()
                .unwrap()
                .push(signed_transfer(&miner, &recipient, MINING_REWARD, &[&coinbase]));
            pow.solve(&mut block).unwrap();
            blocks.push(block);
        }

        assert!(verify_chain(&blocks[..3], &pow).is_ok());
        assert!(verify_chain(&blocks, &pow).is_err());
    }

    #[test]
    fn test_replace_swaps_blocks_and_index() {
        let miner = test_identity();
        let (blocks, index) = mined_chain(&miner, 3, 1);
        let mut store = ChainStore::new();
        store.bootstrap().unwrap();

        store.replace(blocks.clone(), index.clone());

        assert_eq!(store.get_blocks(), blocks.as_slice());
        assert_eq!(store.get_index(), &index);
    }
}
