//! Test utilities for node testing

use crate::config::Config;
use crate::core::{Block, ProofOfWork, Transaction, TransactionIndex};
use crate::node::{CycleOutcome, MiningLoop, Node};
use crate::wallet::MinerIdentity;
use std::thread;
use std::time::{Duration, Instant};

/// Easy difficulty and short intervals for fast tests
pub fn test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        peers: vec![],
        mining: true,
        difficulty: 1,
        miner_key: None,
        owner_public_key: None,
        peer_timeout_ms: 2000,
        idle_interval_ms: 10,
    }
}

pub fn test_identity() -> MinerIdentity {
    MinerIdentity::generate(None).expect("key generation")
}

/// A fresh node with an empty chain
pub fn test_node() -> Node {
    Node::new(&test_config(), test_identity()).expect("test node")
}

/// A transfer signed by `owner`, spending `inputs` in full
pub fn signed_transfer(
    owner: &MinerIdentity,
    recipient: &[u8],
    amount: u64,
    inputs: &[&Transaction],
) -> Transaction {
    let inputs: Vec<Vec<u8>> = inputs.iter().map(|tx| tx.get_id().to_vec()).collect();
    Transaction::new_transfer(owner.get_pkcs8(), recipient, amount, &inputs)
        .expect("signed transfer")
}

/// A fully solved chain of `length` blocks: genesis followed by blocks that
/// each carry one coinbase for `miner`. Returns the index the chain implies.
pub fn mined_chain(
    miner: &MinerIdentity,
    length: usize,
    difficulty: usize,
) -> (Vec<Block>, TransactionIndex) {
    let pow = ProofOfWork::new(difficulty).expect("difficulty");
    let mut index = TransactionIndex::new();
    let mut blocks = Vec::with_capacity(length);

    let mut genesis = Block::generate_genesis_block().expect("genesis");
    pow.solve(&mut genesis).expect("solve genesis");
    blocks.push(genesis);

    while blocks.len() < length {
        let pre_block_hash = blocks[blocks.len() - 1].get_hash().to_string();
        let mut block = Block::new_block(pre_block_hash).expect("block");
        let coinbase = Transaction::new_coinbase(miner).expect("coinbase");
        index.commit(&coinbase);
        block
            .staged_transactions_mut()
            .expect("working block")
            .push(coinbase);
        pow.solve(&mut block).expect("solve block");
        blocks.push(block);
    }

    blocks.truncate(length);
    (blocks, index)
}

/// Install a mined chain on `node` and open a fresh working block on top
pub fn node_with_chain(node: &Node, blocks: Vec<Block>, index: TransactionIndex) {
    let mut blocks = blocks;
    let pre_block_hash = blocks
        .last()
        .map(|tip| tip.get_hash().to_string())
        .expect("non-empty chain");
    blocks.push(Block::new_block(pre_block_hash).expect("block"));
    node.install_chain(blocks, index);
}

/// Run cycles until one solves a block
pub fn mine_until_solved(mining_loop: &MiningLoop) -> CycleOutcome {
    for _ in 0..10_000 {
        let outcome = mining_loop.run_cycle().expect("mining cycle");
        if matches!(outcome, CycleOutcome::Solved { .. }) {
            return outcome;
        }
    }
    panic!("no block solved at test difficulty");
}

/// Poll `condition` until it holds or `timeout` elapses
pub fn wait_until<F>(timeout: Duration, condition: F) -> bool
where
    F: Fn() -> bool,
{
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    condition()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::verify_chain;

    #[test]
    fn test_mined_chain_verifies() {
        let miner = test_identity();
        let (blocks, index) = mined_chain(&miner, 4, 1);

        assert_eq!(blocks.len(), 4);
        let pow = ProofOfWork::new(1).unwrap();
        assert_eq!(verify_chain(&blocks, &pow).unwrap(), index);
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn test_node_with_chain_opens_working_block() {
        let node = test_node();
        let (blocks, index) = mined_chain(node.get_identity(), 2, 1);

        node_with_chain(&node, blocks.clone(), index);

        let chain = node.chain_snapshot().unwrap();
        assert_eq!(chain.len(), 3);
        assert_eq!(chain[2].get_pre_block_hash(), blocks[1].get_hash());
        assert!(chain[2].get_transactions().is_empty());
    }
}
