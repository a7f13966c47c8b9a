//! Node orchestration
//!
//! [`Node`] is a cheap, clonable handle over everything a running node
//! mutates: the chain store, the transaction pool and the peer registry.
//! The mining loop and every inbound connection share one handle; all
//! mutation goes through its methods.
//!
//! Lock order is chain store before pool. The sync path releases the chain
//! store before touching the pool.

pub mod miner;
pub mod sync;

pub use miner::{CycleOutcome, FlushReport, HashOutcome, MiningLoop};
pub use sync::SyncOutcome;

use crate::config::Config;
use crate::core::{Block, ChainStore, ProofOfWork, Transaction, TransactionIndex};
use crate::error::{BlockchainError, Result};
use crate::network::{Peer, PeerRegistry};
use crate::storage::TransactionPool;
use crate::wallet::MinerIdentity;
use log::info;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

#[derive(Clone)]
pub struct Node {
    inner: Arc<NodeState>,
}

struct NodeState {
    chain: RwLock<ChainStore>,
    pool: TransactionPool,
    peers: PeerRegistry,
    identity: MinerIdentity,
    pow: ProofOfWork,
    mining: AtomicBool,
    running: AtomicBool,
    node_addr: String,
    peer_timeout: Option<Duration>,
    idle_interval: Duration,
}

impl Node {
    pub fn new(config: &Config, identity: MinerIdentity) -> Result<Node> {
        config.validate()?;
        let node = Node {
            inner: Arc::new(NodeState {
                chain: RwLock::new(ChainStore::new()),
                pool: TransactionPool::new(),
                peers: PeerRegistry::new(),
                identity,
                pow: ProofOfWork::new(config.difficulty)?,
                mining: AtomicBool::new(config.mining),
                running: AtomicBool::new(true),
                node_addr: config.get_node_addr(),
                peer_timeout: config.peer_timeout(),
                idle_interval: config.idle_interval(),
            }),
        };
        node.add_peers(&config.parse_peers()?);
        Ok(node)
    }

    /// Build a node whose identity comes from the configured keys
    pub fn from_config(config: &Config) -> Result<Node> {
        let identity = MinerIdentity::from_hex(
            config.miner_key.as_deref(),
            config.owner_public_key.as_deref(),
        )?;
        Self::new(config, identity)
    }

    fn chain_read(&self) -> Result<RwLockReadGuard<'_, ChainStore>> {
        self.inner
            .chain
            .read()
            .map_err(|e| BlockchainError::Lock(format!("chain store: {e}")))
    }

    fn chain_write(&self) -> Result<RwLockWriteGuard<'_, ChainStore>> {
        self.inner
            .chain
            .write()
            .map_err(|e| BlockchainError::Lock(format!("chain store: {e}")))
    }

    /// Create the genesis block if the chain is still empty
    pub fn bootstrap(&self) -> Result<bool> {
        self.chain_write()?.bootstrap()
    }

    /// Queue a transaction from the network for the next flush
    pub fn add_transaction(&self, tx: Transaction) {
        info!("Queued transaction {}", tx.get_id_hex());
        self.inner.pool.add(tx);
    }

    pub fn add_peers(&self, peers: &[Peer]) -> usize {
        let added = self.inner.peers.add(peers);
        if added > 0 {
            info!("Registered {added} new peer(s)");
        }
        added
    }

    pub fn get_peers(&self) -> Vec<Peer> {
        self.inner.peers.get_peers()
    }

    /// Switch proof-of-work on or off; the loop keeps cycling either way
    pub fn set_mining(&self, enabled: bool) {
        self.inner.mining.store(enabled, Ordering::SeqCst);
        info!("Mining {}", if enabled { "enabled" } else { "disabled" });
    }

    pub fn is_mining(&self) -> bool {
        self.inner.mining.load(Ordering::SeqCst)
    }

    /// Ask the mining loop to stop after its current cycle
    pub fn shutdown(&self) {
        self.inner.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::SeqCst)
    }

    pub fn chain_snapshot(&self) -> Result<Vec<Block>> {
        Ok(self.chain_read()?.get_blocks().to_vec())
    }

    pub fn chain_len(&self) -> Result<usize> {
        Ok(self.chain_read()?.len())
    }

    pub fn index_snapshot(&self) -> Result<TransactionIndex> {
        Ok(self.chain_read()?.get_index().clone())
    }

    pub fn pool_snapshot(&self) -> Vec<Transaction> {
        self.inner.pool.get_all()
    }

    pub fn get_identity(&self) -> &MinerIdentity {
        &self.inner.identity
    }

    pub fn get_node_addr(&self) -> &str {
        self.inner.node_addr.as_str()
    }

    pub fn get_peer_timeout(&self) -> Option<Duration> {
        self.inner.peer_timeout
    }

    pub(crate) fn get_idle_interval(&self) -> Duration {
        self.inner.idle_interval
    }

    pub(crate) fn get_pow(&self) -> &ProofOfWork {
        &self.inner.pow
    }

    pub(crate) fn get_pool(&self) -> &TransactionPool {
        &self.inner.pool
    }

    /// Install a chain directly, bypassing consensus (for testing only)
    #[cfg(test)]
    pub(crate) fn install_chain(&self, blocks: Vec<Block>, index: TransactionIndex) {
        self.chain_write()
            .expect("chain store lock")
            .replace(blocks, index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testnet::{test_config, test_node};

    #[test]
    fn test_new_node_registers_configured_peers() {
        let config = Config {
            peers: vec!["127.0.0.1:4100".to_string(), "127.0.0.1:4100".to_string()],
            ..test_config()
        };
        let node = Node::new(&config, crate::testnet::test_identity()).unwrap();

        assert_eq!(node.get_peers(), vec![Peer::new("127.0.0.1", 4100)]);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = Config {
            difficulty: 0,
            ..test_config()
        };
        assert!(Node::from_config(&config).is_err());
    }

    #[test]
    fn test_bootstrap_twice_yields_one_genesis() {
        let node = test_node();

        assert!(node.bootstrap().unwrap());
        assert!(!node.bootstrap().unwrap());

        let chain = node.chain_snapshot().unwrap();
        assert_eq!(chain.len(), 1);
        assert!(chain[0].is_genesis());
    }

    #[test]
    fn test_mining_toggle_and_shutdown() {
        let node = test_node();
        assert!(node.is_mining());

        node.set_mining(false);
        assert!(!node.is_mining());

        assert!(node.is_running());
        node.clone().shutdown();
        assert!(!node.is_running());
    }

    #[test]
    fn test_add_transaction_appends_to_pool() {
        let node = test_node();
        let tx = Transaction::new_coinbase(node.get_identity()).unwrap();

        node.add_transaction(tx.clone());

        assert_eq!(node.pool_snapshot(), vec![tx]);
    }
}
