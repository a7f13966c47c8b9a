// The mining loop: bootstrap, flush the pool into the working block, try one nonce, repeat.
// A solved block is pushed to every peer before the node builds on top of it.

use crate::core::{ChainStore, Transaction, TransactionIndex};
use crate::error::{BlockchainError, Result};
use crate::network::broadcast_chain;
use crate::node::Node;
use log::{debug, error, info, warn};
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::thread::{self, JoinHandle};

/// Result of staging one pool batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushReport {
    pub accepted: usize,
    pub rejected: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HashOutcome {
    /// Mining is switched off; the node slept instead of hashing
    Idle,
    Unsolved,
    Solved { hash: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    Idle,
    Unsolved,
    Solved {
        hash: String,
        /// Peers that acknowledged the chain
        delivered: usize,
        /// False when a concurrent adoption already moved the tip
        advanced: bool,
    },
}

impl Node {
    /// Move the whole pool into the working block.
    ///
    /// Every drained transaction is judged independently against the index
    /// and whatever this batch has already staged; rejects are dropped for
    /// good. Returns once every transaction has been judged. While the tip
    /// is the genesis block the pool is left untouched; it is flushed once
    /// the node mines past genesis or adopts a longer chain.
    pub fn flush_pool(&self) -> Result<FlushReport> {
        let mut store = self.chain_write()?;
        let staging_open = store.tip().is_some_and(|tip| !tip.is_genesis());
        if !staging_open {
            return Ok(FlushReport::default());
        }

        let batch = self.get_pool().drain();
        if batch.is_empty() {
            return Ok(FlushReport::default());
        }

        let total = batch.len();
        let (index, staged) = store.staging_area()?;
        let miner_key = self.get_identity().get_public_key();
        let accepted = stage_batch(&batch, miner_key, index, staged);
        let report = FlushReport {
            accepted,
            rejected: total - accepted,
        };
        info!(
            "Flushed {total} pooled transaction(s): {} staged, {} discarded",
            report.accepted, report.rejected
        );
        Ok(report)
    }

    /// One proof-of-work step on the tip block
    pub fn attempt_hash(&self) -> Result<HashOutcome> {
        if !self.is_mining() {
            thread::sleep(self.get_idle_interval());
            return Ok(HashOutcome::Idle);
        }

        let mut store = self.chain_write()?;
        let tip = store.tip_mut()?;
        if self.get_pow().attempt(tip)? {
            info!(
                "Solved block {} with nonce {}",
                tip.get_hash(),
                tip.get_nonce()
            );
            Ok(HashOutcome::Solved {
                hash: tip.get_hash().to_string(),
            })
        } else {
            Ok(HashOutcome::Unsolved)
        }
    }

    /// Build on top of a freshly solved block, provided it is still the tip
    pub(crate) fn advance_after_solve(&self, solved_hash: &str) -> Result<bool> {
        let coinbase = {
            let mut store = self.chain_write()?;
            if store.tip().map(|tip| tip.get_hash()) != Some(solved_hash) {
                warn!("Chain moved past solved block {solved_hash}, not extending it");
                return Ok(false);
            }
            self.push_new_block(&mut store)?
        };
        self.get_pool().add(coinbase);
        Ok(true)
    }

    /// Append a working block and mint the coinbase that will go into it.
    ///
    /// The coinbase is returned rather than queued so the caller can release
    /// the chain store first.
    pub(crate) fn push_new_block(&self, store: &mut ChainStore) -> Result<Transaction> {
        let coinbase = Transaction::new_coinbase(self.get_identity())?;
        store.push_block()?;
        Ok(coinbase)
    }
}

/// Stage `batch` into the working block. Only coinbases signed by
/// `miner_key` are staged; rewards minted elsewhere never enter this block.
fn stage_batch(
    batch: &[Transaction],
    miner_key: &[u8],
    index: &mut TransactionIndex,
    staged: &mut Vec<Transaction>,
) -> usize {
    let workers = thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
        .clamp(1, batch.len().max(1));
    let chunk_size = batch.len().div_ceil(workers).max(1);

    let stage = Mutex::new((index, staged));
    let accepted = AtomicUsize::new(0);

    thread::scope(|scope| {
        for chunk in batch.chunks(chunk_size) {
            let stage = &stage;
            let accepted = &accepted;
            scope.spawn(move || {
                for tx in chunk {
                    // Signature checks run in parallel, staging is serialised
                    if !tx.verify_signature() {
                        debug!("Discarding transaction {}: bad signature", tx.get_id_hex());
                        continue;
                    }
                    if tx.is_coinbase() && tx.get_sender() != miner_key {
                        debug!("Discarding coinbase {}: not minted here", tx.get_id_hex());
                        continue;
                    }
                    let mut guard = match stage.lock() {
                        Ok(guard) => guard,
                        Err(_) => {
                            error!("Failed to acquire staging lock");
                            return;
                        }
                    };
                    let (index, staged) = &mut *guard;
                    match index.validate(tx, staged.as_slice()) {
                        Ok(()) => {
                            index.commit(tx);
                            staged.push(tx.clone());
                            accepted.fetch_add(1, Ordering::SeqCst);
                        }
                        Err(e) => debug!("Discarding transaction {}: {e}", tx.get_id_hex()),
                    }
                }
            });
        }
    });

    accepted.into_inner()
}

/// Drives a node forward forever: one cycle per nonce attempt
pub struct MiningLoop {
    node: Node,
}

impl MiningLoop {
    pub fn new(node: Node) -> MiningLoop {
        MiningLoop { node }
    }

    pub fn spawn(self) -> Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("miner".to_string())
            .spawn(move || self.run())
            .map_err(|e| BlockchainError::Mining(format!("Failed to start mining thread: {e}")))
    }

    /// Cycle until the node is shut down. A failed cycle is logged and the
    /// next one starts after the idle interval.
    pub fn run(&self) {
        info!("Mining loop started for {}", self.node.get_node_addr());
        while self.node.is_running() {
            if let Err(e) = self.run_cycle() {
                error!("Mining cycle failed: {e}");
                thread::sleep(self.node.get_idle_interval());
            }
            thread::yield_now();
        }
        info!("Mining loop stopped");
    }

    pub fn run_cycle(&self) -> Result<CycleOutcome> {
        self.node.bootstrap()?;
        self.node.flush_pool()?;

        match self.node.attempt_hash()? {
            HashOutcome::Idle => Ok(CycleOutcome::Idle),
            HashOutcome::Unsolved => Ok(CycleOutcome::Unsolved),
            HashOutcome::Solved { hash } => {
                let blocks = self.node.chain_snapshot()?;
                let peers = self.node.get_peers();
                let delivered = broadcast_chain(
                    self.node.get_node_addr(),
                    &peers,
                    &blocks,
                    self.node.get_peer_timeout(),
                );
                let advanced = self.node.advance_after_solve(&hash)?;
                Ok(CycleOutcome::Solved {
                    hash,
                    delivered,
                    advanced,
                })
            }
        }
    }
}
