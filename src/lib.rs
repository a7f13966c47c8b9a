//! # Relay Chain - a proof-of-work node that keeps the longest valid chain
//!
//! A node collects transactions from the network, stages them into the
//! block it is mining, and pushes its whole chain to every known peer each
//! time it solves a block. Chains arriving from peers replace the local one
//! when they are strictly longer and verify end to end.
//!
//! ## Layout
//! - `core/`: blocks, transactions, the transaction index, proof-of-work,
//!   the chain store and the chain verifier
//! - `node/`: the shared node handle, the mining loop and chain adoption
//! - `network/`: peers, the wire package and the TCP server
//! - `storage/`: the transaction pool
//! - `wallet/`: the miner identity
//! - `config/`: defaults, TOML file and environment overrides
//! - `utils/`: hashing, signatures and binary encoding
//! - `cli/`: command-line parsing for the binary
//!
//! ## Reading order
//! 1. `node/miner.rs` for the mining cycle
//! 2. `node/sync.rs` for the longest-valid-chain rule
//! 3. `core/ledger.rs` for how double spends are caught
//! 4. `network/server.rs` for the one-package-per-connection protocol

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod network;
pub mod node;
pub mod storage;
pub mod utils;
pub mod wallet;

#[cfg(test)]
pub mod testnet;

// Re-export commonly used types for convenience
pub use cli::{Command, NodeArgs, Opt};
pub use config::Config;
pub use core::{
    verify_chain, Block, ChainStore, Payload, ProofOfWork, Transaction, TransactionIndex, TxKind,
    MINING_REWARD,
};
pub use error::{BlockchainError, Result};
pub use network::{broadcast_chain, send_transaction, Message, Package, Peer, PeerRegistry, Server};
pub use node::{CycleOutcome, FlushReport, HashOutcome, MiningLoop, Node, SyncOutcome};
pub use storage::TransactionPool;
pub use wallet::{decode_hex, MinerIdentity};
