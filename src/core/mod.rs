//! Core chain functionality
//!
//! Blocks, transactions, the transaction index that backs double-spend
//! detection, proof-of-work and the chain store with its verifier.

pub mod block;
pub mod chain;
pub mod ledger;
pub mod monetary;
pub mod proof_of_work;
pub mod transaction;

pub use block::{Block, Payload, GENESIS_PRE_BLOCK_HASH};
pub use chain::{verify_chain, ChainStore};
pub use ledger::TransactionIndex;
pub use monetary::MINING_REWARD;
pub use proof_of_work::{ProofOfWork, DEFAULT_DIFFICULTY, MAX_DIFFICULTY};
pub use transaction::{Transaction, TxKind};
