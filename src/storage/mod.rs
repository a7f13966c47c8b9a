//! In-memory node state that is not part of the chain itself
//!
//! Currently the pool of transactions awaiting inclusion.

pub mod transaction_pool;

pub use transaction_pool::TransactionPool;
