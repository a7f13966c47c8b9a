use crate::core::Transaction;
use std::sync::RwLock;

/// Transactions waiting to be staged into the working block, in arrival order
pub struct TransactionPool {
    inner: RwLock<Vec<Transaction>>,
}

impl Default for TransactionPool {
    fn default() -> Self {
        Self::new()
    }
}

impl TransactionPool {
    pub fn new() -> TransactionPool {
        TransactionPool {
            inner: RwLock::new(vec![]),
        }
    }

    pub fn add(&self, tx: Transaction) {
        match self.inner.write() {
            Ok(mut pool) => pool.push(tx),
            Err(_) => {
                log::error!("Failed to acquire write lock on transaction pool");
            }
        }
    }

    pub fn extend(&self, txs: Vec<Transaction>) {
        match self.inner.write() {
            Ok(mut pool) => pool.extend(txs),
            Err(_) => {
                log::error!("Failed to acquire write lock on transaction pool");
            }
        }
    }

    /// Take every pending transaction, leaving a fresh empty pool behind.
    ///
    /// The swap happens under one write lock, so no reader can observe a
    /// half-drained pool.
    pub fn drain(&self) -> Vec<Transaction> {
        match self.inner.write() {
            Ok(mut pool) => std::mem::take(&mut *pool),
            Err(_) => {
                log::error!("Failed to acquire write lock on transaction pool");
                Vec::new()
            }
        }
    }

    pub fn contains(&self, txid_hex: &str) -> bool {
        match self.inner.read() {
            Ok(pool) => pool.iter().any(|tx| tx.get_id_hex() == txid_hex),
            Err(_) => {
                log::error!("Failed to acquire read lock on transaction pool");
                false
            }
        }
    }

    pub fn get_all(&self) -> Vec<Transaction> {
        match self.inner.read() {
            Ok(pool) => pool.clone(),
            Err(_) => {
                log::error!("Failed to acquire read lock on transaction pool");
                Vec::new()
            }
        }
    }

    pub fn len(&self) -> usize {
        match self.inner.read() {
            Ok(pool) => pool.len(),
            Err(_) => {
                log::error!("Failed to acquire read lock on transaction pool");
                0
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        match self.inner.read() {
            Ok(pool) => pool.is_empty(),
            Err(_) => {
                log::error!("Failed to acquire read lock on transaction pool");
                true
            }
        }
    }
}
