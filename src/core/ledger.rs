use crate::core::{Transaction, MINING_REWARD};
use crate::error::{BlockchainError, Result};
use data_encoding::HEXLOWER;
use std::collections::{HashMap, HashSet};

/// Transactions committed to the active chain, keyed by hex id, plus the
/// ids already consumed as inputs.
///
/// Owned by the chain store and rebuilt wholesale whenever the chain is
/// replaced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionIndex {
    committed: HashMap<String, Transaction>,
    spent: HashSet<String>,
}

impl TransactionIndex {
    pub fn new() -> TransactionIndex {
        TransactionIndex::default()
    }

    pub fn contains(&self, txid_hex: &str) -> bool {
        self.committed.contains_key(txid_hex)
    }

    pub fn get(&self, txid_hex: &str) -> Option<&Transaction> {
        self.committed.get(txid_hex)
    }

    pub fn is_spent(&self, txid_hex: &str) -> bool {
        self.spent.contains(txid_hex)
    }

    pub fn len(&self) -> usize {
        self.committed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.committed.is_empty()
    }

    /// Record `tx` as committed and its inputs as spent
    pub fn commit(&mut self, tx: &Transaction) {
        for input in tx.get_inputs() {
            self.spent.insert(HEXLOWER.encode(input));
        }
        self.committed.insert(tx.get_id_hex(), tx.clone());
    }

    /// Judge a signature-checked transaction against this index and the
    /// transactions already staged in the block under construction.
    pub fn validate(&self, tx: &Transaction, staged: &[Transaction]) -> Result<()> {
        let txid_hex = tx.get_id_hex();
        if self.contains(&txid_hex) {
            return Err(BlockchainError::Transaction(format!(
                "Transaction {txid_hex} is already committed"
            )));
        }
        if staged.iter().any(|other| other.get_id() == tx.get_id()) {
            return Err(BlockchainError::Transaction(format!(
                "Transaction {txid_hex} is already staged in this block"
            )));
        }

        if tx.is_coinbase() {
            self.validate_coinbase(tx, staged)
        } else {
            self.validate_transfer(tx, staged)
        }
    }

    fn validate_coinbase(&self, tx: &Transaction, staged: &[Transaction]) -> Result<()> {
        if !tx.get_inputs().is_empty() {
            return Err(BlockchainError::Transaction(
                "Coinbase transaction cannot spend inputs".to_string(),
            ));
        }
        if tx.get_amount() != MINING_REWARD {
            return Err(BlockchainError::Transaction(format!(
                "Coinbase reward must be {MINING_REWARD}, got {}",
                tx.get_amount()
            )));
        }
        if staged.iter().any(Transaction::is_coinbase) {
            return Err(BlockchainError::Transaction(
                "Block already carries a coinbase transaction".to_string(),
            ));
        }
        Ok(())
    }

    fn validate_transfer(&self, tx: &Transaction, staged: &[Transaction]) -> Result<()> {
        if tx.get_inputs().is_empty() {
            return Err(BlockchainError::Transaction(
                "Transfer must spend at least one input".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        let mut total: u64 = 0;
        for input in tx.get_inputs() {
            let input_hex = HEXLOWER.encode(input);
            if !seen.insert(input_hex.clone()) {
                return Err(BlockchainError::Transaction(format!(
                    "Input {input_hex} is listed twice"
                )));
            }

            let previous = self.get(&input_hex).ok_or_else(|| {
                BlockchainError::Transaction(format!("Input {input_hex} is not committed"))
            })?;
            if previous.get_recipient() != tx.get_sender() {
                return Err(BlockchainError::Transaction(format!(
                    "Input {input_hex} does not belong to the sender"
                )));
            }

            // Double-spend against the chain or against this block
            if self.is_spent(&input_hex) {
                return Err(BlockchainError::Transaction(format!(
                    "Input {input_hex} is already spent"
                )));
            }
            if staged
                .iter()
                .any(|other| other.get_inputs().iter().any(|spent| spent == input))
            {
                return Err(BlockchainError::Transaction(format!(
                    "Input {input_hex} is already spent in this block"
                )));
            }

            total = total.checked_add(previous.get_amount()).ok_or_else(|| {
                BlockchainError::Transaction("Input amounts overflow".to_string())
            })?;
        }

        if total != tx.get_amount() {
            return Err(BlockchainError::Transaction(format!(
                "Inputs total {total} but transfer amount is {}",
                tx.get_amount()
            )));
        }
        Ok(())
    }
}
