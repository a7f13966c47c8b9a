// Transactions move value between public keys.
// A transfer spends whole committed transactions (its inputs) that were paid to the sender;
// a new-coin transaction has no inputs and mints the block reward for the miner's owner.

use crate::core::MINING_REWARD;
use crate::error::{BlockchainError, Result};
use crate::utils::{
    current_timestamp, ecdsa_p256_sha256_sign_digest, ecdsa_p256_sha256_sign_verify,
    public_key_from_pkcs8, serialize, sha256_digest,
};
use crate::wallet::MinerIdentity;
use data_encoding::HEXLOWER;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode,
)]
pub enum TxKind {
    /// Ordinary transfer, spends committed inputs
    Transfer,
    /// Coinbase: reward minted by a miner, no inputs
    NewCoin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct Transaction {
    id: Vec<u8>,           // SHA-256 of the unsigned body
    kind: TxKind,
    inputs: Vec<Vec<u8>>,  // ids of committed transactions being spent
    sender: Vec<u8>,       // public key of the signer
    recipient: Vec<u8>,    // public key being credited
    amount: u64,
    timestamp: i64,
    salt: Vec<u8>,         // random bytes so identical bodies still get distinct ids
    signature: Vec<u8>,
}

impl Transaction {
    /// Build and sign a transfer of `amount` to `recipient`, spending `inputs`
    pub fn new_transfer(
        pkcs8: &[u8],
        recipient: &[u8],
        amount: u64,
        inputs: &[Vec<u8>],
    ) -> Result<Transaction> {
        if amount == 0 {
            return Err(BlockchainError::Transaction(
                "Amount must be positive".to_string(),
            ));
        }
        if inputs.is_empty() {
            return Err(BlockchainError::Transaction(
                "Transfer must spend at least one input".to_string(),
            ));
        }

        let mut tx = Transaction {
            id: vec![],
            kind: TxKind::Transfer,
            inputs: inputs.to_vec(),
            sender: public_key_from_pkcs8(pkcs8)?,
            recipient: recipient.to_vec(),
            amount,
            timestamp: current_timestamp()?,
            salt: Uuid::new_v4().as_bytes().to_vec(),
            signature: vec![],
        };
        tx.id = tx.hash()?;
        tx.signature = ecdsa_p256_sha256_sign_digest(pkcs8, &tx.id)?;
        Ok(tx)
    }

    /// The block reward, credited to the identity's owner and signed by the miner
    pub fn new_coinbase(identity: &MinerIdentity) -> Result<Transaction> {
        let mut tx = Transaction {
            id: vec![],
            kind: TxKind::NewCoin,
            inputs: vec![],
            sender: identity.get_public_key().to_vec(),
            recipient: identity.get_owner_public_key().to_vec(),
            amount: MINING_REWARD,
            timestamp: current_timestamp()?,
            salt: Uuid::new_v4().as_bytes().to_vec(),
            signature: vec![],
        };
        tx.id = tx.hash()?;
        tx.signature = identity.sign(&tx.id)?;
        Ok(tx)
    }

    fn trimmed_copy(&self) -> Transaction {
        Transaction {
            id: vec![],
            signature: vec![],
            ..self.clone()
        }
    }

    fn hash(&self) -> Result<Vec<u8>> {
        let body = serialize(&self.trimmed_copy())?;
        Ok(sha256_digest(&body))
    }

    /// True when the id matches the body and the sender signed it
    pub fn verify_signature(&self) -> bool {
        match self.hash() {
            Ok(hash) if hash == self.id => {
                ecdsa_p256_sha256_sign_verify(&self.sender, &self.signature, &self.id)
            }
            _ => false,
        }
    }

    pub fn get_id(&self) -> &[u8] {
        self.id.as_slice()
    }

    pub fn get_id_hex(&self) -> String {
        HEXLOWER.encode(&self.id)
    }

    pub fn get_kind(&self) -> TxKind {
        self.kind
    }

    pub fn is_coinbase(&self) -> bool {
        self.kind == TxKind::NewCoin
    }

    pub fn get_inputs(&self) -> &[Vec<u8>] {
        self.inputs.as_slice()
    }

    pub fn get_sender(&self) -> &[u8] {
        self.sender.as_slice()
    }

    pub fn get_recipient(&self) -> &[u8] {
        self.recipient.as_slice()
    }

    pub fn get_amount(&self) -> u64 {
        self.amount
    }

    pub fn get_timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn get_signature(&self) -> &[u8] {
        self.signature.as_slice()
    }

    /// Build an unsigned transaction with arbitrary fields (for testing only)
    #[cfg(test)]
    pub fn new_unchecked(
        kind: TxKind,
        inputs: Vec<Vec<u8>>,
        sender: Vec<u8>,
        recipient: Vec<u8>,
        amount: u64,
    ) -> Transaction {
        let mut tx = Transaction {
            id: vec![],
            kind,
            inputs,
            sender,
            recipient,
            amount,
            timestamp: 0,
            salt: Uuid::new_v4().as_bytes().to_vec(),
            signature: vec![],
        };
        tx.id = tx.hash().expect("hashing a transaction body");
        tx
    }

    #[cfg(test)]
    pub fn with_amount(mut self, amount: u64) -> Transaction {
        self.amount = amount;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::new_key_pair;

    #[test]
    fn test_coinbase_credits_owner() {
        let owner = MinerIdentity::generate(None).unwrap();
        let miner = MinerIdentity::generate(Some(owner.get_public_key().to_vec())).unwrap();

        let tx = Transaction::new_coinbase(&miner).unwrap();

        assert!(tx.is_coinbase());
        assert!(tx.get_inputs().is_empty());
        assert_eq!(tx.get_amount(), MINING_REWARD);
        assert_eq!(tx.get_recipient(), owner.get_public_key());
        assert_eq!(tx.get_sender(), miner.get_public_key());
        assert!(tx.verify_signature());
    }

    #[test]
    fn test_coinbases_have_distinct_ids() {
        let miner = MinerIdentity::generate(None).unwrap();
        let first = Transaction::new_coinbase(&miner).unwrap();
        let second = Transaction::new_coinbase(&miner).unwrap();
        assert_ne!(first.get_id(), second.get_id());
    }

    #[test]
    fn test_transfer_is_signed_by_sender() {
        let pkcs8 = new_key_pair().unwrap();
        let recipient = MinerIdentity::generate(None).unwrap();

        let tx = Transaction::new_transfer(
            &pkcs8,
            recipient.get_public_key(),
            MINING_REWARD,
            &[vec![1; 32]],
        )
        .unwrap();

        assert_eq!(tx.get_kind(), TxKind::Transfer);
        assert_eq!(tx.get_sender(), public_key_from_pkcs8(&pkcs8).unwrap());
        assert!(tx.verify_signature());
    }

    #[test]
    fn test_tampered_amount_fails_verification() {
        let pkcs8 = new_key_pair().unwrap();
        let tx = Transaction::new_transfer(&pkcs8, &[7; 65], 10, &[vec![1; 32]]).unwrap();

        let tampered = tx.with_amount(1_000);
        assert!(!tampered.verify_signature());
    }

    #[test]
    fn test_transfer_argument_checks() {
        let pkcs8 = new_key_pair().unwrap();
        assert!(Transaction::new_transfer(&pkcs8, &[7; 65], 0, &[vec![1; 32]]).is_err());
        assert!(Transaction::new_transfer(&pkcs8, &[7; 65], 5, &[]).is_err());
    }

    #[test]
    fn test_unsigned_transaction_fails_verification() {
        let tx = Transaction::new_unchecked(TxKind::NewCoin, vec![], vec![1], vec![2], 50);
        assert!(!tx.verify_signature());
    }
}
