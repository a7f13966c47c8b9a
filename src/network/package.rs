use crate::core::{Block, Transaction};
use crate::error::Result;
use crate::utils::{deserialize, serialize};
use serde::{Deserialize, Serialize};

/// One message per connection: the connection boundary is the message
/// boundary, there is no length prefix or delimiter.
#[derive(Debug, Serialize, Deserialize)]
pub enum Package {
    Transaction {
        addr_from: String,
        transaction: Vec<u8>,
    },
    Chain {
        addr_from: String,
        blocks: Vec<u8>,
    },
}

impl Package {
    pub fn transaction(addr_from: &str, tx: &Transaction) -> Result<Package> {
        Ok(Package::Transaction {
            addr_from: addr_from.to_string(),
            transaction: serialize(tx)?,
        })
    }

    pub fn chain(addr_from: &str, blocks: &[Block]) -> Result<Package> {
        Ok(Package::Chain {
            addr_from: addr_from.to_string(),
            blocks: serialize(&blocks.to_vec())?,
        })
    }

    pub fn get_addr_from(&self) -> &str {
        match self {
            Package::Transaction { addr_from, .. } | Package::Chain { addr_from, .. } => addr_from,
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Package> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// A decoded package, ready for dispatch
#[derive(Debug)]
pub enum Message {
    Transaction(Transaction),
    Chain(Vec<Block>),
}

impl TryFrom<Package> for Message {
    type Error = crate::error::BlockchainError;

    fn try_from(pkg: Package) -> Result<Message> {
        match pkg {
            Package::Transaction { transaction, .. } => {
                Ok(Message::Transaction(deserialize(&transaction)?))
            }
            Package::Chain { blocks, .. } => Ok(Message::Chain(deserialize(&blocks)?)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testnet::{mined_chain, test_identity};

    #[test]
    fn test_transaction_package() {
        let tx = Transaction::new_coinbase(&test_identity()).unwrap();
        let bytes = Package::transaction("127.0.0.1:2001", &tx)
            .unwrap()
            .to_bytes()
            .unwrap();

        let pkg = Package::from_bytes(&bytes).unwrap();
        assert_eq!(pkg.get_addr_from(), "127.0.0.1:2001");
        match Message::try_from(pkg).unwrap() {
            Message::Transaction(decoded) => assert_eq!(decoded, tx),
            other => panic!("unexpected message {other:?}"),
        }
    }

    #[test]
    fn test_chain_package() {
        let (blocks, _) = mined_chain(&test_identity(), 3, 1);
        let bytes = Package::chain("127.0.0.1:2001", &blocks)
            .unwrap()
            .to_bytes()
            .unwrap();

        match Message::try_from(Package::from_bytes(&bytes).unwrap()).unwrap() {
            Message::Chain(decoded) => assert_eq!(decoded, blocks),
            other => panic!("unexpected message {other:?}"),
        }
    }

    #[test]
    fn test_malformed_bytes() {
        assert!(Package::from_bytes(b"{\"Chain\":").is_err());
        assert!(Package::from_bytes(b"").is_err());
    }

    #[test]
    fn test_huge_declared_length_is_rejected() {
        // 11 bytes claiming a 1 TiB transaction id
        let mut transaction = vec![253];
        transaction.extend((1u64 << 40).to_le_bytes());
        let pkg = Package::Transaction {
            addr_from: "127.0.0.1:2001".to_string(),
            transaction,
        };

        assert!(Message::try_from(pkg).is_err());
    }

    #[test]
    fn test_malformed_payload() {
        let pkg = Package::Transaction {
            addr_from: "127.0.0.1:2001".to_string(),
            transaction: vec![0xFF, 0xFF, 0xFF],
        };
        assert!(Message::try_from(pkg).is_err());
    }
}
