use crate::error::{BlockchainError, Result};
use std::fmt;
use std::str::FromStr;
use std::sync::RwLock;

/// A known peer endpoint. Two peers are the same peer when address and
/// port both match.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Peer {
    address: String,
    port: u16,
}

impl Peer {
    pub fn new(address: impl Into<String>, port: u16) -> Peer {
        Peer {
            address: address.into(),
            port,
        }
    }

    pub fn get_address(&self) -> &str {
        self.address.as_str()
    }

    pub fn get_port(&self) -> u16 {
        self.port
    }
}

impl fmt::Display for Peer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.address, self.port)
    }
}

impl FromStr for Peer {
    type Err = BlockchainError;

    fn from_str(s: &str) -> Result<Self> {
        let (address, port) = s
            .trim()
            .rsplit_once(':')
            .ok_or_else(|| BlockchainError::Config(format!("Peer {s} is not host:port")))?;
        if address.is_empty() {
            return Err(BlockchainError::Config(format!("Peer {s} has no host")));
        }
        let port = port
            .parse::<u16>()
            .map_err(|e| BlockchainError::Config(format!("Peer {s} has a bad port: {e}")))?;
        Ok(Peer::new(address, port))
    }
}

/// Deduplicated set of peers the node pushes its chain to.
///
/// Peers are only ever added; nothing prunes them.
pub struct PeerRegistry {
    inner: RwLock<Vec<Peer>>,
}

impl Default for PeerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PeerRegistry {
    pub fn new() -> PeerRegistry {
        PeerRegistry {
            inner: RwLock::new(vec![]),
        }
    }

    /// Insert each peer not already known. Returns how many were new.
    pub fn add(&self, peers: &[Peer]) -> usize {
        match self.inner.write() {
            Ok(mut inner) => {
                let mut added = 0;
                for peer in peers {
                    if !inner.contains(peer) {
                        inner.push(peer.clone());
                        added += 1;
                    }
                }
                added
            }
            Err(_) => {
                log::error!("Failed to acquire write lock on peer registry");
                0
            }
        }
    }

    pub fn get_peers(&self) -> Vec<Peer> {
        match self.inner.read() {
            Ok(inner) => inner.to_vec(),
            Err(_) => {
                log::error!("Failed to acquire read lock on peer registry");
                Vec::new()
            }
        }
    }

    pub fn is_known(&self, peer: &Peer) -> bool {
        match self.inner.read() {
            Ok(inner) => inner.contains(peer),
            Err(_) => {
                log::error!("Failed to acquire read lock on peer registry");
                false
            }
        }
    }

    pub fn len(&self) -> usize {
        match self.inner.read() {
            Ok(inner) => inner.len(),
            Err(_) => {
                log::error!("Failed to acquire read lock on peer registry");
                0
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
