use crate::core::{verify_chain, Block};
use crate::error::Result;
use crate::node::Node;
use log::{info, warn};

/// What became of a chain received from a peer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The candidate replaced the local chain; `length` includes the new working block
    Adopted { length: usize },
    NotLonger { local: usize, candidate: usize },
    Invalid(String),
}

impl Node {
    /// Longest valid chain wins. Ties and shorter chains are rejected
    /// without looking at their contents, and a rejected candidate leaves
    /// the local chain untouched.
    ///
    /// On adoption the transactions staged in the abandoned tip go back to
    /// the pool together with the coinbase for the fresh working block.
    pub fn receive_chain(&self, candidate: Vec<Block>) -> Result<SyncOutcome> {
        info!("Received chain of length {}", candidate.len());

        let local = self.chain_len()?;
        if candidate.len() <= local {
            info!(
                "Rejected chain: length {} does not beat local length {local}",
                candidate.len()
            );
            return Ok(SyncOutcome::NotLonger {
                local,
                candidate: candidate.len(),
            });
        }

        let index = match verify_chain(&candidate, self.get_pow()) {
            Ok(index) => index,
            Err(e) => {
                warn!("Rejected chain: {e}");
                return Ok(SyncOutcome::Invalid(e.to_string()));
            }
        };

        let (requeue, length) = {
            let mut store = self.chain_write()?;
            // The miner may have pushed a block while we were verifying
            let local = store.len();
            if candidate.len() <= local {
                info!(
                    "Rejected chain: length {} does not beat local length {local}",
                    candidate.len()
                );
                return Ok(SyncOutcome::NotLonger {
                    local,
                    candidate: candidate.len(),
                });
            }

            let mut requeue = store
                .tip()
                .map(|tip| tip.get_transactions().to_vec())
                .unwrap_or_default();
            let adopted = candidate.len();
            store.replace(candidate, index);
            info!("Accepted chain of length {adopted}");

            requeue.push(self.push_new_block(&mut store)?);
            (requeue, store.len())
        };

        info!("Requeued {} transaction(s) after adopting chain", requeue.len());
        self.get_pool().extend(requeue);
        Ok(SyncOutcome::Adopted { length })
    }
}
