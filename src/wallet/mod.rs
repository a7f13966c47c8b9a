//! Key management
//!
//! The miner identity: signing key, public key and reward owner.

pub mod identity;

pub use identity::{decode_hex, MinerIdentity};
