//! Shared fixtures for unit tests
//!
//! Identities, low-difficulty configs, signed transfers and pre-mined
//! chains, so that node behaviour can be tested without a network.

pub mod test_utils;

pub use test_utils::*;
