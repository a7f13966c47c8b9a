//! Command-line interface
//!
//! Argument parsing for the node binary.

pub mod commands;

pub use commands::{Command, NodeArgs, Opt};
