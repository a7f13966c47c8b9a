//! Peer-to-peer networking
//!
//! Nodes talk over plain TCP, one package per connection: the sender writes
//! the package, half-closes, and waits for the receiver to close once it has
//! dispatched the package.

pub mod package;
pub mod peer_registry;
pub mod server;

pub use package::{Message, Package};
pub use peer_registry::{Peer, PeerRegistry};
pub use server::{broadcast_chain, send_transaction, Server, MAX_PACKAGE_BYTES};
