use crate::core::{Block, Transaction};
use crate::error::{BlockchainError, Result};
use crate::network::{Message, Package, Peer};
use crate::node::{Node, SyncOutcome};
use crate::utils::DECODE_LIMIT_BYTES;
use log::{error, info, warn};
use std::io::{Read, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Upper bound on one inbound package; a full chain travels in a single message
pub const MAX_PACKAGE_BYTES: u64 = DECODE_LIMIT_BYTES as u64;
const TCP_READ_TIMEOUT: Duration = Duration::from_secs(60);

/// Accepts inbound connections and hands each decoded package to the node
pub struct Server {
    node: Node,
}

impl Server {
    pub fn new(node: Node) -> Self {
        Server { node }
    }

    pub fn bind(addr: &str) -> Result<TcpListener> {
        TcpListener::bind(addr)
            .map_err(|e| BlockchainError::Network(format!("Failed to bind to {addr}: {e}")))
    }

    /// Bind and serve on the calling thread
    pub fn run(&self, addr: &str) -> Result<()> {
        let listener = Self::bind(addr)?;
        self.serve(listener)
    }

    /// One thread per connection; a failing connection never takes the
    /// listener down with it.
    pub fn serve(&self, listener: TcpListener) -> Result<()> {
        let local_addr = listener
            .local_addr()
            .map_err(|e| BlockchainError::Network(format!("Failed to read local address: {e}")))?;
        info!("Server listening on {local_addr}");

        for stream in listener.incoming() {
            if !self.node.is_running() {
                break;
            }
            match stream {
                Ok(stream) => {
                    let peer_addr = match stream.peer_addr() {
                        Ok(addr) => addr,
                        Err(e) => {
                            error!("Failed to get peer address: {e}");
                            continue;
                        }
                    };
                    let node = self.node.clone();
                    thread::spawn(move || {
                        if let Err(e) = Self::handle_connection(&node, stream, peer_addr) {
                            error!("Error handling connection from {peer_addr}: {e}");
                        }
                    });
                }
                Err(e) => {
                    error!("Error accepting connection: {e}");
                }
            }
        }
        info!("Server on {local_addr} stopped");
        Ok(())
    }

    /// Serve on a background thread
    pub fn spawn(self, listener: TcpListener) -> Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("server".to_string())
            .spawn(move || {
                if let Err(e) = self.serve(listener) {
                    error!("Server failed: {e}");
                }
            })
            .map_err(|e| BlockchainError::Network(format!("Failed to start server thread: {e}")))
    }

    /// Read the whole connection as one package, dispatch it, then close.
    /// Closing is the sender's acknowledgement.
    fn handle_connection(node: &Node, mut stream: TcpStream, peer_addr: SocketAddr) -> Result<()> {
        stream
            .set_read_timeout(Some(TCP_READ_TIMEOUT))
            .map_err(|e| BlockchainError::Network(format!("Failed to set read timeout: {e}")))?;

        let mut buffer = Vec::new();
        Read::by_ref(&mut stream)
            .take(MAX_PACKAGE_BYTES + 1)
            .read_to_end(&mut buffer)
            .map_err(|e| {
                BlockchainError::Network(format!("Failed to read from {peer_addr}: {e}"))
            })?;

        let result = if buffer.len() as u64 > MAX_PACKAGE_BYTES {
            Err(BlockchainError::Network(format!(
                "Package from {peer_addr} exceeds {MAX_PACKAGE_BYTES} bytes"
            )))
        } else {
            Package::from_bytes(&buffer).and_then(|pkg| {
                info!(
                    "Received {} byte package from {} ({peer_addr})",
                    buffer.len(),
                    pkg.get_addr_from()
                );
                Self::process_message(node, Message::try_from(pkg)?)
            })
        };

        let _ = stream.shutdown(Shutdown::Both);
        result
    }

    fn process_message(node: &Node, message: Message) -> Result<()> {
        match message {
            // Rewards are only ever minted by the local miner
            Message::Transaction(tx) if tx.is_coinbase() => Err(BlockchainError::Transaction(
                format!("Refusing coinbase transaction {} from a peer", tx.get_id_hex()),
            )),
            Message::Transaction(tx) => {
                node.add_transaction(tx);
                Ok(())
            }
            Message::Chain(blocks) => {
                match node.receive_chain(blocks)? {
                    SyncOutcome::Adopted { length } => {
                        info!("Now mining on adopted chain, height {}", length - 1)
                    }
                    SyncOutcome::NotLonger { .. } | SyncOutcome::Invalid(_) => {}
                }
                Ok(())
            }
        }
    }
}

/// Push the full chain to every peer and wait until each export has
/// finished. Returns how many peers acknowledged; failures are logged and
/// otherwise treated like completions.
pub fn broadcast_chain(
    addr_from: &str,
    peers: &[Peer],
    blocks: &[Block],
    timeout: Option<Duration>,
) -> usize {
    if peers.is_empty() {
        return 0;
    }
    let bytes = match Package::chain(addr_from, blocks).and_then(|pkg| pkg.to_bytes()) {
        Ok(bytes) => bytes,
        Err(e) => {
            error!("Failed to encode chain for broadcast: {e}");
            return 0;
        }
    };
    info!(
        "Broadcasting chain of length {} to {} peer(s)",
        blocks.len(),
        peers.len()
    );

    thread::scope(|scope| {
        let exports: Vec<_> = peers
            .iter()
            .map(|peer| {
                let bytes = bytes.as_slice();
                scope.spawn(move || match export(peer, bytes, timeout) {
                    Ok(()) => true,
                    Err(e) => {
                        warn!("Failed to export chain to {peer}: {e}");
                        false
                    }
                })
            })
            .collect();

        exports
            .into_iter()
            .map(|export| export.join())
            .filter(|delivered| matches!(delivered, Ok(true)))
            .count()
    })
}

/// Hand one transaction to a node
pub fn send_transaction(
    addr_from: &str,
    peer: &Peer,
    tx: &Transaction,
    timeout: Option<Duration>,
) -> Result<()> {
    let bytes = Package::transaction(addr_from, tx)?.to_bytes()?;
    info!("Sending transaction {} to {peer}", tx.get_id_hex());
    export(peer, &bytes, timeout)
}

fn connect(peer: &Peer, timeout: Option<Duration>) -> Result<TcpStream> {
    let addrs = (peer.get_address(), peer.get_port())
        .to_socket_addrs()
        .map_err(|e| BlockchainError::Network(format!("Failed to resolve {peer}: {e}")))?;

    let mut last_error = None;
    for addr in addrs {
        let attempt = match timeout {
            Some(timeout) => TcpStream::connect_timeout(&addr, timeout),
            None => TcpStream::connect(addr),
        };
        match attempt {
            Ok(stream) => {
                stream.set_write_timeout(timeout).map_err(|e| {
                    BlockchainError::Network(format!("Failed to set write timeout: {e}"))
                })?;
                stream.set_read_timeout(timeout).map_err(|e| {
                    BlockchainError::Network(format!("Failed to set read timeout: {e}"))
                })?;
                return Ok(stream);
            }
            Err(e) => last_error = Some(e),
        }
    }

    Err(BlockchainError::Network(match last_error {
        Some(e) => format!("Failed to connect to {peer}: {e}"),
        None => format!("No address found for {peer}"),
    }))
}

/// Write one package, half-close, then wait for the peer to close
fn export(peer: &Peer, bytes: &[u8], timeout: Option<Duration>) -> Result<()> {
    let mut stream = connect(peer, timeout)?;

    stream
        .write_all(bytes)
        .and_then(|()| stream.flush())
        .map_err(|e| BlockchainError::Network(format!("Failed to send data to {peer}: {e}")))?;
    stream
        .shutdown(Shutdown::Write)
        .map_err(|e| BlockchainError::Network(format!("Failed to finish send to {peer}: {e}")))?;

    let mut ack = Vec::new();
    stream
        .read_to_end(&mut ack)
        .map_err(|e| BlockchainError::Network(format!("No acknowledgement from {peer}: {e}")))?;
    Ok(())
}
