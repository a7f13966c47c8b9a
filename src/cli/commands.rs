use crate::config::Config;
use crate::network::Peer;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "relay-chain")]
pub struct Opt {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(name = "startnode", about = "Start a node: serve peers and mine")]
    StartNode(NodeArgs),
    #[command(name = "createkey", about = "Generate a miner key pair")]
    CreateKey,
    #[command(name = "send", about = "Sign a transfer and hand it to a node")]
    Send {
        #[arg(long, help = "Node to deliver the transaction to (host:port)")]
        node: Peer,
        #[arg(long, help = "Hex PKCS#8 key of the sender")]
        key: String,
        #[arg(long, help = "Hex public key of the recipient")]
        to: String,
        #[arg(long, help = "Amount to send; must equal the sum of the inputs")]
        amount: u64,
        #[arg(long = "input", required = true, help = "Hex id of a transaction paying the sender")]
        inputs: Vec<String>,
    },
}

/// Overrides for the node configuration; unset flags keep the loaded value
#[derive(Args, Debug, Default)]
pub struct NodeArgs {
    #[arg(long, help = "TOML configuration file")]
    pub config: Option<PathBuf>,
    #[arg(long, help = "Address to listen on")]
    pub host: Option<String>,
    #[arg(long, help = "Port to listen on")]
    pub port: Option<u16>,
    #[arg(long = "peer", help = "Peer to push mined chains to (host:port), repeatable")]
    pub peers: Vec<Peer>,
    #[arg(long, help = "Start with mining switched off")]
    pub no_mining: bool,
    #[arg(long, help = "Leading hex zeros required of a block hash")]
    pub difficulty: Option<usize>,
}

impl NodeArgs {
    /// Command-line flags take precedence over file and environment
    pub fn apply(&self, config: &mut Config) {
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        config
            .peers
            .extend(self.peers.iter().map(|peer| peer.to_string()));
        if self.no_mining {
            config.mining = false;
        }
        if let Some(difficulty) = self.difficulty {
            config.difficulty = difficulty;
        }
    }
}
