use crate::core::{DEFAULT_DIFFICULTY, MAX_DIFFICULTY};
use crate::error::{BlockchainError, Result};
use crate::network::Peer;
use serde::Deserialize;
use std::env;
use std::path::Path;
use std::time::Duration;

static DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 2001;
const DEFAULT_PEER_TIMEOUT_MS: u64 = 5000;
const DEFAULT_IDLE_INTERVAL_MS: u64 = 500;

const NODE_HOST_KEY: &str = "NODE_HOST";
const NODE_PORT_KEY: &str = "NODE_PORT";
const NODE_PEERS_KEY: &str = "NODE_PEERS";
const NODE_MINING_KEY: &str = "NODE_MINING";
const NODE_DIFFICULTY_KEY: &str = "NODE_DIFFICULTY";
const MINER_KEY_KEY: &str = "MINER_KEY";
const OWNER_PUBLIC_KEY_KEY: &str = "OWNER_PUBLIC_KEY";

/// Bootstrap settings for a node
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Initial peers as `host:port`
    pub peers: Vec<String>,
    /// Whether the node starts out mining. Transactions cannot be staged
    /// into the genesis block, so a node that never mines and never adopts
    /// a peer's chain holds every received transaction in its pool.
    pub mining: bool,
    /// Leading hex zeros required of a solved block hash
    pub difficulty: usize,
    /// Hex PKCS#8 miner key; a fresh key is generated when absent
    pub miner_key: Option<String>,
    /// Hex public key credited by coinbase transactions; the miner's own key when absent
    pub owner_public_key: Option<String>,
    /// Connect, write and acknowledgement timeout for peer exports, 0 waits forever
    pub peer_timeout_ms: u64,
    /// Pause between cycles while mining is switched off
    pub idle_interval_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: String::from(DEFAULT_HOST),
            port: DEFAULT_PORT,
            peers: vec![],
            mining: true,
            difficulty: DEFAULT_DIFFICULTY,
            miner_key: None,
            owner_public_key: None,
            peer_timeout_ms: DEFAULT_PEER_TIMEOUT_MS,
            idle_interval_ms: DEFAULT_IDLE_INTERVAL_MS,
        }
    }
}

impl Config {
    /// Defaults, then the optional TOML file, then environment variables
    pub fn load(path: Option<&Path>) -> Result<Config> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Config::default(),
        };
        config.apply_env()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Config> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            BlockchainError::Config(format!("Failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Config> {
        Ok(toml::from_str(text)?)
    }

    fn apply_env(&mut self) -> Result<()> {
        self.apply_vars(|key| env::var(key).ok())
    }

    fn apply_vars<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup(NODE_HOST_KEY) {
            self.host = host;
        }
        if let Some(port) = lookup(NODE_PORT_KEY) {
            self.port = port.trim().parse().map_err(|e| {
                BlockchainError::Config(format!("{NODE_PORT_KEY}={port} is not a port: {e}"))
            })?;
        }
        if let Some(peers) = lookup(NODE_PEERS_KEY) {
            self.peers = peers
                .split(',')
                .map(str::trim)
                .filter(|peer| !peer.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(mining) = lookup(NODE_MINING_KEY) {
            self.mining = parse_flag(&mining).ok_or_else(|| {
                BlockchainError::Config(format!("{NODE_MINING_KEY}={mining} is not a flag"))
            })?;
        }
        if let Some(difficulty) = lookup(NODE_DIFFICULTY_KEY) {
            self.difficulty = difficulty.trim().parse().map_err(|e| {
                BlockchainError::Config(format!(
                    "{NODE_DIFFICULTY_KEY}={difficulty} is not a number: {e}"
                ))
            })?;
        }
        if let Some(key) = lookup(MINER_KEY_KEY) {
            self.miner_key = Some(key);
        }
        if let Some(owner) = lookup(OWNER_PUBLIC_KEY_KEY) {
            self.owner_public_key = Some(owner);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.difficulty == 0 || self.difficulty > MAX_DIFFICULTY {
            return Err(BlockchainError::Config(format!(
                "difficulty must be between 1 and {MAX_DIFFICULTY}, got {}",
                self.difficulty
            )));
        }
        if self.host.trim().is_empty() {
            return Err(BlockchainError::Config("host must not be empty".to_string()));
        }
        self.parse_peers()?;
        Ok(())
    }

    pub fn parse_peers(&self) -> Result<Vec<Peer>> {
        self.peers.iter().map(|peer| peer.parse()).collect()
    }

    pub fn get_node_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// `None` means peer exports may block forever
    pub fn peer_timeout(&self) -> Option<Duration> {
        match self.peer_timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }

    pub fn idle_interval(&self) -> Duration {
        Duration::from_millis(self.idle_interval_ms)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
