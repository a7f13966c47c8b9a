//! Configuration management
//!
//! Node settings come from built-in defaults, an optional TOML file,
//! environment variables and finally command-line flags.

pub mod settings;

pub use settings::Config;
