//! Runtime configuration.
//!
//! The reference deployment fixed every parameter at compile time; here they
//! load from a TOML file at startup, with defaults matching that deployment.

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

/// Matrix dimensions and query count for one session.
///
/// Both compute parties, the dealer, the generator, and the checker must run
/// with identical values; nothing verifies this at runtime.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct Dimensions {
    /// Number of user rows.
    pub users: usize,
    /// Number of item rows.
    pub items: usize,
    /// Feature dimension.
    pub features: usize,
    /// Number of queries per session.
    pub queries: usize,
}

impl Default for Dimensions {
    fn default() -> Self {
        Self {
            users: 10,
            items: 50,
            features: 3,
            queries: 10,
        }
    }
}

/// Endpoints of the three parties.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Network {
    /// Dealer endpoint the compute parties dial.
    pub dealer_addr: String,
    /// Port the dealer listens on.
    pub dealer_port: u16,
    /// Peer endpoint P0 dials.
    pub peer_addr: String,
    /// Port P1 listens on for the peer link.
    pub peer_port: u16,
}

impl Default for Network {
    fn default() -> Self {
        Self {
            dealer_addr: "p2:9002".into(),
            dealer_port: 9002,
            peer_addr: "p1:9001".into(),
            peer_port: 9001,
        }
    }
}

/// Full runtime configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Matrix dimensions and query count.
    pub dimensions: Dimensions,
    /// Network endpoints.
    pub network: Network,
    /// Directory holding the share and query files.
    pub data_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dimensions: Dimensions::default(),
            network: Network::default(),
            data_dir: "data".into(),
        }
    }
}

/// Errors loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Unreadable configuration file.
    #[error("i/o: {0}")]
    Io(#[from] std::io::Error),
    /// Invalid TOML.
    #[error("parse: {0}")]
    Parse(#[from] toml::de::Error),
}

impl Config {
    /// Loads from a TOML file, or returns the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Ok(toml::from_str(&fs::read_to_string(path)?)?),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_reference_deployment() {
        let config = Config::default();
        assert_eq!(config.dimensions.users, 10);
        assert_eq!(config.dimensions.items, 50);
        assert_eq!(config.dimensions.features, 3);
        assert_eq!(config.network.dealer_port, 9002);
        assert_eq!(config.data_dir, PathBuf::from("data"));
    }

    #[test]
    fn partial_files_fall_back_to_defaults() {
        let config: Config = toml::from_str(
            r#"
            data_dir = "/tmp/run"

            [dimensions]
            items = 128
            "#,
        )
        .unwrap();
        assert_eq!(config.dimensions.items, 128);
        assert_eq!(config.dimensions.users, 10);
        assert_eq!(config.network.peer_port, 9001);
        assert_eq!(config.data_dir, PathBuf::from("/tmp/run"));
    }
}
