//! TOML configuration parsing and validation.
//!
//! ```toml
//! [db]
//! path = "./data/crustula.sqlite"
//!
//! [server]
//! bind = "127.0.0.1:8000"
//!
//! [selection]
//! max_strikes = 2
//!
//! [domains]
//! recent_calls = 10
//! ```
//!
//! `[selection]` and `[domains]` are optional.

use anyhow::{Context, Result};
use crustula_core::selector::{SelectionPolicy, DEFAULT_MAX_STRIKES};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    pub server: ServerConfig,
    #[serde(default)]
    pub selection: SelectionConfig,
    #[serde(default)]
    pub domains: DomainsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SelectionConfig {
    /// Failures tolerated on a jar whose last call failed.
    #[serde(default = "default_max_strikes")]
    pub max_strikes: u32,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            max_strikes: DEFAULT_MAX_STRIKES,
        }
    }
}

fn default_max_strikes() -> u32 {
    DEFAULT_MAX_STRIKES
}

#[derive(Debug, Deserialize, Clone)]
pub struct DomainsConfig {
    #[serde(default = "default_recent_calls")]
    pub recent_calls: usize,
}

impl Default for DomainsConfig {
    fn default() -> Self {
        Self {
            recent_calls: default_recent_calls(),
        }
    }
}

fn default_recent_calls() -> usize {
    10
}

impl Config {
    /// Built-in defaults, without reading a config file.
    pub fn minimal() -> Self {
        Self {
            db: DbConfig {
                path: PathBuf::from("./data/crustula.sqlite"),
            },
            server: ServerConfig {
                bind: "127.0.0.1:8000".to_string(),
            },
            selection: SelectionConfig::default(),
            domains: DomainsConfig::default(),
        }
    }

    pub fn selection_policy(&self) -> SelectionPolicy {
        SelectionPolicy {
            max_strikes: self.selection.max_strikes,
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.server.bind.trim().is_empty() {
        anyhow::bail!("server.bind must not be empty");
    }

    if config.domains.recent_calls == 0 {
        anyhow::bail!("domains.recent_calls must be >= 1");
    }

    Ok(config)
}
