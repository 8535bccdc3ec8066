//! Configuration Management
//!
//! Handles persistent configuration storage for stratus: the account
//! roster, the provider endpoint, and the collection tuning knobs.

use crate::account::AccountDescriptor;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Accounts to inventory
    #[serde(default)]
    pub accounts: Vec<AccountDescriptor>,
    /// Provider API endpoint root
    #[serde(default)]
    pub endpoint: String,
    /// Per-service fetch timeout (provider APIs are the bottleneck, so the
    /// default is generous)
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    /// How many accounts refresh concurrently
    #[serde(default = "default_account_concurrency")]
    pub account_concurrency: usize,
    /// Upper bound on a whole refresh cycle; accounts still in flight at the
    /// deadline are reported failed for this cycle
    #[serde(default = "default_refresh_deadline_secs")]
    pub refresh_deadline_secs: u64,
    /// Optional JSON file mapping credential references to tokens
    #[serde(default)]
    pub credentials_path: Option<PathBuf>,
}

fn default_fetch_timeout_secs() -> u64 {
    30
}

fn default_account_concurrency() -> usize {
    4
}

fn default_refresh_deadline_secs() -> u64 {
    300
}

impl Default for Config {
    fn default() -> Self {
        Self {
            accounts: Vec::new(),
            endpoint: String::new(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            account_concurrency: default_account_concurrency(),
            refresh_deadline_secs: default_refresh_deadline_secs(),
            credentials_path: None,
        }
    }
}

impl Config {
    /// Get the config file path
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("stratus").join("config.json"))
    }

    /// Where the merged resource set is persisted between invocations
    pub fn state_path() -> PathBuf {
        if let Some(config_dir) = dirs::config_dir() {
            return config_dir.join("stratus").join("state.json");
        }
        if let Some(home) = dirs::home_dir() {
            return home.join(".stratus").join("state.json");
        }
        PathBuf::from("stratus-state.json")
    }

    /// Load configuration from disk, falling back to defaults on any problem
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_default(),
            Err(_) => Self::default(),
        }
    }

    /// Load configuration from an explicit path; unlike [`Config::load`]
    /// this fails loudly, since the user asked for that exact file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content)?;

        Ok(())
    }
}
