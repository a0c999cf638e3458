//! Config module.
//! Manages I/O for promo-sync.json (relay bind address, GitHub target, token store).
//! Uses serde for JSON serialization; every field has a default so a partial
//! or missing file still yields a usable config.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "promo-sync.json";

/// Server-side token used by the relay for the Contents API.
pub const RELAY_TOKEN_ENV: &str = "GITHUB_TOKEN";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub bind: String,
    pub api_base: String,
    pub owner: String,
    pub repo: String,
    /// Directory inside the repo that holds the CSV files.
    pub path_prefix: String,
    pub default_file_name: String,
    /// Local key/value file where the dispatch token is cached.
    pub token_store: PathBuf,
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8787".to_string(),
            api_base: "https://api.github.com".to_string(),
            owner: "kayacheva-a".to_string(),
            repo: "tabby-plus-promo".to_string(),
            path_prefix: "promo".to_string(),
            default_file_name: "benefits-library.csv".to_string(),
            token_store: PathBuf::from(".promo-sync/storage.json"),
            user_agent: concat!("promo-sync/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl Config {
    /// Repo-relative path of a CSV file, e.g. `promo/benefits-library.csv`.
    pub fn contents_path(&self, file_name: &str) -> String {
        if self.path_prefix.is_empty() {
            file_name.to_string()
        } else {
            format!("{}/{}", self.path_prefix.trim_end_matches('/'), file_name)
        }
    }

    pub fn dispatch_url(&self) -> String {
        format!("{}/repos/{}/{}/dispatches", self.api_base, self.owner, self.repo)
    }
}

/// Loads config from `path`. A missing file yields the defaults.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse config: {}", path.display()))
}
