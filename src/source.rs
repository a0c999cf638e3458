//! Loads data files from disk or over HTTP(S).

use anyhow::{Context, Result};
use reqwest::Client;
use std::fs;
use tracing::info;

pub fn is_remote(src: &str) -> bool {
    src.starts_with("http://") || src.starts_with("https://")
}

pub async fn load_text(client: &Client, src: &str) -> Result<String> {
    let text = if is_remote(src) {
        client
            .get(src)
            .send()
            .await
            .with_context(|| format!("Failed to fetch {}", src))?
            .error_for_status()
            .with_context(|| format!("Failed to fetch {}", src))?
            .text()
            .await
            .with_context(|| format!("Failed to read body of {}", src))?
    } else {
        fs::read_to_string(src).with_context(|| format!("Failed to read {}", src))?
    };
    info!(%src, length = text.len(), "loaded");
    Ok(text)
}
