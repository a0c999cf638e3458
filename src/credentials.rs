//! Dispatch token handling.
//! The token lives in a small JSON key/value file under `githubToken`. When it
//! is missing the user is asked once and the answer is cached; it is never
//! refreshed or invalidated afterwards.

use anyhow::{bail, Context, Result};
use dialoguer::Password;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use tracing::info;

pub const TOKEN_KEY: &str = "githubToken";
const TOKEN_PROMPT: &str = "Please enter your GitHub token (starts with github_pat_)";

pub trait CredentialProvider {
    fn token(&self) -> Result<String>;
}

/// Persistent string key/value storage backed by one JSON file.
pub struct LocalStore {
    path: PathBuf,
}

impl LocalStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn load(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse {}", self.path.display()))
    }

    pub fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.load()?.remove(key))
    }

    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.load()?;
        entries.insert(key.to_string(), value.to_string());
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&entries)?)
            .with_context(|| format!("Failed to write {}", self.path.display()))
    }
}

/// Where a missing token comes from.
pub trait TokenPrompt {
    fn ask(&self) -> Result<String>;
}

pub struct TerminalPrompt;

impl TokenPrompt for TerminalPrompt {
    fn ask(&self) -> Result<String> {
        Password::new()
            .with_prompt(TOKEN_PROMPT)
            .allow_empty_password(true)
            .interact()
            .context("Failed to read GitHub token")
    }
}

/// Cached token first, prompt second.
pub struct StoredToken<P> {
    store: LocalStore,
    prompt: P,
}

impl<P: TokenPrompt> StoredToken<P> {
    pub fn new(store: LocalStore, prompt: P) -> Self {
        Self { store, prompt }
    }
}

impl<P: TokenPrompt> CredentialProvider for StoredToken<P> {
    fn token(&self) -> Result<String> {
        if let Some(token) = self.store.get(TOKEN_KEY)?.filter(|t| !t.is_empty()) {
            return Ok(token);
        }
        let token = self.prompt.ask()?.trim().to_string();
        if token.is_empty() {
            bail!("GitHub token is required to update CSV files");
        }
        self.store.set(TOKEN_KEY, &token)?;
        info!(store = %self.store.path.display(), "cached GitHub token");
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct FakePrompt {
        answer: &'static str,
        asked: Cell<u32>,
    }

    impl FakePrompt {
        fn new(answer: &'static str) -> Self {
            Self {
                answer,
                asked: Cell::new(0),
            }
        }
    }

    impl TokenPrompt for &FakePrompt {
        fn ask(&self) -> Result<String> {
            self.asked.set(self.asked.get() + 1);
            Ok(self.answer.to_string())
        }
    }

    #[test]
    fn test_prompted_token_is_cached() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/storage.json");
        let prompt = FakePrompt::new("github_pat_123");

        let provider = StoredToken::new(LocalStore::new(&path), &prompt);
        assert_eq!(provider.token().unwrap(), "github_pat_123");
        assert_eq!(provider.token().unwrap(), "github_pat_123");
        assert_eq!(prompt.asked.get(), 1);

        assert_eq!(
            LocalStore::new(&path).get(TOKEN_KEY).unwrap().as_deref(),
            Some("github_pat_123")
        );
    }

    #[test]
    fn test_stored_token_skips_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path().join("storage.json"));
        store.set(TOKEN_KEY, "saved").unwrap();
        let prompt = FakePrompt::new("other");

        let provider = StoredToken::new(store, &prompt);
        assert_eq!(provider.token().unwrap(), "saved");
        assert_eq!(prompt.asked.get(), 0);
    }

    #[test]
    fn test_empty_answer_fails_and_caches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        let prompt = FakePrompt::new("  ");

        let err = StoredToken::new(LocalStore::new(&path), &prompt)
            .token()
            .unwrap_err();
        assert_eq!(err.to_string(), "GitHub token is required to update CSV files");
        assert!(!path.exists());
    }

    #[test]
    fn test_store_keeps_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path().join("storage.json"));
        store.set("theme", "dark").unwrap();
        store.set(TOKEN_KEY, "t").unwrap();
        assert_eq!(store.get("theme").unwrap().as_deref(), Some("dark"));
        assert_eq!(store.get("missing").unwrap(), None);
    }
}
