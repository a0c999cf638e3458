//! GitHub REST client.
//! Contents API (read sha / write file) for the relay and repository dispatch
//! for the editor. Both sides talk to the remote through a trait so tests can
//! swap in fakes.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::config::Config;

const ACCEPT_V3: &str = "application/vnd.github.v3+json";

// *************** Request/Response Types ***************

/// Body of `PUT /repos/{owner}/{repo}/contents/{path}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FileUpdate {
    pub message: String,
    /// Base64 file content.
    pub content: String,
    /// Revision marker; absent means "create".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<String>,
}

#[derive(Deserialize)]
struct FileMeta {
    sha: String,
}

#[derive(Deserialize)]
struct PutResult {
    #[serde(default)]
    commit: Value,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DispatchEvent {
    pub event_type: String,
    pub client_payload: DispatchPayload,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DispatchPayload {
    #[serde(rename = "csvContent")]
    pub csv_content: String,
}

impl DispatchEvent {
    pub fn update_csv(csv_content: String) -> Self {
        Self {
            event_type: "update-csv".to_string(),
            client_payload: DispatchPayload { csv_content },
        }
    }
}

/// Failure reported by the remote, with whatever JSON body it sent.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteError {
    pub status: Option<u16>,
    pub details: Value,
}

impl RemoteError {
    fn transport(err: reqwest::Error) -> Self {
        Self {
            status: err.status().map(|s| s.as_u16()),
            details: Value::String(err.to_string()),
        }
    }

    async fn from_response(response: Response) -> Self {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let details = serde_json::from_str(&body).unwrap_or(Value::String(body));
        Self {
            status: Some(status),
            details,
        }
    }

    /// GitHub puts a human readable reason under `message`.
    pub fn message(&self) -> Option<&str> {
        self.details.get("message").and_then(Value::as_str)
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.status, self.message()) {
            (Some(status), Some(msg)) => write!(f, "GitHub API error {}: {}", status, msg),
            (Some(status), None) => write!(f, "GitHub API error {}: {}", status, self.details),
            (None, _) => write!(f, "GitHub API request failed: {}", self.details),
        }
    }
}

impl std::error::Error for RemoteError {}

// *************** Seams ***************

#[async_trait]
pub trait ContentsApi: Send + Sync + 'static {
    /// Current revision marker of `path`.
    async fn file_sha(&self, path: &str) -> Result<String, RemoteError>;

    /// Creates or replaces `path`; returns the commit object.
    async fn put_file(&self, path: &str, update: &FileUpdate) -> Result<Value, RemoteError>;
}

#[async_trait]
pub trait Dispatcher: Send + Sync {
    async fn dispatch(&self, token: &str, event: &DispatchEvent) -> Result<(), RemoteError>;
}

// *************** reqwest implementation ***************

pub struct GitHubClient {
    client: Client,
    config: Config,
    /// Server-side token; only the relay needs one.
    token: Option<String>,
}

impl GitHubClient {
    pub fn new(config: Config, token: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            client,
            config,
            token,
        })
    }

    fn contents_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.config.api_base, self.config.owner, self.config.repo, path
        )
    }

    fn authorized(&self, req: reqwest::RequestBuilder, token: Option<&str>) -> reqwest::RequestBuilder {
        let req = req.header(ACCEPT, ACCEPT_V3);
        match token {
            Some(t) => req.header(AUTHORIZATION, format!("token {}", t)),
            None => req,
        }
    }
}

#[async_trait]
impl ContentsApi for GitHubClient {
    async fn file_sha(&self, path: &str) -> Result<String, RemoteError> {
        let req = self.authorized(self.client.get(self.contents_url(path)), self.token.as_deref());
        let response = req.send().await.map_err(RemoteError::transport)?;
        if !response.status().is_success() {
            return Err(RemoteError::from_response(response).await);
        }
        let meta: FileMeta = response.json().await.map_err(RemoteError::transport)?;
        Ok(meta.sha)
    }

    async fn put_file(&self, path: &str, update: &FileUpdate) -> Result<Value, RemoteError> {
        let req = self.authorized(self.client.put(self.contents_url(path)), self.token.as_deref());
        let response = req.json(update).send().await.map_err(RemoteError::transport)?;
        if !response.status().is_success() {
            return Err(RemoteError::from_response(response).await);
        }
        let result: PutResult = response.json().await.map_err(RemoteError::transport)?;
        Ok(result.commit)
    }
}

#[async_trait]
impl Dispatcher for GitHubClient {
    async fn dispatch(&self, token: &str, event: &DispatchEvent) -> Result<(), RemoteError> {
        let req = self.authorized(self.client.post(self.config.dispatch_url()), Some(token));
        let response = req.json(event).send().await.map_err(RemoteError::transport)?;
        if !response.status().is_success() {
            return Err(RemoteError::from_response(response).await);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_file_update_omits_missing_sha() {
        let create = FileUpdate {
            message: "m".to_string(),
            content: "YQ==".to_string(),
            sha: None,
        };
        assert_eq!(
            serde_json::to_value(&create).unwrap(),
            json!({"message": "m", "content": "YQ=="})
        );

        let replace = FileUpdate {
            sha: Some("abc".to_string()),
            ..create
        };
        assert_eq!(serde_json::to_value(&replace).unwrap()["sha"], "abc");
    }

    #[test]
    fn test_dispatch_event_shape() {
        let event = DispatchEvent::update_csv("a,b\n".to_string());
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({"event_type": "update-csv", "client_payload": {"csvContent": "a,b\n"}})
        );
    }

    #[test]
    fn test_remote_error_display() {
        let err = RemoteError {
            status: Some(409),
            details: json!({"message": "sha does not match"}),
        };
        assert_eq!(err.to_string(), "GitHub API error 409: sha does not match");
        assert_eq!(err.message(), Some("sha does not match"));
    }

    #[test]
    fn test_contents_url_uses_config() {
        let client = GitHubClient::new(Config::default(), None).unwrap();
        assert_eq!(
            client.contents_url("promo/x.csv"),
            "https://api.github.com/repos/kayacheva-a/tabby-plus-promo/contents/promo/x.csv"
        );
    }
}
