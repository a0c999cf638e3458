//! CSV sync relay.
//! One HTTP endpoint: takes a base64 CSV, looks up the file's sha and writes it
//! back through the Contents API (create when no sha, replace otherwise).
//!
//! No locking: two concurrent writers race on the same sha and the loser is
//! either rejected by GitHub or overwrites the winner.

use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    Json, Router,
};
use base64::engine::{general_purpose, DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::{alphabet, Engine as _};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::Config;
use crate::github::{ContentsApi, FileUpdate};

pub struct RelayState {
    pub api: Arc<dyn ContentsApi>,
    pub config: Config,
}

#[derive(Deserialize)]
struct RelayRequest {
    #[serde(rename = "csvContent")]
    csv_content: Option<String>,
    #[serde(rename = "fileName")]
    file_name: Option<String>,
}

#[derive(Debug)]
pub enum RelayError {
    MethodNotAllowed,
    MissingContent,
    BadEncoding,
    WriteFailed(Value),
    Internal(String),
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        match self {
            RelayError::MethodNotAllowed => {
                (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed").into_response()
            }
            RelayError::MissingContent => {
                (StatusCode::BAD_REQUEST, "CSV content is required").into_response()
            }
            RelayError::BadEncoding => {
                (StatusCode::BAD_REQUEST, "CSV content is not valid base64").into_response()
            }
            RelayError::WriteFailed(details) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to update file", "details": details })),
            )
                .into_response(),
            RelayError::Internal(details) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Internal server error", "details": details })),
            )
                .into_response(),
        }
    }
}

/// Every path goes to the same handler; every response gets
/// `Access-Control-Allow-Origin: *`.
pub fn router(state: Arc<RelayState>) -> Router {
    Router::new()
        .fallback(handle)
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(state: Arc<RelayState>) -> Result<()> {
    let bind = state.config.bind.clone();
    let listener = TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind relay on {}", bind))?;
    info!(%bind, "relay listening");
    axum::serve(listener, router(state))
        .await
        .context("Relay server failed")
}

async fn handle(
    State(state): State<Arc<RelayState>>,
    method: Method,
    body: Bytes,
) -> Response {
    match method {
        Method::OPTIONS => preflight(),
        Method::POST => match update_csv(&state, &body).await {
            Ok(commit) => Json(json!({
                "success": true,
                "message": "CSV file updated successfully",
                "commit": commit,
            }))
            .into_response(),
            Err(e) => e.into_response(),
        },
        _ => RelayError::MethodNotAllowed.into_response(),
    }
}

fn preflight() -> Response {
    (
        StatusCode::OK,
        [
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            (header::ACCESS_CONTROL_ALLOW_METHODS, "POST, OPTIONS"),
            (header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type"),
        ],
    )
        .into_response()
}

/// Accepts what a browser's `atob` accepts: padding optional, stray trailing bits ignored.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Decode then re-encode: rejects payloads that are not base64 and normalizes
/// the encoding sent upstream. ASCII whitespace anywhere is dropped, so
/// line-wrapped input is fine. Bytes pass through as-is.
fn normalize_content(encoded: &str) -> Result<String, RelayError> {
    let compact: String = encoded
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    let bytes = LENIENT
        .decode(compact)
        .map_err(|_| RelayError::BadEncoding)?;
    Ok(general_purpose::STANDARD.encode(bytes))
}

async fn update_csv(state: &RelayState, body: &[u8]) -> Result<Value, RelayError> {
    let request: RelayRequest = serde_json::from_slice(body).map_err(|e| {
        error!(error = %e, "unreadable relay request");
        RelayError::Internal(e.to_string())
    })?;

    let encoded = request
        .csv_content
        .filter(|c| !c.is_empty())
        .ok_or(RelayError::MissingContent)?;
    let content = normalize_content(&encoded)?;

    let file_name = request
        .file_name
        .unwrap_or_else(|| state.config.default_file_name.clone());
    let path = state.config.contents_path(&file_name);

    let sha = match state.api.file_sha(&path).await {
        Ok(sha) => Some(sha),
        Err(e) => {
            info!(%path, error = %e, "no current revision, creating file");
            None
        }
    };

    let update = FileUpdate {
        message: format!("Update {} - Add new benefit", file_name),
        content,
        sha,
    };

    match state.api.put_file(&path, &update).await {
        Ok(commit) => {
            info!(%path, created = update.sha.is_none(), "file written");
            Ok(commit)
        }
        Err(e) => {
            error!(%path, error = %e, "GitHub API error");
            Err(RelayError::WriteFailed(e.details))
        }
    }
}
