//! HTTP client for the ledger server

use crate::blockchain::Block;
use crate::error::{LedgerError, Result};
use crate::payload::SignaturePayload;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Fields a block record must carry to rebuild its canonical message.
const REQUIRED_BLOCK_FIELDS: [&str; 5] = ["index", "previous_hash", "file_hash", "user_id", "timestamp"];

pub struct LedgerClient {
    base_url: String,
    http: reqwest::Client,
}

impl LedgerClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/');
        if base_url.is_empty() {
            return Err(LedgerError::ConfigError("Server URL is empty".to_string()));
        }
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LedgerError::Network {
                url: base_url.to_string(),
                reason: format!("Cannot build HTTP client: {}", e),
            })?;

        Ok(Self {
            base_url: base_url.to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn block_url(&self, index: u64) -> String {
        format!("{}/block/{}", self.base_url, index)
    }

    pub fn sign_block_url(&self) -> String {
        format!("{}/sign_block", self.base_url)
    }

    /// GET `/block/{index}` and extract `data.block`.
    pub async fn fetch_block(&self, index: u64) -> Result<Block> {
        let url = self.block_url(index);
        debug!(%url, "Fetching block");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| network_error(&url, e))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| network_error(&url, e))?;

        if !status.is_success() {
            return Err(LedgerError::Network {
                reason: format!("HTTP {}: {}", status, server_message(&body)),
                url,
            });
        }

        parse_block_envelope(&url, &body)
    }

    /// POST the payload to `/sign_block`; returns the server's response envelope.
    pub async fn submit_signature(&self, payload: &SignaturePayload) -> Result<Value> {
        let url = self.sign_block_url();
        debug!(%url, block_index = payload.block_index, "Submitting signature");

        let response = self
            .http
            .post(&url)
            .json(payload)
            .send()
            .await
            .map_err(|e| network_error(&url, e))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| network_error(&url, e))?;

        if !status.is_success() {
            return Err(LedgerError::Network {
                reason: format!("HTTP {}: {}", status, server_message(&body)),
                url,
            });
        }

        serde_json::from_str(&body).map_err(|_| LedgerError::MalformedResponse {
            url,
            field: "body".to_string(),
        })
    }
}

fn network_error(url: &str, err: reqwest::Error) -> LedgerError {
    LedgerError::Network {
        url: url.to_string(),
        reason: err.to_string(),
    }
}

/// The `message` of an error envelope, or the raw body.
fn server_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_owned))
        .unwrap_or_else(|| body.trim().chars().take(200).collect())
}

fn malformed(url: &str, field: impl Into<String>) -> LedgerError {
    LedgerError::MalformedResponse {
        url: url.to_string(),
        field: field.into(),
    }
}

/// Extracts the block from a `{"data": {"block": {...}}}` envelope.
pub fn parse_block_envelope(url: &str, body: &str) -> Result<Block> {
    let envelope: Value = serde_json::from_str(body).map_err(|_| malformed(url, "body"))?;
    let data = envelope
        .get("data")
        .filter(|v| v.is_object())
        .ok_or_else(|| malformed(url, "data"))?;
    let block = data
        .get("block")
        .filter(|v| v.is_object())
        .ok_or_else(|| malformed(url, "data.block"))?;

    for field in REQUIRED_BLOCK_FIELDS {
        if block.get(field).map_or(true, Value::is_null) {
            return Err(malformed(url, format!("data.block.{}", field)));
        }
    }

    serde_json::from_value(block.clone())
        .map_err(|e| malformed(url, format!("data.block ({})", e)))
}
