// src/store.rs

//! Coordination store access.
//!
//! The store is an external distributed key-value service holding centrally
//! managed job configs, keyed by identity. The bootstrap only ever reads
//! from it, and only once, on the startup path — so the client is a single
//! GET with a bounded timeout.

use crate::error::StoreError;
use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;

/// Read access to the coordination store.
///
/// Implementations must distinguish "key absent" (`Ok(None)`) from
/// "store unavailable" (`Err`): absence is a normal answer, unavailability
/// degrades the boot to local-only config.
#[async_trait]
pub trait CoordinationStore: Send + Sync {
    async fn fetch(&self, key: &str) -> Result<Option<String>, StoreError>;
}

/// HTTP-backed store client.
///
/// Maps a key to `GET {endpoint}{key}`. A 404 is absence; any other
/// non-success status, connect failure, or timeout is `Unreachable`.
pub struct HttpCoordinationStore {
    endpoint: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl HttpCoordinationStore {
    pub fn new(endpoint: &str, timeout: Duration) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            timeout,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl CoordinationStore for HttpCoordinationStore {
    async fn fetch(&self, key: &str) -> Result<Option<String>, StoreError> {
        let url = format!("{}{}", self.endpoint, key);

        let resp = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| StoreError::Unreachable(format!("GET {}: {}", url, e)))?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(StoreError::Unreachable(format!("GET {}: {}", url, status)));
        }

        let text = resp
            .text()
            .await
            .map_err(|e| StoreError::Malformed(format!("GET {}: {}", url, e)))?;

        Ok(Some(text))
    }
}
