//! Fullnode REST client.

use super::{Ledger, LedgerError, TransactionHash, TransactionStatus, ViewRequest};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Upper bound on a single HTTP round trip to the fullnode.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Body fragments the fullnode uses when a view reads a missing resource.
const NOT_FOUND_MARKERS: &[&str] = &[
    "missing_data",
    "resource_not_found",
    "resource_does_not_exist",
    "egame_not_found",
    "\"vm_error_code\":4008",
];

/// Ledger backed by an Aptos fullnode's REST API.
#[derive(Debug, Clone)]
pub struct AptosRestLedger {
    node_url: String,
    client: reqwest::Client,
}

impl AptosRestLedger {
    /// Creates a client against `node_url` (e.g. `https://fullnode.devnet.aptoslabs.com`).
    #[instrument(skip_all, fields(node_url = %node_url))]
    pub fn new(node_url: String) -> Result<Self, LedgerError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| LedgerError::Unreachable(format!("HTTP client: {}", e)))?;
        Ok(Self {
            node_url: node_url.trim_end_matches('/').to_string(),
            client,
        })
    }
}

/// Maps a failed view call to an error.
///
/// Missing resources come back as 404 or as a 400 whose body names the
/// missing data; server-side trouble is treated as unreachable.
pub fn classify_view_failure(status: u16, body: &str) -> LedgerError {
    let lowered = body.to_ascii_lowercase().replace(' ', "");
    if status == 404 || NOT_FOUND_MARKERS.iter().any(|m| lowered.contains(m)) {
        return LedgerError::NotFound(body.to_string());
    }
    if status >= 500 || status == 429 || status == 408 {
        return LedgerError::Unreachable(format!("HTTP {}: {}", status, body));
    }
    LedgerError::InvalidResponse(format!("HTTP {}: {}", status, body))
}

/// Reads a transaction as returned by `/v1/transactions/by_hash`.
pub fn parse_transaction_status(json: &Value) -> Result<TransactionStatus, LedgerError> {
    let kind = json["type"].as_str().ok_or_else(|| {
        LedgerError::InvalidResponse(format!("transaction without type: {}", json))
    })?;
    if kind == "pending_transaction" {
        return Ok(TransactionStatus::Pending);
    }

    let success = json["success"].as_bool().ok_or_else(|| {
        LedgerError::InvalidResponse(format!("committed transaction without success: {}", json))
    })?;
    let vm_status = json["vm_status"].as_str().unwrap_or_default().to_string();
    Ok(TransactionStatus::Committed { success, vm_status })
}

#[async_trait]
impl Ledger for AptosRestLedger {
    #[instrument(skip(self), fields(function = %request.function))]
    async fn view(&self, request: ViewRequest) -> Result<Vec<Value>, LedgerError> {
        let url = format!("{}/v1/view", self.node_url);
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| LedgerError::Unreachable(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| LedgerError::Unreachable(format!("Failed to read response: {}", e)))?;
        debug!(status = %status, body = %body, "View response");

        if !status.is_success() {
            let err = classify_view_failure(status.as_u16(), &body);
            warn!(error = %err, "View call failed");
            return Err(err);
        }

        serde_json::from_str(&body)
            .map_err(|e| LedgerError::InvalidResponse(format!("{}: {}", e, body)))
    }

    #[instrument(skip(self))]
    async fn transaction_status(
        &self,
        hash: &TransactionHash,
    ) -> Result<TransactionStatus, LedgerError> {
        let url = format!("{}/v1/transactions/by_hash/{}", self.node_url, hash);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| LedgerError::Unreachable(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            debug!("Transaction not indexed yet");
            return Ok(TransactionStatus::Pending);
        }
        if !status.is_success() {
            return Err(LedgerError::Unreachable(format!("HTTP {}", status)));
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| LedgerError::InvalidResponse(e.to_string()))?;
        parse_transaction_status(&json)
    }
}
