//! Signer backed by an external wallet bridge.
//!
//! The bridge owns the keys and the approval prompt. We hand it an entry
//! function payload and get back a transaction hash, or a refusal.

use super::{EntryFunctionPayload, LedgerError, Signer, TransactionHash};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// How long the user gets to approve a signature in the wallet.
const APPROVAL_TIMEOUT: Duration = Duration::from_secs(120);

/// Error codes the bridge uses when the user declines.
const DECLINED_CODES: &[&str] = &["rejected", "user_rejected", "declined"];

#[derive(Debug, Deserialize)]
struct AccountResponse {
    address: String,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    hash: Option<String>,
    error: Option<String>,
}

/// Signer that delegates to a wallet bridge over HTTP.
#[derive(Debug, Clone)]
pub struct WalletBridgeSigner {
    wallet_url: String,
    address: String,
    client: reqwest::Client,
}

impl WalletBridgeSigner {
    /// Connects to the bridge and asks which account it signs for.
    #[instrument(skip_all, fields(wallet_url = %wallet_url))]
    pub async fn connect(wallet_url: String) -> Result<Self, LedgerError> {
        let client = reqwest::Client::builder()
            .timeout(APPROVAL_TIMEOUT)
            .build()
            .map_err(|e| LedgerError::Unreachable(format!("HTTP client: {}", e)))?;
        let wallet_url = wallet_url.trim_end_matches('/').to_string();

        let response = client
            .get(format!("{}/account", wallet_url))
            .send()
            .await
            .map_err(|e| LedgerError::Unreachable(e.to_string()))?;
        if !response.status().is_success() {
            return Err(LedgerError::Unreachable(format!(
                "wallet account lookup returned HTTP {}",
                response.status()
            )));
        }
        let account: AccountResponse = response
            .json()
            .await
            .map_err(|e| LedgerError::InvalidResponse(e.to_string()))?;

        info!(address = %account.address, "Wallet connected");
        Ok(Self {
            wallet_url,
            address: account.address,
            client,
        })
    }
}

/// Signer for read-only use: it has an address but never signs.
#[derive(Debug, Clone)]
pub struct WatchOnlySigner {
    address: String,
}

impl WatchOnlySigner {
    /// Watches as `address`.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
        }
    }
}

#[async_trait]
impl Signer for WatchOnlySigner {
    fn account_address(&self) -> &str {
        &self.address
    }

    async fn sign_and_submit(
        &self,
        payload: &EntryFunctionPayload,
    ) -> Result<TransactionHash, LedgerError> {
        warn!(function = %payload.function, "Watch-only session cannot sign");
        Err(LedgerError::Declined)
    }
}

#[async_trait]
impl Signer for WalletBridgeSigner {
    fn account_address(&self) -> &str {
        &self.address
    }

    #[instrument(skip(self, payload), fields(function = %payload.function))]
    async fn sign_and_submit(
        &self,
        payload: &EntryFunctionPayload,
    ) -> Result<TransactionHash, LedgerError> {
        debug!(arguments = ?payload.arguments, "Requesting signature");
        let response = self
            .client
            .post(format!("{}/sign_and_submit", self.wallet_url))
            .json(payload)
            .send()
            .await
            .map_err(|e| LedgerError::Unreachable(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            warn!(status = %status, "Wallet declined");
            return Err(LedgerError::Declined);
        }
        if status.is_server_error() {
            return Err(LedgerError::Unreachable(format!("wallet returned HTTP {}", status)));
        }

        let body: SubmitResponse = response
            .json()
            .await
            .map_err(|e| LedgerError::InvalidResponse(e.to_string()))?;

        match (body.hash, body.error) {
            (_, Some(error)) if DECLINED_CODES.contains(&error.as_str()) => {
                warn!("Wallet declined");
                Err(LedgerError::Declined)
            }
            (_, Some(error)) => Err(LedgerError::Aborted(error)),
            (Some(hash), None) => {
                info!(hash = %hash, "Transaction submitted");
                Ok(TransactionHash(hash))
            }
            (None, None) => Err(LedgerError::InvalidResponse(
                "wallet returned neither hash nor error".to_string(),
            )),
        }
    }
}
