//! Best-effort name resolution between human names and ledger addresses.

use async_trait::async_trait;
use derive_more::Display;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Suffix the name service appends to registered names.
const NAME_SUFFIX: &str = ".apt";

/// Upper bound on a single name lookup.
const LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

/// Why a lookup produced no answer.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum ResolutionError {
    /// The service has no record for the key.
    #[display("No name record for {}", _0)]
    NotFound(String),
    /// The service could not be reached or answered garbage.
    #[display("Name service unreachable: {}", _0)]
    Unreachable(String),
}

impl std::error::Error for ResolutionError {}

/// Name resolution collaborator.
#[async_trait]
pub trait NameService: Send + Sync + std::fmt::Debug {
    /// Looks up the primary name registered for an address.
    async fn address_to_name(&self, address: &str) -> Result<String, ResolutionError>;

    /// Looks up the address a name points at.
    async fn name_to_address(&self, name: &str) -> Result<String, ResolutionError>;
}

/// Result of a best-effort lookup after the fallback has been applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameResolution {
    /// The service answered.
    Resolved(String),
    /// The service failed; this is the input unchanged.
    FellBack(String),
}

impl NameResolution {
    /// Collapses a lookup result, keeping `original` on failure.
    pub fn collapse(result: Result<String, ResolutionError>, original: &str) -> Self {
        match result {
            Ok(value) => NameResolution::Resolved(value),
            Err(e) => {
                warn!(original, error = %e, "Name lookup failed, using input unchanged");
                NameResolution::FellBack(original.to_string())
            }
        }
    }

    /// Returns true when the service answered.
    pub fn is_resolved(&self) -> bool {
        matches!(self, NameResolution::Resolved(_))
    }

    /// Returns the value to use, resolved or not.
    pub fn value(&self) -> &str {
        match self {
            NameResolution::Resolved(v) | NameResolution::FellBack(v) => v,
        }
    }

    /// Consumes the resolution, returning the value to use.
    pub fn into_value(self) -> String {
        match self {
            NameResolution::Resolved(v) | NameResolution::FellBack(v) => v,
        }
    }
}

#[derive(Debug, Deserialize)]
struct AddressRecord {
    address: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NameRecord {
    name: Option<String>,
}

/// HTTP client for the Aptos Names API.
#[derive(Debug, Clone)]
pub struct AptosNamesClient {
    base_url: String,
    client: reqwest::Client,
}

impl AptosNamesClient {
    /// Creates a client against `base_url` (e.g. `https://www.aptosnames.com/api/devnet/v1`).
    #[instrument(skip_all, fields(base_url = %base_url))]
    pub fn new(base_url: String) -> Result<Self, ResolutionError> {
        let client = reqwest::Client::builder()
            .timeout(LOOKUP_TIMEOUT)
            .build()
            .map_err(|e| ResolutionError::Unreachable(format!("HTTP client: {}", e)))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    async fn fetch<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        key: &str,
    ) -> Result<T, ResolutionError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ResolutionError::Unreachable(e.to_string()))?;

        let status = response.status();
        debug!(url, status = %status, "Name service responded");
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ResolutionError::NotFound(key.to_string()));
        }
        if !status.is_success() {
            return Err(ResolutionError::Unreachable(format!("HTTP {}", status)));
        }

        response
            .json()
            .await
            .map_err(|e| ResolutionError::Unreachable(format!("Invalid response: {}", e)))
    }
}

#[async_trait]
impl NameService for AptosNamesClient {
    #[instrument(skip(self))]
    async fn address_to_name(&self, address: &str) -> Result<String, ResolutionError> {
        let url = format!("{}/primary-name/{}", self.base_url, address);
        let record: NameRecord = self.fetch(&url, address).await?;
        record
            .name
            .filter(|name| !name.is_empty())
            .map(|name| format!("{}{}", name, NAME_SUFFIX))
            .ok_or_else(|| ResolutionError::NotFound(address.to_string()))
    }

    #[instrument(skip(self))]
    async fn name_to_address(&self, name: &str) -> Result<String, ResolutionError> {
        let bare = name.strip_suffix(NAME_SUFFIX).unwrap_or(name);
        let url = format!("{}/address/{}", self.base_url, bare);
        let record: AddressRecord = self.fetch(&url, name).await?;
        record
            .address
            .filter(|address| !address.is_empty())
            .ok_or_else(|| ResolutionError::NotFound(name.to_string()))
    }
}
