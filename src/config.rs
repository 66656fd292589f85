//! Client configuration.

use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Environment variable overriding [`ClientConfig::node_url`].
pub const NODE_URL_ENV: &str = "TICTACTOE_NODE_URL";

/// Environment variable overriding [`ClientConfig::wallet_url`].
pub const WALLET_URL_ENV: &str = "TICTACTOE_WALLET_URL";

/// Where the client finds the ledger, the module and its collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Fullnode REST endpoint.
    #[serde(default = "default_node_url")]
    node_url: String,

    /// Account the tic-tac-toe module is published under.
    #[serde(default = "default_module_address")]
    module_address: String,

    /// Name service base URL.
    #[serde(default = "default_names_url")]
    names_url: String,

    /// Wallet bridge that signs transactions.
    #[serde(default = "default_wallet_url")]
    wallet_url: String,

    /// How long to wait for a transaction to be confirmed.
    #[serde(default = "default_confirmation_timeout_secs")]
    confirmation_timeout_secs: u64,

    /// Delay between confirmation polls.
    #[serde(default = "default_poll_interval_ms")]
    poll_interval_ms: u64,
}

fn default_node_url() -> String {
    "https://fullnode.devnet.aptoslabs.com".to_string()
}

fn default_module_address() -> String {
    "0x9b6adab7156c48f2f9ed9b5ab783a8c1d550b4130d409d9b1832931c38e4c845".to_string()
}

fn default_names_url() -> String {
    "https://www.aptosnames.com/api/devnet/v1".to_string()
}

fn default_wallet_url() -> String {
    "http://127.0.0.1:8787".to_string()
}

fn default_confirmation_timeout_secs() -> u64 {
    30
}

fn default_poll_interval_ms() -> u64 {
    500
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            node_url: default_node_url(),
            module_address: default_module_address(),
            names_url: default_names_url(),
            wallet_url: default_wallet_url(),
            confirmation_timeout_secs: default_confirmation_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl ClientConfig {
    /// Loads configuration from a TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;
        config.validate()?;

        info!(node_url = %config.node_url, "Config loaded successfully");
        Ok(config)
    }

    /// Loads `path` if it exists, defaults otherwise, then applies environment overrides.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let mut config = if path.as_ref().exists() {
            Self::from_file(path.as_ref())?
        } else {
            info!("Config file not found, using defaults");
            Self::default()
        };

        if let Ok(url) = std::env::var(NODE_URL_ENV) {
            debug!(url = %url, "Overriding node URL from environment");
            config.node_url = url;
        }
        if let Ok(url) = std::env::var(WALLET_URL_ENV) {
            debug!(url = %url, "Overriding wallet URL from environment");
            config.wallet_url = url;
        }
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if crate::identifier::canonical_address(&self.module_address).is_none() {
            return Err(ConfigError::new(format!(
                "module_address {:?} is not a ledger address",
                self.module_address
            )));
        }
        for (field, url) in [("node_url", &self.node_url), ("wallet_url", &self.wallet_url)] {
            if url.trim().is_empty() {
                return Err(ConfigError::new(format!("{} must not be empty", field)));
            }
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::new(
                "poll_interval_ms must be positive".to_string(),
            ));
        }
        if self.confirmation_timeout_secs == 0 {
            return Err(ConfigError::new(
                "confirmation_timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Confirmation deadline as a duration.
    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_secs(self.confirmation_timeout_secs)
    }

    /// Poll interval as a duration.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}
