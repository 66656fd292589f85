//! Game identifiers and their resolution into canonical form.

use crate::error::ClientError;
use crate::names::{NameResolution, NameService};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Name used when an identifier scheme carries no game name.
pub const DEFAULT_GAME_NAME: &str = "default";

/// Reserved separator between address and name in composite identifiers.
pub const SEPARATOR: char = ':';

/// Longest hex body of a ledger address.
const MAX_ADDRESS_DIGITS: usize = 64;

/// Canonical `(creatorAddress, gameName)` pair used for every ledger call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Getters, Serialize, Deserialize)]
pub struct GameIdentifier {
    /// Account that created (and owns) the game.
    creator_address: String,
    /// Name of the game under that account.
    game_name: String,
}

impl GameIdentifier {
    /// Creates an identifier from already-canonical parts.
    pub fn new(creator_address: impl Into<String>, game_name: impl Into<String>) -> Self {
        Self {
            creator_address: creator_address.into(),
            game_name: game_name.into(),
        }
    }

    /// Returns true when `address` is the creator of this game.
    pub fn is_created_by(&self, address: &str) -> bool {
        same_address(address, &self.creator_address)
    }
}

impl std::fmt::Display for GameIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}{}", self.creator_address, SEPARATOR, self.game_name)
    }
}

/// Returns the canonical form of `input` if it is a ledger address.
///
/// Addresses are `0x` followed by 1 to 64 hex digits. The canonical form is
/// lowercase with leading zeros stripped, so `0x0ABC`, `0xabc` and the
/// 64-digit padded form all map to `0xabc`. The zero address is `0x0`.
pub fn canonical_address(input: &str) -> Option<String> {
    let trimmed = input.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))?;
    let well_formed = !digits.is_empty()
        && digits.len() <= MAX_ADDRESS_DIGITS
        && digits.chars().all(|c| c.is_ascii_hexdigit());
    if !well_formed {
        return None;
    }
    let significant = digits.trim_start_matches('0');
    let significant = if significant.is_empty() { "0" } else { significant };
    Some(format!("0x{}", significant.to_ascii_lowercase()))
}

/// Returns true when both inputs name the same account.
///
/// Non-addresses (unresolved names) only match themselves.
pub fn same_address(a: &str, b: &str) -> bool {
    match (canonical_address(a), canonical_address(b)) {
        (Some(a), Some(b)) => a == b,
        _ => a.trim() == b.trim(),
    }
}

/// A game reference as the user or a route supplied it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RawIdentifier {
    /// Address or human name with no game name.
    Bare(String),
    /// `address:name` joined by [`SEPARATOR`].
    Composite(String),
    /// Independently entered address and name fields.
    Pair {
        /// Address or human name of the creator.
        address: String,
        /// Game name; empty means [`DEFAULT_GAME_NAME`].
        name: String,
    },
}

impl RawIdentifier {
    /// Classifies free-form input.
    pub fn parse(input: &str) -> Self {
        if input.contains(SEPARATOR) {
            RawIdentifier::Composite(input.to_string())
        } else {
            RawIdentifier::Bare(input.to_string())
        }
    }

    /// Splits the reference into unresolved `(address, name)` parts.
    #[instrument]
    pub fn split(&self) -> Result<(String, String), ClientError> {
        let (address, name) = match self {
            RawIdentifier::Bare(input) => (input.trim(), DEFAULT_GAME_NAME),
            RawIdentifier::Composite(input) => {
                let parts: Vec<&str> = input.split(SEPARATOR).collect();
                if parts.len() != 2 {
                    return Err(ClientError::InvalidIdentifier(format!(
                        "expected exactly one '{}' in {:?}",
                        SEPARATOR, input
                    )));
                }
                let name = parts[1].trim();
                if name.is_empty() {
                    return Err(ClientError::InvalidIdentifier(format!(
                        "missing game name in {:?}",
                        input
                    )));
                }
                (parts[0].trim(), name)
            }
            RawIdentifier::Pair { address, name } => {
                let name = name.trim();
                let name = if name.is_empty() { DEFAULT_GAME_NAME } else { name };
                (address.trim(), name)
            }
        };

        if address.is_empty() {
            return Err(ClientError::InvalidIdentifier(
                "missing creator address".to_string(),
            ));
        }
        for part in [address, name] {
            if part.contains(SEPARATOR) || part.contains('/') {
                return Err(ClientError::InvalidIdentifier(format!(
                    "{:?} contains a reserved character",
                    part
                )));
            }
        }

        Ok((address.to_string(), name.to_string()))
    }
}

impl From<&GameIdentifier> for RawIdentifier {
    fn from(id: &GameIdentifier) -> Self {
        RawIdentifier::Pair {
            address: id.creator_address.clone(),
            name: id.game_name.clone(),
        }
    }
}

impl From<GameIdentifier> for RawIdentifier {
    fn from(id: GameIdentifier) -> Self {
        RawIdentifier::Pair {
            address: id.creator_address,
            name: id.game_name,
        }
    }
}

/// Turns raw game references into canonical identifiers.
///
/// Name lookups are best-effort: when the service fails, the input passes
/// through unchanged and the ledger gets to say whether the game exists.
#[derive(Debug, Clone)]
pub struct GameIdentifierResolver {
    names: Arc<dyn NameService>,
}

impl GameIdentifierResolver {
    /// Creates a resolver backed by the given name service.
    pub fn new(names: Arc<dyn NameService>) -> Self {
        Self { names }
    }

    /// Resolves a raw reference into its canonical identifier.
    #[instrument(skip(self))]
    pub async fn resolve(&self, raw: RawIdentifier) -> Result<GameIdentifier, ClientError> {
        let (address, name) = raw.split()?;
        let address = self.lookup_address(&address).await.into_value();
        let id = GameIdentifier::new(address, name);
        info!(game = %id, "Resolved game identifier");
        Ok(id)
    }

    /// Parses and resolves free-form input.
    pub async fn resolve_str(&self, input: &str) -> Result<GameIdentifier, ClientError> {
        self.resolve(RawIdentifier::parse(input)).await
    }

    /// Maps an address-or-name to a canonical address.
    ///
    /// Canonical addresses never touch the network.
    #[instrument(skip(self))]
    pub async fn lookup_address(&self, address_or_name: &str) -> NameResolution {
        if let Some(address) = canonical_address(address_or_name) {
            debug!(address = %address, "Already a canonical address");
            return NameResolution::Resolved(address);
        }

        let looked_up = self
            .names
            .name_to_address(address_or_name)
            .await
            .and_then(|address| {
                canonical_address(&address).ok_or_else(|| {
                    crate::names::ResolutionError::Unreachable(format!(
                        "service returned non-address {:?}",
                        address
                    ))
                })
            });
        NameResolution::collapse(looked_up, address_or_name)
    }

    /// Maps an address to a human name for display.
    #[instrument(skip(self))]
    pub async fn display_name(&self, address: &str) -> NameResolution {
        NameResolution::collapse(self.names.address_to_name(address).await, address)
    }
}
