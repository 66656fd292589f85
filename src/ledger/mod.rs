//! Ledger access: read queries, signed transactions and their wire types.

mod query;
mod rest;
mod transaction;
mod wallet;

pub use query::{GameSnapshot, LedgerQueryClient};
pub use rest::{AptosRestLedger, classify_view_failure, parse_transaction_status};
pub use transaction::{TransactionController, TransactionOutcome};
pub use wallet::{WalletBridgeSigner, WatchOnlySigner};

use crate::error::ClientError;
use crate::identifier::GameIdentifier;
use async_trait::async_trait;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Name of the Move module holding the game.
pub const MODULE_NAME: &str = "tic_tac_toe";

/// Failure talking to the ledger or the signer, before it is tied to a game.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum LedgerError {
    /// The requested resource does not exist.
    #[display("Not found: {}", _0)]
    NotFound(String),
    /// Transport failure or server-side error.
    #[display("Unreachable: {}", _0)]
    Unreachable(String),
    /// The signer declined.
    #[display("Declined by signer")]
    Declined,
    /// The transaction was refused or aborted.
    #[display("Aborted: {}", _0)]
    Aborted(String),
    /// The response did not have the expected shape.
    #[display("Invalid response: {}", _0)]
    InvalidResponse(String),
}

impl std::error::Error for LedgerError {}

impl LedgerError {
    /// Converts to a client error, attributing a missing resource to `id`.
    pub fn for_game(self, id: &GameIdentifier) -> ClientError {
        match self {
            LedgerError::NotFound(_) => ClientError::GameNotFound(id.clone()),
            other => other.into(),
        }
    }
}

impl From<LedgerError> for ClientError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::NotFound(what) => {
                ClientError::InvalidResponse(format!("not found: {}", what))
            }
            LedgerError::Unreachable(reason) => ClientError::LedgerUnreachable(reason),
            LedgerError::Declined => ClientError::TransactionRejected,
            LedgerError::Aborted(reason) => ClientError::TransactionFailed(reason),
            LedgerError::InvalidResponse(reason) => ClientError::InvalidResponse(reason),
        }
    }
}

/// Body of a view-function call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewRequest {
    /// Fully qualified function, `address::module::function`.
    pub function: String,
    /// Generic type arguments (none for this module).
    pub type_arguments: Vec<String>,
    /// Positional arguments.
    pub arguments: Vec<Value>,
}

/// Entry-function payload handed to the signer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryFunctionPayload {
    /// Payload discriminator expected by wallets.
    #[serde(rename = "type")]
    pub payload_type: String,
    /// Fully qualified function, `address::module::function`.
    pub function: String,
    /// Generic type arguments (none for this module).
    pub type_arguments: Vec<String>,
    /// Positional arguments.
    pub arguments: Vec<Value>,
}

impl EntryFunctionPayload {
    /// Creates an `entry_function_payload`.
    pub fn new(function: String, arguments: Vec<Value>) -> Self {
        Self {
            payload_type: "entry_function_payload".to_string(),
            function,
            type_arguments: Vec::new(),
            arguments,
        }
    }
}

/// Hash of a submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub struct TransactionHash(pub String);

/// Where a submitted transaction is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionStatus {
    /// Not committed yet.
    Pending,
    /// Committed; `success` is false when the VM aborted it.
    Committed {
        /// Whether the transaction executed successfully.
        success: bool,
        /// VM status string, e.g. `Executed successfully` or an abort code.
        vm_status: String,
    },
}

/// Read side of the ledger plus finality tracking.
#[async_trait]
pub trait Ledger: Send + Sync + std::fmt::Debug {
    /// Calls a side-effect-free view function.
    async fn view(&self, request: ViewRequest) -> Result<Vec<Value>, LedgerError>;

    /// Looks up a submitted transaction.
    async fn transaction_status(
        &self,
        hash: &TransactionHash,
    ) -> Result<TransactionStatus, LedgerError>;
}

/// Wallet that signs and submits on behalf of the local account.
#[async_trait]
pub trait Signer: Send + Sync + std::fmt::Debug {
    /// Address of the account that signs.
    fn account_address(&self) -> &str;

    /// Signs and submits the payload, returning the transaction hash.
    async fn sign_and_submit(
        &self,
        payload: &EntryFunctionPayload,
    ) -> Result<TransactionHash, LedgerError>;
}
