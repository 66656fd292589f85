//! Ledger Tic-Tac-Toe - session controller for on-ledger games
//!
//! Games live in a Move module on an Aptos ledger. This library resolves
//! game references, reads board/turn/winner state, submits moves and
//! lifecycle transactions, and keeps a local session in step with the
//! ledger after every query or mutation.
//!
//! # Architecture
//!
//! - **Codec**: packed board string to a 9-cell grid
//! - **Identifier**: raw references to canonical `(creator, name)` pairs
//! - **Ledger**: read queries and confirmed transactions
//! - **Session**: the state machine tying it together
//!
//! # Example
//!
//! ```no_run
//! use ledger_tictactoe::{
//!     AptosNamesClient, AptosRestLedger, ClientConfig, GameIdentifierResolver, GameSession,
//!     LedgerQueryClient, RawIdentifier, TransactionController, WatchOnlySigner,
//! };
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = ClientConfig::default();
//! let ledger = Arc::new(AptosRestLedger::new(config.node_url().clone())?);
//! let names = Arc::new(AptosNamesClient::new(config.names_url().clone())?);
//! let resolver = GameIdentifierResolver::new(names);
//! let queries = LedgerQueryClient::new(
//!     ledger.clone(),
//!     config.module_address().clone(),
//!     resolver.clone(),
//! );
//! let transactions = TransactionController::new(
//!     ledger,
//!     Arc::new(WatchOnlySigner::new("0x1")),
//!     config.module_address().clone(),
//!     config.confirmation_timeout(),
//!     config.poll_interval(),
//! );
//!
//! let mut session = GameSession::new(resolver, queries, transactions);
//! session.enter(RawIdentifier::parse("0xabc:mygame")).await?;
//! println!("{}", session.state().label());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod config;
mod error;
mod games;
mod identifier;
mod ledger;
mod names;
mod route;
mod session;

// Crate-level exports - Configuration
pub use config::{ClientConfig, ConfigError, NODE_URL_ENV, WALLET_URL_ENV};

// Crate-level exports - Errors
pub use error::ClientError;

// Crate-level exports - Game types
pub use games::tictactoe::{
    AlertKind, Board, Cell, MalformedBoard, Mark, PlayerAssignment, Position, WinnerResult, codec,
};

// Crate-level exports - Identifiers and routes
pub use identifier::{
    DEFAULT_GAME_NAME, GameIdentifier, GameIdentifierResolver, RawIdentifier, SEPARATOR,
    canonical_address, same_address,
};
pub use route::Route;

// Crate-level exports - Name resolution
pub use names::{AptosNamesClient, NameResolution, NameService, ResolutionError};

// Crate-level exports - Ledger access
pub use ledger::{
    AptosRestLedger, EntryFunctionPayload, GameSnapshot, Ledger, LedgerError, LedgerQueryClient,
    MODULE_NAME, Signer, TransactionController, TransactionHash, TransactionOutcome,
    TransactionStatus, ViewRequest, WalletBridgeSigner, WatchOnlySigner, classify_view_failure,
    parse_transaction_status,
};

// Crate-level exports - Session
pub use session::{Applied, Banner, GameSession, RequestTicket, SessionState};
