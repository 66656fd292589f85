//! Tic-tac-toe board model and the ledger's packed board codec.

pub mod codec;
mod position;
mod types;

pub use codec::MalformedBoard;
pub use position::Position;
pub use types::{AlertKind, Board, Cell, Mark, PlayerAssignment, WinnerResult};
