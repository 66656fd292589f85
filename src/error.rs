//! Error taxonomy for the session controller.

use crate::games::tictactoe::MalformedBoard;
use crate::identifier::GameIdentifier;

/// Everything that can go wrong between the client and the ledger.
///
/// Identifier and authorization errors are raised before any network call.
/// Query and transaction errors are folded into session state by
/// [`crate::GameSession`] and shown as a banner.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum ClientError {
    /// The game reference could not be parsed.
    #[display("Invalid game identifier: {}", _0)]
    InvalidIdentifier(String),

    /// The ledger holds no game under this identifier.
    #[display("Game {} not found", _0)]
    GameNotFound(GameIdentifier),

    /// Network failure, server error or confirmation timeout.
    #[display("Ledger unreachable: {}", _0)]
    LedgerUnreachable(String),

    /// The ledger returned a board the codec does not understand.
    #[display("{}", _0)]
    MalformedBoard(MalformedBoard),

    /// Delete attempted by someone other than the creator.
    #[display("Only {} can delete this game (caller is {})", creator, caller)]
    Unauthorized {
        /// Address that asked for the delete.
        caller: String,
        /// Address that created the game.
        creator: String,
    },

    /// The signer declined to sign.
    #[display("Transaction was declined by the signer")]
    TransactionRejected,

    /// The ledger executed the transaction and aborted it.
    #[display("Transaction failed: {}", _0)]
    TransactionFailed(String),

    /// A mutation is already awaiting confirmation.
    #[display("Another transaction is still awaiting confirmation")]
    TransactionInFlight,

    /// Cell index outside 0-8.
    #[display("Invalid move: no cell {}", _0)]
    InvalidMove(usize),

    /// The ledger answered with a shape we do not understand.
    #[display("Unexpected ledger response: {}", _0)]
    InvalidResponse(String),

    /// The action is only allowed once the game has ended.
    #[display("Game {} is still in progress", _0)]
    GameNotOver(GameIdentifier),

    /// The action needs a loaded game and there is none.
    #[display("No game is loaded")]
    NoGame,
}

impl std::error::Error for ClientError {}

impl From<MalformedBoard> for ClientError {
    fn from(err: MalformedBoard) -> Self {
        ClientError::MalformedBoard(err)
    }
}
