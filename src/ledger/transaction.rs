//! Mutating operations: start, move, reset and delete.

use super::{
    EntryFunctionPayload, Ledger, LedgerError, MODULE_NAME, Signer, TransactionHash,
    TransactionStatus,
};
use crate::error::ClientError;
use crate::games::tictactoe::Position;
use crate::identifier::{GameIdentifier, RawIdentifier, canonical_address};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

/// How a mutation ended, for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionOutcome {
    /// Confirmed on the ledger.
    Success,
    /// The signer declined; nothing was submitted.
    Rejected,
    /// Submitted but failed, timed out, or never got submitted.
    Failed(String),
}

impl TransactionOutcome {
    /// Classifies the result of a mutation.
    pub fn of<T>(result: &Result<T, ClientError>) -> Self {
        match result {
            Ok(_) => TransactionOutcome::Success,
            Err(ClientError::TransactionRejected) => TransactionOutcome::Rejected,
            Err(e) => TransactionOutcome::Failed(e.to_string()),
        }
    }
}

/// Builds, signs and confirms the module's entry functions.
///
/// Only one mutation may be in flight at a time; a second request fails
/// with [`ClientError::TransactionInFlight`] without being submitted.
#[derive(Debug, Clone)]
pub struct TransactionController {
    ledger: Arc<dyn Ledger>,
    signer: Arc<dyn Signer>,
    module_address: String,
    confirmation_timeout: Duration,
    poll_interval: Duration,
    in_flight: Arc<Mutex<()>>,
}

impl TransactionController {
    /// Creates a controller for the module published at `module_address`.
    pub fn new(
        ledger: Arc<dyn Ledger>,
        signer: Arc<dyn Signer>,
        module_address: String,
        confirmation_timeout: Duration,
        poll_interval: Duration,
    ) -> Self {
        Self {
            ledger,
            signer,
            module_address,
            confirmation_timeout,
            poll_interval,
            in_flight: Arc::new(Mutex::new(())),
        }
    }

    /// Address of the local account.
    pub fn caller_address(&self) -> &str {
        self.signer.account_address()
    }

    /// Returns true while a mutation awaits confirmation.
    pub fn is_busy(&self) -> bool {
        self.in_flight.try_lock().is_err()
    }

    fn payload(&self, function: &str, arguments: Vec<Value>) -> EntryFunctionPayload {
        EntryFunctionPayload::new(
            format!("{}::{}::{}", self.module_address, MODULE_NAME, function),
            arguments,
        )
    }

    /// Creates a game owned by the caller.
    #[instrument(skip(self))]
    pub async fn start_game(
        &self,
        game_name: &str,
        player_x: &str,
        player_o: &str,
    ) -> Result<GameIdentifier, ClientError> {
        let (creator, name) = RawIdentifier::Pair {
            address: self.caller_address().to_string(),
            name: game_name.to_string(),
        }
        .split()?;
        let creator = canonical_address(&creator).unwrap_or(creator);

        let payload = self.payload("start_game", vec![json!(name), json!(player_x), json!(player_o)]);
        self.submit(payload).await?;

        let id = GameIdentifier::new(creator, name);
        info!(game = %id, "Game created");
        Ok(id)
    }

    /// Plays the cell at `index` (0-8).
    ///
    /// Legality is the ledger's call; an illegal move comes back as
    /// [`ClientError::TransactionFailed`].
    #[instrument(skip(self), fields(game = %id))]
    pub async fn play_space(&self, id: &GameIdentifier, index: usize) -> Result<(), ClientError> {
        let position = Position::from_index(index).ok_or(ClientError::InvalidMove(index))?;
        let payload = self.payload(
            "play_space",
            vec![
                json!(id.creator_address()),
                json!(id.game_name()),
                json!(position.to_u8()),
            ],
        );
        self.submit(payload).await?;
        info!(position = %position, "Move confirmed");
        Ok(())
    }

    /// Clears the board for another round with the same players.
    #[instrument(skip(self), fields(game = %id))]
    pub async fn reset_game(&self, id: &GameIdentifier) -> Result<(), ClientError> {
        let payload = self.payload(
            "reset_game",
            vec![json!(id.creator_address()), json!(id.game_name())],
        );
        self.submit(payload).await?;
        info!("Game reset");
        Ok(())
    }

    /// Removes the game. Only its creator may do this.
    #[instrument(skip(self), fields(game = %id))]
    pub async fn delete_game(&self, id: &GameIdentifier) -> Result<(), ClientError> {
        let caller = self.caller_address();
        if !id.is_created_by(caller) {
            warn!(caller, creator = %id.creator_address(), "Refusing delete by non-creator");
            return Err(ClientError::Unauthorized {
                caller: caller.to_string(),
                creator: id.creator_address().clone(),
            });
        }

        let payload = self.payload("delete_game", vec![json!(id.game_name())]);
        self.submit(payload).await?;
        info!("Game deleted");
        Ok(())
    }

    /// Signs, submits and waits for finality.
    async fn submit(&self, payload: EntryFunctionPayload) -> Result<TransactionHash, ClientError> {
        let _guard = self.in_flight.try_lock().map_err(|_| {
            warn!(function = %payload.function, "Mutation already in flight");
            ClientError::TransactionInFlight
        })?;

        let hash = self.signer.sign_and_submit(&payload).await?;
        debug!(hash = %hash, "Awaiting finality");

        tokio::time::timeout(self.confirmation_timeout, self.await_finality(&hash))
            .await
            .map_err(|_| {
                warn!(hash = %hash, timeout = ?self.confirmation_timeout, "Confirmation timed out");
                ClientError::LedgerUnreachable(format!(
                    "transaction {} not confirmed within {:?}",
                    hash, self.confirmation_timeout
                ))
            })??;

        Ok(hash)
    }

    async fn await_finality(&self, hash: &TransactionHash) -> Result<(), ClientError> {
        loop {
            match self.ledger.transaction_status(hash).await {
                Ok(TransactionStatus::Committed { success: true, .. }) => {
                    debug!(hash = %hash, "Transaction committed");
                    return Ok(());
                }
                Ok(TransactionStatus::Committed { success: false, vm_status }) => {
                    warn!(hash = %hash, vm_status = %vm_status, "Transaction aborted");
                    return Err(ClientError::TransactionFailed(vm_status));
                }
                Ok(TransactionStatus::Pending) => {}
                Err(LedgerError::Unreachable(reason)) => {
                    debug!(hash = %hash, reason = %reason, "Status poll failed, polling again");
                }
                Err(e) => return Err(e.into()),
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}
