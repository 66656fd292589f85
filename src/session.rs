//! Session state machine for one game view.
//!
//! A [`GameSession`] owns everything the client knows about the game it is
//! looking at. State only changes when a query completes; transactions are
//! always followed by a fresh query rather than an optimistic update.

use crate::error::ClientError;
use crate::games::tictactoe::{AlertKind, Board, PlayerAssignment, WinnerResult};
use crate::identifier::{GameIdentifier, GameIdentifierResolver, RawIdentifier};
use crate::ledger::{GameSnapshot, LedgerQueryClient, TransactionController, TransactionOutcome};
use crate::route::Route;
use derive_getters::Getters;
use std::collections::VecDeque;
use tracing::{debug, error, info, instrument, warn};

/// Number of state transitions remembered for inspection.
const TRANSITION_HISTORY: usize = 32;

/// What the session currently shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// No game selected.
    Unresolved,
    /// Waiting for the ledger.
    Loading(GameIdentifier),
    /// The ledger has no such game.
    NotFound(GameIdentifier),
    /// Game in progress.
    Active {
        /// Game being shown.
        id: GameIdentifier,
        /// Current board.
        board: Board,
        /// Whose turn it is, if the game has started.
        current_player: Option<PlayerAssignment>,
        /// Participant playing X.
        player_x: PlayerAssignment,
        /// Participant playing O.
        player_o: PlayerAssignment,
    },
    /// Game finished.
    Over {
        /// Game being shown.
        id: GameIdentifier,
        /// Final board.
        board: Board,
        /// Who won, or a draw.
        winner: WinnerResult,
        /// Participant playing X.
        player_x: PlayerAssignment,
        /// Participant playing O.
        player_o: PlayerAssignment,
    },
}

impl SessionState {
    /// Short name of the state.
    pub fn label(&self) -> &'static str {
        match self {
            SessionState::Unresolved => "Unresolved",
            SessionState::Loading(_) => "Loading",
            SessionState::NotFound(_) => "NotFound",
            SessionState::Active { .. } => "Active",
            SessionState::Over { .. } => "Over",
        }
    }

    /// Board being shown, if any.
    pub fn board(&self) -> Option<&Board> {
        match self {
            SessionState::Active { board, .. } | SessionState::Over { board, .. } => Some(board),
            _ => None,
        }
    }
}

/// User-visible message about the last query or transaction.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct Banner {
    /// Severity.
    kind: AlertKind,
    /// Text to show.
    message: String,
}

impl Banner {
    /// Creates a banner.
    pub fn new(kind: AlertKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    fn error(err: &ClientError) -> Self {
        Self::new(AlertKind::Error, err.to_string())
    }
}

/// Tag for a query in flight.
///
/// A response is applied only while the session is still on the same
/// generation and identifier it was issued for.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct RequestTicket {
    /// Session generation at issue time.
    generation: u64,
    /// Identifier the query was issued for.
    id: GameIdentifier,
}

/// Whether a completed query changed the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// The response updated the state.
    Applied,
    /// The session had moved on; the response was dropped.
    Discarded,
}

/// One client-side interaction with a game, from resolution to navigation away.
#[derive(Debug)]
pub struct GameSession {
    resolver: GameIdentifierResolver,
    queries: LedgerQueryClient,
    transactions: TransactionController,
    state: SessionState,
    identifier: Option<GameIdentifier>,
    generation: u64,
    banner: Option<Banner>,
    transitions: VecDeque<&'static str>,
}

impl GameSession {
    /// Creates a session on the main menu.
    #[instrument(skip_all)]
    pub fn new(
        resolver: GameIdentifierResolver,
        queries: LedgerQueryClient,
        transactions: TransactionController,
    ) -> Self {
        info!(caller = %transactions.caller_address(), "Creating game session");
        let mut transitions = VecDeque::with_capacity(TRANSITION_HISTORY);
        transitions.push_back(SessionState::Unresolved.label());
        Self {
            resolver,
            queries,
            transactions,
            state: SessionState::Unresolved,
            identifier: None,
            generation: 0,
            banner: None,
            transitions,
        }
    }

    /// Current state.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Identifier of the game in view, if any.
    pub fn identifier(&self) -> Option<&GameIdentifier> {
        self.identifier.as_ref()
    }

    /// Last banner, if any.
    pub fn banner(&self) -> Option<&Banner> {
        self.banner.as_ref()
    }

    /// Current generation; bumps whenever the identifier changes or is dropped.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Recent state labels, oldest first.
    pub fn transitions(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.transitions.iter().copied()
    }

    /// Address of the local account.
    pub fn caller_address(&self) -> &str {
        self.transactions.caller_address()
    }

    /// Path that navigates back to this view.
    pub fn route(&self) -> String {
        match &self.identifier {
            Some(id) => Route::path_for(id),
            None => Route::main_menu_path().to_string(),
        }
    }

    fn set_state(&mut self, state: SessionState) {
        debug!(from = self.state.label(), to = state.label(), "Session transition");
        if self.transitions.len() == TRANSITION_HISTORY {
            self.transitions.pop_front();
        }
        self.transitions.push_back(state.label());
        self.state = state;
    }

    /// Starts a new generation for `id`.
    fn switch_to(&mut self, id: GameIdentifier) {
        self.generation += 1;
        info!(game = %id, generation = self.generation, "Switching game");
        self.identifier = Some(id.clone());
        self.banner = None;
        self.set_state(SessionState::Loading(id));
    }

    /// Returns to the main menu, dropping the game and any pending results.
    #[instrument(skip(self))]
    pub fn main_menu(&mut self) {
        self.generation += 1;
        info!(generation = self.generation, "Returning to main menu");
        self.identifier = None;
        self.banner = None;
        self.set_state(SessionState::Unresolved);
    }

    /// Follows a route.
    #[instrument(skip(self))]
    pub async fn navigate(&mut self, path: &str) -> Result<(), ClientError> {
        match Route::parse(path) {
            Ok(Route::MainMenu) => {
                self.main_menu();
                Ok(())
            }
            Ok(Route::Game(raw)) => self.enter(raw).await,
            Err(e) => {
                self.main_menu();
                self.banner = Some(Banner::error(&e));
                Err(e)
            }
        }
    }

    /// Resolves a game reference and loads it.
    ///
    /// An unparsable reference leaves the session on the main menu with an
    /// error banner; every other failure is reported through the state.
    #[instrument(skip(self))]
    pub async fn enter(&mut self, raw: RawIdentifier) -> Result<(), ClientError> {
        match self.resolver.resolve(raw).await {
            Ok(id) => {
                if self.identifier.as_ref() == Some(&id)
                    && matches!(self.state, SessionState::Active { .. } | SessionState::Over { .. })
                {
                    debug!(game = %id, "Already viewing this game, refreshing");
                } else {
                    self.switch_to(id);
                }
                self.refresh().await?;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Could not resolve game identifier");
                self.main_menu();
                self.banner = Some(Banner::error(&e));
                Err(e)
            }
        }
    }

    /// Marks the session as loading and returns a ticket for the query.
    pub fn begin_refresh(&mut self) -> Result<RequestTicket, ClientError> {
        let id = self.identifier.clone().ok_or(ClientError::NoGame)?;
        let loading = SessionState::Loading(id.clone());
        if self.state != loading {
            self.set_state(loading);
        }
        Ok(RequestTicket {
            generation: self.generation,
            id,
        })
    }

    /// Applies a query result, unless the session has moved on since `ticket`.
    #[instrument(skip(self, result), fields(generation = ticket.generation, game = %ticket.id))]
    pub fn complete_refresh(
        &mut self,
        ticket: RequestTicket,
        result: Result<GameSnapshot, ClientError>,
    ) -> Applied {
        if ticket.generation != self.generation || self.identifier.as_ref() != Some(&ticket.id) {
            warn!(current = self.generation, "Dropping stale response");
            return Applied::Discarded;
        }

        let id = ticket.id;
        match result {
            Ok(snapshot) => {
                let (board, current_player, player_x, player_o, winner) = snapshot.into_parts();
                if winner.is_over() {
                    let kind = winner
                        .classify(self.caller_address())
                        .unwrap_or(AlertKind::Info);
                    info!(game = %id, winner = %winner, "Game over");
                    self.banner = Some(Banner::new(kind, winner.to_string()));
                    self.set_state(SessionState::Over {
                        id,
                        board,
                        winner,
                        player_x,
                        player_o,
                    });
                } else {
                    let message = match &current_player {
                        Some(player) => format!("Current player is {}", player),
                        None => "Waiting for the game to start".to_string(),
                    };
                    info!(game = %id, "Game loaded");
                    self.banner = Some(Banner::new(AlertKind::Info, message));
                    self.set_state(SessionState::Active {
                        id,
                        board,
                        current_player,
                        player_x,
                        player_o,
                    });
                }
            }
            Err(ClientError::GameNotFound(missing)) => {
                info!(game = %missing, "Game not found");
                self.banner = Some(Banner::error(&ClientError::GameNotFound(missing.clone())));
                self.set_state(SessionState::NotFound(missing));
            }
            Err(e) => {
                if matches!(e, ClientError::MalformedBoard(_)) {
                    error!(game = %id, error = %e, "Ledger board format drifted from the codec");
                } else {
                    warn!(game = %id, error = %e, "Query failed");
                }
                // The identifier stays so the user can retry with refresh().
                self.banner = Some(Banner::error(&e));
                self.set_state(SessionState::Unresolved);
            }
        }
        Applied::Applied
    }

    /// Re-queries the ledger for the current game.
    #[instrument(skip(self))]
    pub async fn refresh(&mut self) -> Result<Applied, ClientError> {
        let ticket = self.begin_refresh()?;
        let result = self.queries.snapshot(&ticket.id).await;
        Ok(self.complete_refresh(ticket, result))
    }

    fn loaded_game(&self) -> Result<GameIdentifier, ClientError> {
        match &self.state {
            SessionState::Active { id, .. } | SessionState::Over { id, .. } => Ok(id.clone()),
            _ => Err(ClientError::NoGame),
        }
    }

    /// Folds a finished mutation into the session.
    ///
    /// Errors raised before submission go back to the caller untouched. A
    /// declined signature only sets a banner. Anything that reached the
    /// ledger triggers a re-query, success or not.
    async fn settle(
        &mut self,
        action: &str,
        result: Result<(), ClientError>,
    ) -> Result<TransactionOutcome, ClientError> {
        let outcome = TransactionOutcome::of(&result);
        match result {
            Ok(()) => {
                self.refresh().await?;
            }
            Err(
                e @ (ClientError::InvalidMove(_)
                | ClientError::Unauthorized { .. }
                | ClientError::TransactionInFlight
                | ClientError::InvalidIdentifier(_)),
            ) => {
                self.banner = Some(Banner::error(&e));
                return Err(e);
            }
            Err(ClientError::TransactionRejected) => {
                self.banner = Some(Banner::new(
                    AlertKind::Warning,
                    format!("{} was declined in the wallet", action),
                ));
            }
            Err(e) => {
                warn!(action, error = %e, "Transaction did not succeed, re-querying");
                self.refresh().await?;
                self.banner = Some(Banner::new(
                    AlertKind::Error,
                    format!("{} failed: {}", action, e),
                ));
            }
        }
        Ok(outcome)
    }

    /// Plays the cell at `index` (0-8) in the loaded game.
    #[instrument(skip(self))]
    pub async fn play_space(&mut self, index: usize) -> Result<TransactionOutcome, ClientError> {
        let id = self.loaded_game()?;
        let result = self.transactions.play_space(&id, index).await;
        self.settle("Move", result).await
    }

    /// Starts another round of the loaded game.
    #[instrument(skip(self))]
    pub async fn reset_game(&mut self) -> Result<TransactionOutcome, ClientError> {
        let id = self.loaded_game()?;
        let result = self.transactions.reset_game(&id).await;
        self.settle("Reset", result).await
    }

    /// Deletes the finished game and returns to the main menu.
    ///
    /// A game still in progress is refused without contacting the ledger.
    #[instrument(skip(self))]
    pub async fn delete_game(&mut self) -> Result<TransactionOutcome, ClientError> {
        let id = match &self.state {
            SessionState::Over { id, .. } => id.clone(),
            SessionState::Active { id, .. } => {
                let e = ClientError::GameNotOver(id.clone());
                warn!(game = %id, "Refusing delete of a game in progress");
                self.banner = Some(Banner::error(&e));
                return Err(e);
            }
            _ => return Err(ClientError::NoGame),
        };
        match self.transactions.delete_game(&id).await {
            Ok(()) => {
                self.main_menu();
                self.banner = Some(Banner::new(
                    AlertKind::Success,
                    format!("Deleted game {}", id),
                ));
                Ok(TransactionOutcome::Success)
            }
            Err(e) => self.settle("Delete", Err(e)).await,
        }
    }

    /// Creates a game owned by the caller and switches to it.
    ///
    /// Player references may be addresses or names.
    #[instrument(skip(self))]
    pub async fn start_game(
        &mut self,
        game_name: &str,
        player_x: &str,
        player_o: &str,
    ) -> Result<TransactionOutcome, ClientError> {
        let (address_x, address_o) = futures::join!(
            self.resolver.lookup_address(player_x),
            self.resolver.lookup_address(player_o),
        );

        let result = self
            .transactions
            .start_game(game_name, address_x.value(), address_o.value())
            .await;
        let outcome = TransactionOutcome::of(&result);

        match result {
            Ok(id) => {
                self.switch_to(id);
                self.refresh().await?;
            }
            Err(e @ (ClientError::TransactionInFlight | ClientError::InvalidIdentifier(_))) => {
                self.banner = Some(Banner::error(&e));
                return Err(e);
            }
            Err(ClientError::TransactionRejected) => {
                self.banner = Some(Banner::new(
                    AlertKind::Warning,
                    "Start game was declined in the wallet",
                ));
            }
            Err(e) => {
                warn!(error = %e, "Game creation did not succeed");
                self.banner = Some(Banner::new(
                    AlertKind::Error,
                    format!("Start game failed: {}", e),
                ));
            }
        }
        Ok(outcome)
    }
}
