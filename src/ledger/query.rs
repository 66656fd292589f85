//! Read-only game queries.

use super::{Ledger, MODULE_NAME, ViewRequest};
use crate::error::ClientError;
use crate::games::tictactoe::{Board, Mark, PlayerAssignment, WinnerResult, codec};
use crate::identifier::{GameIdentifier, GameIdentifierResolver, same_address};
use derive_getters::Getters;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, instrument};

/// Everything a session needs to render one game.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct GameSnapshot {
    /// Current board.
    board: Board,
    /// Whose turn it is; `None` before the game starts or after it ends.
    current_player: Option<PlayerAssignment>,
    /// Participant playing X.
    player_x: PlayerAssignment,
    /// Participant playing O.
    player_o: PlayerAssignment,
    /// Winner, draw, or nothing yet.
    winner: WinnerResult,
}

impl GameSnapshot {
    /// Assembles a snapshot from query results.
    pub fn new(
        board: Board,
        current_player: Option<PlayerAssignment>,
        player_x: PlayerAssignment,
        player_o: PlayerAssignment,
        winner: WinnerResult,
    ) -> Self {
        Self {
            board,
            current_player,
            player_x,
            player_o,
            winner,
        }
    }

    /// Splits the snapshot into its parts.
    pub fn into_parts(
        self,
    ) -> (
        Board,
        Option<PlayerAssignment>,
        PlayerAssignment,
        PlayerAssignment,
        WinnerResult,
    ) {
        (
            self.board,
            self.current_player,
            self.player_x,
            self.player_o,
            self.winner,
        )
    }
}

/// Issues the module's view functions and types their results.
#[derive(Debug, Clone)]
pub struct LedgerQueryClient {
    ledger: Arc<dyn Ledger>,
    module_address: String,
    resolver: GameIdentifierResolver,
}

impl LedgerQueryClient {
    /// Creates a query client for the module published at `module_address`.
    pub fn new(
        ledger: Arc<dyn Ledger>,
        module_address: String,
        resolver: GameIdentifierResolver,
    ) -> Self {
        Self {
            ledger,
            module_address,
            resolver,
        }
    }

    async fn call(&self, id: &GameIdentifier, function: &str) -> Result<Vec<Value>, ClientError> {
        let request = ViewRequest {
            function: format!("{}::{}::{}", self.module_address, MODULE_NAME, function),
            type_arguments: Vec::new(),
            arguments: vec![
                Value::String(id.creator_address().clone()),
                Value::String(id.game_name().clone()),
            ],
        };
        let values = self
            .ledger
            .view(request)
            .await
            .map_err(|e| e.for_game(id))?;
        debug!(function, ?values, "View returned");
        Ok(values)
    }

    /// Reads and decodes the board.
    #[instrument(skip(self), fields(game = %id))]
    pub async fn get_board(&self, id: &GameIdentifier) -> Result<Board, ClientError> {
        let values = self.call(id, "get_board").await?;
        let raw = string_at(&values, 0)?;
        codec::decode(raw).map_err(|e| {
            error!(raw, error = %e, "Board format no longer matches the ledger");
            ClientError::from(e)
        })
    }

    /// Reads whose turn it is.
    ///
    /// The display name is left as the address; [`Self::snapshot`] fills it
    /// in from the resolved players.
    #[instrument(skip(self), fields(game = %id))]
    pub async fn get_current_player(
        &self,
        id: &GameIdentifier,
    ) -> Result<Option<PlayerAssignment>, ClientError> {
        let values = self.call(id, "current_player").await?;
        let code = code_at(&values, 0)?;
        if code == 0 {
            return Ok(None);
        }
        let mark = Mark::from_code(code)
            .ok_or_else(|| ClientError::InvalidResponse(format!("player code {}", code)))?;
        let address = string_at(&values, 1)?;
        Ok(Some(PlayerAssignment::unnamed(mark, address)))
    }

    /// Reads both participants and resolves their display names.
    #[instrument(skip(self), fields(game = %id))]
    pub async fn get_players(
        &self,
        id: &GameIdentifier,
    ) -> Result<(PlayerAssignment, PlayerAssignment), ClientError> {
        let values = self.call(id, "players").await?;
        let address_x = string_at(&values, 0)?;
        let address_o = string_at(&values, 1)?;

        let (name_x, name_o) = futures::join!(
            self.resolver.display_name(address_x),
            self.resolver.display_name(address_o),
        );

        Ok((
            PlayerAssignment::new(Mark::X, address_x.to_string(), name_x.into_value()),
            PlayerAssignment::new(Mark::O, address_o.to_string(), name_o.into_value()),
        ))
    }

    /// Reads the winner.
    #[instrument(skip(self), fields(game = %id))]
    pub async fn get_winner(&self, id: &GameIdentifier) -> Result<WinnerResult, ClientError> {
        let values = self.call(id, "winner").await?;
        match code_at(&values, 0)? {
            0 => Ok(WinnerResult::None),
            3 => Ok(WinnerResult::Draw),
            code @ (1 | 2) => {
                let mark = Mark::from_code(code)
                    .ok_or_else(|| ClientError::InvalidResponse(format!("winner code {}", code)))?;
                Ok(WinnerResult::Won(mark, string_at(&values, 1)?.to_string()))
            }
            code => Err(ClientError::InvalidResponse(format!("winner code {}", code))),
        }
    }

    /// Runs all four reads concurrently.
    #[instrument(skip(self), fields(game = %id))]
    pub async fn snapshot(&self, id: &GameIdentifier) -> Result<GameSnapshot, ClientError> {
        let (board, current, (player_x, player_o), winner) = futures::try_join!(
            self.get_board(id),
            self.get_current_player(id),
            self.get_players(id),
            self.get_winner(id),
        )?;

        let current_player = current.map(|current| {
            [&player_x, &player_o]
                .into_iter()
                .find(|p| {
                    p.symbol() == current.symbol()
                        && same_address(p.address(), current.address())
                })
                .cloned()
                .unwrap_or(current)
        });

        Ok(GameSnapshot::new(
            board,
            current_player,
            player_x,
            player_o,
            winner,
        ))
    }
}

fn value_at<'a>(values: &'a [Value], index: usize) -> Result<&'a Value, ClientError> {
    values.get(index).ok_or_else(|| {
        ClientError::InvalidResponse(format!("expected at least {} values", index + 1))
    })
}

fn string_at(values: &[Value], index: usize) -> Result<&str, ClientError> {
    let value = value_at(values, index)?;
    value
        .as_str()
        .ok_or_else(|| ClientError::InvalidResponse(format!("expected string, got {}", value)))
}

/// Reads a small numeric code, given as a JSON number or a decimal string.
fn code_at(values: &[Value], index: usize) -> Result<u8, ClientError> {
    let value = value_at(values, index)?;
    let code = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse::<u64>().ok(),
        _ => None,
    };
    code.and_then(|c| u8::try_from(c).ok())
        .ok_or_else(|| ClientError::InvalidResponse(format!("expected code, got {}", value)))
}
