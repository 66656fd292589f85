//! In-memory ledger, signer and name service for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use ledger_tictactoe::{
    EntryFunctionPayload, GameIdentifier, GameIdentifierResolver, GameSession, Ledger,
    LedgerError, LedgerQueryClient, NameService, ResolutionError, Signer, TransactionController,
    TransactionHash, TransactionStatus, ViewRequest,
};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const MODULE_ADDRESS: &str = "0x1";
pub const CREATOR: &str = "0xabc";
pub const OPPONENT: &str = "0xdef";

/// Ledger-side state of one game, in view-function wire form.
#[derive(Debug, Clone)]
pub struct FakeGame {
    pub board: String,
    pub current: (u8, String),
    pub players: (String, String),
    pub winner: (u8, String),
}

impl FakeGame {
    /// Fresh game with X to move.
    pub fn started(x: &str, o: &str) -> Self {
        Self {
            board: "0x000000000000000000".to_string(),
            current: (1, x.to_string()),
            players: (x.to_string(), o.to_string()),
            winner: (0, "0x0".to_string()),
        }
    }

    pub fn with_board(mut self, board: &str) -> Self {
        self.board = board.to_string();
        self
    }

    pub fn with_current(mut self, code: u8, address: &str) -> Self {
        self.current = (code, address.to_string());
        self
    }

    pub fn with_winner(mut self, code: u8, address: &str) -> Self {
        self.winner = (code, address.to_string());
        self
    }
}

/// How submitted transactions end.
#[derive(Debug, Clone)]
pub enum Finality {
    Succeed,
    Abort(String),
    PendingForever,
}

/// Ledger keyed by `(creator, name)`, with games applied on commit.
#[derive(Debug)]
pub struct FakeLedger {
    games: Mutex<HashMap<(String, String), FakeGame>>,
    on_commit: Mutex<Vec<(GameIdentifier, Option<FakeGame>)>>,
    view_failure: Mutex<Option<LedgerError>>,
    finality: Mutex<Finality>,
    pub view_calls: AtomicUsize,
    pub status_calls: AtomicUsize,
}

impl FakeLedger {
    pub fn new() -> Self {
        Self {
            games: Mutex::new(HashMap::new()),
            on_commit: Mutex::new(Vec::new()),
            view_failure: Mutex::new(None),
            finality: Mutex::new(Finality::Succeed),
            view_calls: AtomicUsize::new(0),
            status_calls: AtomicUsize::new(0),
        }
    }

    pub fn insert(&self, id: &GameIdentifier, game: FakeGame) {
        self.games.lock().unwrap().insert(key(id), game);
    }

    /// Replaces (or with `None`, removes) the game once the next transaction commits.
    pub fn after_commit(&self, id: &GameIdentifier, game: Option<FakeGame>) {
        self.on_commit.lock().unwrap().push((id.clone(), game));
    }

    pub fn fail_views(&self, error: LedgerError) {
        *self.view_failure.lock().unwrap() = Some(error);
    }

    pub fn set_finality(&self, finality: Finality) {
        *self.finality.lock().unwrap() = finality;
    }

    pub fn view_count(&self) -> usize {
        self.view_calls.load(Ordering::SeqCst)
    }
}

fn key(id: &GameIdentifier) -> (String, String) {
    (id.creator_address().clone(), id.game_name().clone())
}

#[async_trait]
impl Ledger for FakeLedger {
    async fn view(&self, request: ViewRequest) -> Result<Vec<Value>, LedgerError> {
        self.view_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.view_failure.lock().unwrap().clone() {
            return Err(error);
        }

        let address = request.arguments[0].as_str().unwrap_or_default().to_string();
        let name = request.arguments[1].as_str().unwrap_or_default().to_string();
        let games = self.games.lock().unwrap();
        let game = games
            .get(&(address.clone(), name.clone()))
            .ok_or_else(|| LedgerError::NotFound(format!("{}:{}", address, name)))?;

        let function = request.function.rsplit("::").next().unwrap_or_default();
        let values = match function {
            "get_board" => vec![json!(game.board)],
            "current_player" => vec![json!(game.current.0), json!(game.current.1)],
            "players" => vec![json!(game.players.0), json!(game.players.1)],
            "winner" => vec![json!(game.winner.0), json!(game.winner.1)],
            other => {
                return Err(LedgerError::InvalidResponse(format!(
                    "unknown view {}",
                    other
                )));
            }
        };
        Ok(values)
    }

    async fn transaction_status(
        &self,
        _hash: &TransactionHash,
    ) -> Result<TransactionStatus, LedgerError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let finality = self.finality.lock().unwrap().clone();
        match finality {
            Finality::PendingForever => Ok(TransactionStatus::Pending),
            Finality::Abort(vm_status) => Ok(TransactionStatus::Committed {
                success: false,
                vm_status,
            }),
            Finality::Succeed => {
                let updates: Vec<_> = self.on_commit.lock().unwrap().drain(..).collect();
                let mut games = self.games.lock().unwrap();
                for (id, game) in updates {
                    match game {
                        Some(game) => {
                            games.insert(key(&id), game);
                        }
                        None => {
                            games.remove(&key(&id));
                        }
                    }
                }
                Ok(TransactionStatus::Committed {
                    success: true,
                    vm_status: "Executed successfully".to_string(),
                })
            }
        }
    }
}

/// Signer that records payloads and answers with a fixed result.
#[derive(Debug)]
pub struct FakeSigner {
    address: String,
    result: Mutex<Result<TransactionHash, LedgerError>>,
    delay: Duration,
    pub payloads: Mutex<Vec<EntryFunctionPayload>>,
    pub calls: AtomicUsize,
}

impl FakeSigner {
    pub fn new(address: &str) -> Self {
        Self {
            address: address.to_string(),
            result: Mutex::new(Ok(TransactionHash("0xfeed".to_string()))),
            delay: Duration::ZERO,
            payloads: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn declining(self) -> Self {
        *self.result.lock().unwrap() = Err(LedgerError::Declined);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_payload(&self) -> Option<EntryFunctionPayload> {
        self.payloads.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Signer for FakeSigner {
    fn account_address(&self) -> &str {
        &self.address
    }

    async fn sign_and_submit(
        &self,
        payload: &EntryFunctionPayload,
    ) -> Result<TransactionHash, LedgerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.payloads.lock().unwrap().push(payload.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.result.lock().unwrap().clone()
    }
}

/// Name service backed by two maps; `offline` makes every lookup fail.
#[derive(Debug, Default)]
pub struct FakeNames {
    addresses: HashMap<String, String>,
    names: HashMap<String, String>,
    offline: bool,
    pub calls: AtomicUsize,
}

impl FakeNames {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn offline() -> Self {
        Self {
            offline: true,
            ..Self::default()
        }
    }

    /// Registers `name` as pointing at `address`, and as its primary name.
    pub fn register(mut self, name: &str, address: &str) -> Self {
        self.addresses.insert(name.to_string(), address.to_string());
        self.names.insert(address.to_string(), name.to_string());
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NameService for FakeNames {
    async fn address_to_name(&self, address: &str) -> Result<String, ResolutionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.offline {
            return Err(ResolutionError::Unreachable("offline".to_string()));
        }
        self.names
            .get(address)
            .cloned()
            .ok_or_else(|| ResolutionError::NotFound(address.to_string()))
    }

    async fn name_to_address(&self, name: &str) -> Result<String, ResolutionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.offline {
            return Err(ResolutionError::Unreachable("offline".to_string()));
        }
        self.addresses
            .get(name)
            .cloned()
            .ok_or_else(|| ResolutionError::NotFound(name.to_string()))
    }
}

/// Everything a test needs to drive a session.
pub struct Harness {
    pub ledger: Arc<FakeLedger>,
    pub signer: Arc<FakeSigner>,
    pub names: Arc<FakeNames>,
    pub resolver: GameIdentifierResolver,
}

impl Harness {
    pub fn new(ledger: FakeLedger, signer: FakeSigner, names: FakeNames) -> Self {
        let names = Arc::new(names);
        Self {
            ledger: Arc::new(ledger),
            signer: Arc::new(signer),
            resolver: GameIdentifierResolver::new(names.clone()),
            names,
        }
    }

    /// Harness with an empty ledger, a signer for [`CREATOR`] and no names.
    pub fn basic() -> Self {
        Self::new(FakeLedger::new(), FakeSigner::new(CREATOR), FakeNames::new())
    }

    pub fn queries(&self) -> LedgerQueryClient {
        LedgerQueryClient::new(
            self.ledger.clone(),
            MODULE_ADDRESS.to_string(),
            self.resolver.clone(),
        )
    }

    pub fn transactions(&self, confirmation_timeout: Duration) -> TransactionController {
        TransactionController::new(
            self.ledger.clone(),
            self.signer.clone(),
            MODULE_ADDRESS.to_string(),
            confirmation_timeout,
            Duration::from_millis(5),
        )
    }

    pub fn session(&self) -> GameSession {
        GameSession::new(
            self.resolver.clone(),
            self.queries(),
            self.transactions(Duration::from_secs(2)),
        )
    }
}

/// Identifier for `CREATOR:name`.
pub fn game(name: &str) -> GameIdentifier {
    GameIdentifier::new(CREATOR, name)
}
