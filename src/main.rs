//! Ledger Tic-Tac-Toe - command-line client
//!
//! Drives one game session per invocation against a fullnode.

#![warn(missing_docs)]

mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};
use ledger_tictactoe::{
    AptosNamesClient, AptosRestLedger, ClientConfig, GameIdentifierResolver, GameSession,
    LedgerQueryClient, Position, RawIdentifier, Route, SessionState, Signer, TransactionController,
    TransactionOutcome, WalletBridgeSigner, WatchOnlySigner,
};
use std::sync::Arc;
use tracing::{info, instrument};
use tracing_subscriber::EnvFilter;

/// Address used for read-only sessions when `--account` is not given.
const SPECTATOR_ADDRESS: &str = "0x0";

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    initialize_tracing();

    let config = ClientConfig::load(&cli.config)?;
    let mut session = build_session(&config, &cli).await?;

    match cli.command {
        Command::Show { game } => {
            open(&mut session, &game).await?;
        }
        Command::Start { name, x, o } => {
            let outcome = session.start_game(&name, &x, &o).await?;
            report(&outcome);
        }
        Command::Play { game, cell } => {
            let position = Position::from_label_or_number(&cell)
                .ok_or_else(|| anyhow::anyhow!("{:?} is not a board cell", cell))?;
            open(&mut session, &game).await?;
            let outcome = session.play_space(position.to_index()).await?;
            report(&outcome);
        }
        Command::Reset { game } => {
            open(&mut session, &game).await?;
            let outcome = session.reset_game().await?;
            report(&outcome);
        }
        Command::Delete { game } => {
            open(&mut session, &game).await?;
            let outcome = session.delete_game().await?;
            report(&outcome);
        }
        Command::Route { game } => {
            let resolver = GameIdentifierResolver::new(Arc::new(AptosNamesClient::new(
                config.names_url().clone(),
            )?));
            let id = resolver.resolve(parse_reference(&game)?).await?;
            println!("{}", Route::path_for(&id));
            return Ok(());
        }
    }

    print_session(&session);
    Ok(())
}

/// Wires the session to the configured ledger, name service and signer.
#[instrument(skip_all, fields(node_url = %config.node_url()))]
async fn build_session(config: &ClientConfig, cli: &Cli) -> Result<GameSession> {
    let ledger = Arc::new(AptosRestLedger::new(config.node_url().clone())?);
    let names = Arc::new(AptosNamesClient::new(config.names_url().clone())?);
    let resolver = GameIdentifierResolver::new(names);

    let signer: Arc<dyn Signer> = if cli.command.needs_wallet() {
        info!(wallet_url = %config.wallet_url(), "Connecting wallet");
        Arc::new(WalletBridgeSigner::connect(config.wallet_url().clone()).await?)
    } else {
        let address = cli.account.clone().unwrap_or_else(|| SPECTATOR_ADDRESS.to_string());
        Arc::new(WatchOnlySigner::new(address))
    };

    let queries = LedgerQueryClient::new(
        ledger.clone(),
        config.module_address().clone(),
        resolver.clone(),
    );
    let transactions = TransactionController::new(
        ledger,
        signer,
        config.module_address().clone(),
        config.confirmation_timeout(),
        config.poll_interval(),
    );

    Ok(GameSession::new(resolver, queries, transactions))
}

/// Accepts either a route path or a free-form reference.
fn parse_reference(game: &str) -> Result<RawIdentifier> {
    if game.trim_start().starts_with('/') {
        match Route::parse(game)? {
            Route::Game(raw) => Ok(raw),
            Route::MainMenu => anyhow::bail!("{:?} is the main menu, not a game", game),
        }
    } else {
        Ok(RawIdentifier::parse(game))
    }
}

async fn open(session: &mut GameSession, game: &str) -> Result<()> {
    session.enter(parse_reference(game)?).await?;
    Ok(())
}

fn report(outcome: &TransactionOutcome) {
    match outcome {
        TransactionOutcome::Success => println!("Transaction confirmed"),
        TransactionOutcome::Rejected => println!("Transaction declined"),
        TransactionOutcome::Failed(reason) => println!("Transaction failed: {}", reason),
    }
}

fn print_session(session: &GameSession) {
    if let Some(banner) = session.banner() {
        println!("[{}] {}", banner.kind(), banner.message());
    }

    match session.state() {
        SessionState::Active {
            board,
            player_x,
            player_o,
            ..
        }
        | SessionState::Over {
            board,
            player_x,
            player_o,
            ..
        } => {
            println!("{}", board.display());
            println!("X: {}", player_x);
            println!("O: {}", player_o);
            println!("Route: {}", session.route());
        }
        SessionState::NotFound(id) => println!("No game at {}", id),
        SessionState::Loading(id) => println!("Still loading {}", id),
        SessionState::Unresolved => {}
    }
}

fn initialize_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,ledger_tictactoe=debug")),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("Tracing initialized");
}
