//! Command-line interface for ledger_tictactoe.

use clap::{Parser, Subcommand};

/// Ledger Tic-Tac-Toe - play games whose state lives on an Aptos ledger
#[derive(Parser, Debug)]
#[command(name = "ledger_tictactoe")]
#[command(about = "Tic-tac-toe client for an on-ledger game module", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to the client configuration file
    #[arg(short, long, default_value = "tictactoe.toml", global = true)]
    pub config: std::path::PathBuf,

    /// View as this address when no wallet is needed (affects win/loss banners)
    #[arg(long, global = true)]
    pub account: Option<String>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show a game's board, players and status
    Show {
        /// Game reference: address, name, address:game or /game/... path
        game: String,
    },

    /// Create a game owned by the connected wallet
    Start {
        /// Game name
        #[arg(long, default_value = "default")]
        name: String,

        /// Player X (address or name)
        #[arg(long)]
        x: String,

        /// Player O (address or name)
        #[arg(long)]
        o: String,
    },

    /// Play a cell in a game
    Play {
        /// Game reference
        game: String,

        /// Cell: index 0-8 (row-major) or a label such as "center"
        cell: String,
    },

    /// Start another round once a game is over
    Reset {
        /// Game reference
        game: String,
    },

    /// Delete a game (creator only)
    Delete {
        /// Game reference
        game: String,
    },

    /// Print the canonical route for a game reference
    Route {
        /// Game reference
        game: String,
    },
}

impl Command {
    /// Whether the command submits transactions and so needs a wallet.
    pub fn needs_wallet(&self) -> bool {
        matches!(
            self,
            Command::Start { .. } | Command::Play { .. } | Command::Reset { .. } | Command::Delete { .. }
        )
    }
}
