//! Core domain types for ledger-backed tic-tac-toe.

use crate::identifier::same_address;
use derive_getters::Getters;
use derive_new::new;
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Symbol a player places on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
pub enum Mark {
    /// Player X (moves first).
    X,
    /// Player O.
    O,
}

impl Mark {
    /// Maps a ledger player code (`1` = X, `2` = O) to a mark.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Mark::X),
            2 => Some(Mark::O),
            _ => None,
        }
    }

    /// Returns the ledger player code for this mark.
    pub fn code(self) -> u8 {
        match self {
            Mark::X => 1,
            Mark::O => 2,
        }
    }
}

/// A single cell of the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Cell {
    /// Nobody has played here.
    #[default]
    Empty,
    /// Occupied by X.
    X,
    /// Occupied by O.
    O,
}

impl Cell {
    /// Parses the decimal value digit used by the ledger's packed board.
    pub fn from_digit(digit: char) -> Option<Self> {
        match digit {
            '0' => Some(Cell::Empty),
            '1' => Some(Cell::X),
            '2' => Some(Cell::O),
            _ => None,
        }
    }

    /// Returns the decimal value digit for this cell.
    pub fn digit(self) -> char {
        match self {
            Cell::Empty => '0',
            Cell::X => '1',
            Cell::O => '2',
        }
    }

    /// Returns the mark occupying this cell, if any.
    pub fn mark(self) -> Option<Mark> {
        match self {
            Cell::Empty => None,
            Cell::X => Some(Mark::X),
            Cell::O => Some(Mark::O),
        }
    }
}

impl From<Mark> for Cell {
    fn from(mark: Mark) -> Self {
        match mark {
            Mark::X => Cell::X,
            Mark::O => Cell::O,
        }
    }
}

/// 3x3 tic-tac-toe board as last reported by the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Board {
    /// Cells in row-major order (0-8).
    cells: [Cell; 9],
}

impl Board {
    /// Number of cells on a board.
    pub const SIZE: usize = 9;

    /// Creates an empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a board from cells in row-major order.
    pub fn from_cells(cells: [Cell; 9]) -> Self {
        Self { cells }
    }

    /// Gets the cell at the given index (0-8).
    pub fn get(&self, index: usize) -> Option<Cell> {
        self.cells.get(index).copied()
    }

    /// Returns all cells.
    pub fn cells(&self) -> &[Cell; 9] {
        &self.cells
    }

    /// Iterates the board one row of three cells at a time.
    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.cells.chunks(3)
    }

    /// Returns true when no empty cell remains.
    pub fn is_full(&self) -> bool {
        self.cells.iter().all(|cell| *cell != Cell::Empty)
    }

    /// Indices of the cells nobody has played yet.
    pub fn empty_indices(&self) -> Vec<usize> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| **cell == Cell::Empty)
            .map(|(index, _)| index)
            .collect()
    }

    /// Formats the board as a human-readable string.
    ///
    /// Empty cells show their 1-based number so a player can pick them.
    pub fn display(&self) -> String {
        let mut result = String::new();
        for (row, cells) in self.rows().enumerate() {
            for (col, cell) in cells.iter().enumerate() {
                let pos = row * 3 + col;
                let symbol = match cell {
                    Cell::Empty => (pos + 1).to_string(),
                    Cell::X => "X".to_string(),
                    Cell::O => "O".to_string(),
                };
                result.push_str(&symbol);
                if col < 2 {
                    result.push('|');
                }
            }
            if row < 2 {
                result.push_str("\n-+-+-\n");
            }
        }
        result
    }
}

/// A participant registered on a ledger game.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Getters, Serialize, Deserialize, new)]
pub struct PlayerAssignment {
    /// Symbol this participant plays.
    symbol: Mark,
    /// Ledger account address.
    address: String,
    /// Human-readable name, or the address when no name resolved.
    display_name: String,
}

impl PlayerAssignment {
    /// Creates an assignment whose display name is the raw address.
    pub fn unnamed(symbol: Mark, address: impl Into<String>) -> Self {
        let address = address.into();
        Self {
            symbol,
            display_name: address.clone(),
            address,
        }
    }
}

impl std::fmt::Display for PlayerAssignment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.display_name == self.address {
            write!(f, "{} ({})", self.symbol, self.address)
        } else {
            write!(f, "{} ({}, {})", self.symbol, self.display_name, self.address)
        }
    }
}

/// Severity of a user-visible banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum AlertKind {
    /// Good news for the viewer.
    Success,
    /// Neutral information.
    Info,
    /// Neither good nor bad, e.g. a draw or a declined signature.
    Warning,
    /// Bad news or a failure.
    Error,
}

/// Outcome reported by the ledger's winner accessor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WinnerResult {
    /// Game still running (or not started).
    None,
    /// A player won.
    Won(Mark, String),
    /// Board filled with no winner.
    Draw,
}

impl WinnerResult {
    /// Returns true when the game has ended.
    pub fn is_over(&self) -> bool {
        !matches!(self, WinnerResult::None)
    }

    /// Classifies the result for the viewer at `caller`.
    ///
    /// Only an X win by the caller counts as a success; any O win, or an X
    /// win by somebody else, is an error; a draw is a warning.
    #[instrument]
    pub fn classify(&self, caller: &str) -> Option<AlertKind> {
        match self {
            WinnerResult::None => None,
            WinnerResult::Won(Mark::X, address) if same_address(address, caller) => {
                Some(AlertKind::Success)
            }
            WinnerResult::Won(_, _) => Some(AlertKind::Error),
            WinnerResult::Draw => Some(AlertKind::Warning),
        }
    }
}

impl std::fmt::Display for WinnerResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WinnerResult::None => write!(f, "No winner yet"),
            WinnerResult::Won(mark, address) => write!(f, "Winner is {} ({})", mark, address),
            WinnerResult::Draw => write!(f, "Game ended in a draw"),
        }
    }
}
