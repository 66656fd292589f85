//! Packed board codec.
//!
//! The ledger returns the board as a hex-encoded byte vector: an optional
//! `0x` prefix followed by one two-character token per cell. Only the second
//! character of each token carries the cell value (`0`, `1` or `2`); the
//! first is a framing character and is never interpreted.

use super::types::{Board, Cell};
use derive_more::Display;

/// Prefix the ledger puts in front of hex-encoded byte vectors.
const HEX_PREFIX: &str = "0x";

/// Packed board that could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
#[display("Malformed board {:?}: {}", raw, reason)]
pub struct MalformedBoard {
    /// The raw string as received.
    pub raw: String,
    /// What was wrong with it.
    pub reason: String,
}

impl std::error::Error for MalformedBoard {}

impl MalformedBoard {
    fn new(raw: &str, reason: impl Into<String>) -> Self {
        Self {
            raw: raw.to_string(),
            reason: reason.into(),
        }
    }
}

/// Decodes the ledger's packed board string.
pub fn decode(raw: &str) -> Result<Board, MalformedBoard> {
    let body = raw.strip_prefix(HEX_PREFIX).unwrap_or(raw);
    let chars: Vec<char> = body.chars().collect();

    if chars.len() % 2 != 0 {
        return Err(MalformedBoard::new(raw, "odd number of characters"));
    }
    let tokens = chars.len() / 2;
    if tokens != Board::SIZE {
        return Err(MalformedBoard::new(
            raw,
            format!("expected {} tokens, found {}", Board::SIZE, tokens),
        ));
    }

    let mut cells = [Cell::Empty; 9];
    for (index, token) in chars.chunks_exact(2).enumerate() {
        let digit = token[1];
        cells[index] = Cell::from_digit(digit).ok_or_else(|| {
            MalformedBoard::new(raw, format!("cell {} has value {:?}", index, digit))
        })?;
    }

    Ok(Board::from_cells(cells))
}

/// Encodes a board in the ledger's packed form.
pub fn encode(board: &Board) -> String {
    let mut out = String::with_capacity(HEX_PREFIX.len() + Board::SIZE * 2);
    out.push_str(HEX_PREFIX);
    for cell in board.cells() {
        out.push('0');
        out.push(cell.digit());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_without_prefix() {
        let board = decode("000000000000000000").unwrap();
        assert_eq!(board, Board::new());
    }

    #[test]
    fn framing_character_is_ignored() {
        let board = decode("0xf1a2000000000000000").unwrap_err();
        assert!(board.reason.contains("odd"));

        let board = decode("0xf1a200000000000000").unwrap();
        assert_eq!(board.get(0), Some(Cell::X));
        assert_eq!(board.get(1), Some(Cell::O));
    }

    #[test]
    fn empty_input_is_malformed() {
        assert!(decode("").is_err());
        assert!(decode("0x").is_err());
    }
}
