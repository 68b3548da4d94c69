#![allow(missing_docs)]

//! Error types raised by the rules engine.

use thiserror::Error;

/// Errors surfaced by grid construction and input parsing.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GameError {
    #[error("board size must be between 2 and 16, got {0}")]
    InvalidBoardSize(usize),

    #[error("invalid direction '{0}' (expected up, right, down or left)")]
    InvalidDirection(String),

    #[error("invalid command '{0}'")]
    InvalidCommand(String),

    #[error("win value must be a power of two of at least 4, got {0}")]
    InvalidWinValue(u32),

    #[error("spawn probability must be within 0..=1, got {0}")]
    InvalidProbability(f64),
}

pub type Result<T> = std::result::Result<T, GameError>;
