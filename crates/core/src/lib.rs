#![warn(clippy::all, missing_docs)]

//! Core rules engine for the 2048 terminal game.
//!
//! This crate hosts the board model, the move engine, game sessions,
//! best-score persistence and configuration handling used by the
//! terminal UI and any future frontends.

pub mod command;
pub mod config;
pub mod engine;
pub mod error;
pub mod grid;
pub mod score;
pub mod session;
pub mod tile;

pub use command::Command;
pub use config::AppConfig;
pub use engine::{Direction, MoveReport, Rules};
pub use error::GameError;
pub use grid::Grid;
pub use score::{BestScorePolicy, FileScoreStore, MemoryScoreStore, ScoreStore};
pub use session::{GameSession, MoveOutcome, Renderer, Snapshot, TileView};
pub use tile::{Position, Tile, TileId};
