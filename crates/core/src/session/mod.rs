#![allow(missing_docs)]

//! Game session state and lifecycle.

pub mod game;
mod models;

pub use game::GameSession;
pub use models::{MoveOutcome, Renderer, Snapshot, TileView};
