#![allow(missing_docs)]

//! Input tokens accepted by a game session.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    engine::Direction,
    error::{GameError, Result},
};

/// Something an input adapter asks the session to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    Move(Direction),
    /// Start over with the current settings, keeping the best score.
    Restart,
    /// Start over, applying the configured best-score policy.
    NewGame,
}

impl From<Direction> for Command {
    fn from(direction: Direction) -> Self {
        Command::Move(direction)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Move(direction) => write!(f, "{direction}"),
            Command::Restart => f.write_str("restart"),
            Command::NewGame => f.write_str("new-game"),
        }
    }
}

impl FromStr for Command {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "restart" => Ok(Command::Restart),
            "new" | "new-game" | "new_game" => Ok(Command::NewGame),
            other => other
                .parse::<Direction>()
                .map(Command::Move)
                .map_err(|_| GameError::InvalidCommand(s.to_string())),
        }
    }
}
