#![allow(missing_docs)]

//! Tiles and board coordinates.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Value assigned to a tile when none is supplied.
pub const DEFAULT_TILE_VALUE: u32 = 2;

/// A cell coordinate on the board.
///
/// Coordinates are signed so that a step off the edge is still representable;
/// such positions are simply out of bounds for every grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Position one step away along `(dx, dy)`.
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Stable handle for a tile inside a [`Grid`](crate::grid::Grid).
///
/// Identifiers are allocated on insert and never reused by the same grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileId(pub(crate) u64);

/// A single numbered piece on the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    position: Position,
    value: u32,
    merged_from: Option<[TileId; 2]>,
    previous_position: Option<Position>,
}

impl Tile {
    /// Create a tile with the default value of 2.
    pub fn new(position: Position) -> Self {
        Self::with_value(position, DEFAULT_TILE_VALUE)
    }

    pub fn with_value(position: Position, value: u32) -> Self {
        debug_assert!(
            value >= 2 && value.is_power_of_two(),
            "tile value {value} is not a power of two >= 2"
        );
        Self {
            position,
            value,
            merged_from: None,
            previous_position: None,
        }
    }

    pub(crate) fn merged(position: Position, value: u32, sources: [TileId; 2]) -> Self {
        let mut tile = Self::with_value(position, value);
        tile.merged_from = Some(sources);
        tile
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn value(&self) -> u32 {
        self.value
    }

    /// The two tiles consumed to create this one during the current move.
    pub fn merged_from(&self) -> Option<[TileId; 2]> {
        self.merged_from
    }

    pub fn is_merged(&self) -> bool {
        self.merged_from.is_some()
    }

    /// Where the tile stood when the current move started.
    pub fn previous_position(&self) -> Option<Position> {
        self.previous_position
    }

    /// Snapshot the current position as the previous one.
    pub fn save(&mut self) {
        self.previous_position = Some(self.position);
    }

    pub fn update_position(&mut self, position: Position) {
        self.position = position;
    }

    pub(crate) fn clear_merged_from(&mut self) {
        self.merged_from = None;
    }
}
