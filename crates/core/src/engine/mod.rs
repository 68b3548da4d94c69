#![allow(missing_docs)]

//! Move resolution: sliding, merging, spawning and terminal detection.

pub mod spawn;

use std::{fmt, str::FromStr};

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    error::{GameError, Result},
    grid::{Grid, MAX_GRID_SIZE, MIN_GRID_SIZE},
    tile::{Position, Tile},
};

pub use spawn::{random_tile_value, spawn_random_tile, SpawnedTile};

/// Tile value that wins the game.
pub const WIN_VALUE: u32 = 2048;
/// Chance that a spawned tile is a 2 rather than a 4.
pub const TWO_PROBABILITY: f64 = 0.75;

/// A direction to slide tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Right,
    Down,
    Left,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Right,
        Direction::Down,
        Direction::Left,
    ];

    /// Unit step `(dx, dy)`; y grows downwards.
    pub const fn vector(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Right => (1, 0),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Right => "right",
            Direction::Down => "down",
            Direction::Left => "left",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" => Ok(Direction::Up),
            "right" => Ok(Direction::Right),
            "down" => Ok(Direction::Down),
            "left" => Ok(Direction::Left),
            _ => Err(GameError::InvalidDirection(s.to_string())),
        }
    }
}

/// Tunable rules for a game.
#[derive(Debug, Clone, PartialEq)]
pub struct Rules {
    pub size: usize,
    pub start_tiles: usize,
    pub win_value: u32,
    pub two_probability: f64,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            size: 4,
            start_tiles: 2,
            win_value: WIN_VALUE,
            two_probability: TWO_PROBABILITY,
        }
    }
}

impl Rules {
    pub fn validate(&self) -> Result<()> {
        if !(MIN_GRID_SIZE..=MAX_GRID_SIZE).contains(&self.size) {
            return Err(GameError::InvalidBoardSize(self.size));
        }
        if self.win_value < 4 || !self.win_value.is_power_of_two() {
            return Err(GameError::InvalidWinValue(self.win_value));
        }
        if !(0.0..=1.0).contains(&self.two_probability) {
            return Err(GameError::InvalidProbability(self.two_probability));
        }
        Ok(())
    }
}

/// Visiting order for one move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Traversals {
    pub x: Vec<usize>,
    pub y: Vec<usize>,
}

/// Always scan from the edge the tiles are moving towards, so tiles nearer
/// that edge settle before the ones behind them.
pub fn build_traversals(size: usize, direction: Direction) -> Traversals {
    let mut x: Vec<usize> = (0..size).collect();
    let mut y: Vec<usize> = (0..size).collect();
    let (dx, dy) = direction.vector();
    if dx == 1 {
        x.reverse();
    }
    if dy == 1 {
        y.reverse();
    }
    Traversals { x, y }
}

/// Result of walking a tile along a direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FarthestPosition {
    /// Last empty cell reached, or the start when the way is blocked.
    pub farthest: Position,
    /// First occupied or out-of-bounds cell past `farthest`.
    pub next: Position,
}

pub fn find_farthest_position(
    grid: &Grid,
    start: Position,
    direction: Direction,
) -> FarthestPosition {
    let (dx, dy) = direction.vector();
    let mut farthest = start;
    let mut next = start.offset(dx, dy);
    while grid.is_available(next) {
        farthest = next;
        next = next.offset(dx, dy);
    }
    FarthestPosition { farthest, next }
}

/// A tile produced by merging two equal tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MergeEvent {
    pub position: Position,
    pub value: u32,
}

/// Everything a single move did to the board.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoveReport {
    pub direction: Direction,
    /// At least one tile changed position.
    pub moved: bool,
    pub score_delta: u32,
    pub merges: Vec<MergeEvent>,
    pub spawned: Option<SpawnedTile>,
    pub reached_win: bool,
    pub game_over: bool,
}

impl MoveReport {
    fn new(direction: Direction) -> Self {
        Self {
            direction,
            moved: false,
            score_delta: 0,
            merges: Vec::new(),
            spawned: None,
            reached_win: false,
            game_over: false,
        }
    }
}

/// Clear merge provenance, snapshot previous positions and drop tiles that
/// left the board during the last move.
pub fn prepare_tiles(grid: &mut Grid) {
    for id in grid.placed_ids() {
        if let Some(tile) = grid.tile_mut(id) {
            tile.clear_merged_from();
            tile.save();
        }
    }
    grid.release_detached();
}

/// Slide and merge every tile once, without spawning or terminal checks.
pub fn slide_tiles(grid: &mut Grid, direction: Direction, win_value: u32) -> MoveReport {
    prepare_tiles(grid);

    let mut report = MoveReport::new(direction);
    let traversals = build_traversals(grid.size(), direction);

    for &x in &traversals.x {
        for &y in &traversals.y {
            let cell = Position::new(x as i32, y as i32);
            let Some(id) = grid.cell_id(cell) else {
                continue;
            };
            let Some(value) = grid.tile(id).map(Tile::value) else {
                continue;
            };

            let FarthestPosition { farthest, next } = find_farthest_position(grid, cell, direction);
            let target = grid
                .cell_id(next)
                .and_then(|other| grid.tile(other).map(|tile| (other, tile.value(), tile.is_merged())));

            match target {
                Some((other, other_value, false)) if other_value == value => {
                    let merged_value = value * 2;
                    grid.insert(Tile::merged(next, merged_value, [id, other]));
                    grid.remove(id);
                    if let Some(tile) = grid.tile_mut(id) {
                        tile.update_position(next);
                    }

                    report.score_delta += merged_value;
                    report.merges.push(MergeEvent {
                        position: next,
                        value: merged_value,
                    });
                    if merged_value == win_value {
                        report.reached_win = true;
                    }
                }
                _ => grid.relocate(id, farthest),
            }

            if grid.tile(id).map(Tile::position) != Some(cell) {
                report.moved = true;
            }
        }
    }

    report
}

/// Run a full move: slide, then spawn and evaluate game over if anything moved.
pub fn apply_move<R: Rng + ?Sized>(
    grid: &mut Grid,
    direction: Direction,
    rules: &Rules,
    rng: &mut R,
) -> MoveReport {
    let mut report = slide_tiles(grid, direction, rules.win_value);
    if !report.moved {
        debug!(%direction, "Move changed nothing");
        return report;
    }

    report.spawned = spawn_random_tile(grid, rules, rng);
    report.game_over = !moves_available(grid);
    debug!(
        %direction,
        score_delta = report.score_delta,
        merges = report.merges.len(),
        game_over = report.game_over,
        "Move applied"
    );
    report
}

/// True if any two orthogonal neighbours hold equal values.
pub fn tile_matches_available(grid: &Grid) -> bool {
    grid.cells().any(|(position, tile)| {
        let Some(tile) = tile else {
            return false;
        };
        Direction::ALL.iter().any(|direction| {
            let (dx, dy) = direction.vector();
            grid.cell_content(position.offset(dx, dy))
                .map_or(false, |other| other.value() == tile.value())
        })
    })
}

pub fn moves_available(grid: &Grid) -> bool {
    grid.has_available_cells() || tile_matches_available(grid)
}
