use serde::Serialize;

use crate::{
    engine::MoveReport,
    tile::{Position, TileId},
};

/// Render-ready view of one placed tile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TileView {
    pub id: TileId,
    pub position: Position,
    pub value: u32,
    /// Where the tile stood before the last move; `None` for fresh tiles.
    pub previous_position: Option<Position>,
    /// Starting cells of the two tiles merged into this one.
    pub merged_from: Option<[Position; 2]>,
    pub is_merged: bool,
    pub is_new: bool,
}

/// Everything a renderer needs after a state change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub size: usize,
    /// Occupied cells in row-major order.
    pub tiles: Vec<TileView>,
    pub score: u32,
    pub best_score: u32,
    pub moves: u64,
    pub is_game_over: bool,
    pub is_win: bool,
}

impl Snapshot {
    pub fn tile_at(&self, position: Position) -> Option<&TileView> {
        self.tiles.iter().find(|tile| tile.position == position)
    }

    /// Board values indexed as `rows[y][x]`.
    pub fn rows(&self) -> Vec<Vec<Option<u32>>> {
        let mut rows = vec![vec![None; self.size]; self.size];
        for tile in &self.tiles {
            let (x, y) = (tile.position.x as usize, tile.position.y as usize);
            if let Some(cell) = rows.get_mut(y).and_then(|row| row.get_mut(x)) {
                *cell = Some(tile.value);
            }
        }
        rows
    }

    pub fn is_terminal(&self) -> bool {
        self.is_game_over || self.is_win
    }
}

/// What happened to a move request.
#[derive(Debug, Clone, PartialEq)]
pub enum MoveOutcome {
    /// The session already ended; nothing was touched.
    Ignored,
    /// No tile could move; nothing was spawned or scored.
    NoOp,
    Applied(MoveReport),
}

impl MoveOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, MoveOutcome::Applied(_))
    }

    pub fn report(&self) -> Option<&MoveReport> {
        match self {
            MoveOutcome::Applied(report) => Some(report),
            _ => None,
        }
    }
}

/// Presentation layer fed after every accepted state change.
pub trait Renderer {
    fn render(&mut self, snapshot: &Snapshot);
}

impl<F> Renderer for F
where
    F: FnMut(&Snapshot),
{
    fn render(&mut self, snapshot: &Snapshot) {
        self(snapshot)
    }
}
