#![allow(missing_docs)]

//! Fixed-size board holding tiles.

use std::collections::{HashMap, HashSet};

use rand::Rng;

use crate::{
    error::{GameError, Result},
    tile::{Position, Tile, TileId},
};

/// Smallest supported board edge.
pub const MIN_GRID_SIZE: usize = 2;
/// Largest supported edge length.
pub const MAX_GRID_SIZE: usize = 16;

/// An N×N board.
///
/// Cells store tile ids; the tiles themselves live in an arena keyed by id so
/// that merge sources stay resolvable after they leave the board.
#[derive(Debug, Clone)]
pub struct Grid {
    size: usize,
    cells: Vec<Option<TileId>>,
    tiles: HashMap<TileId, Tile>,
    next_id: u64,
}

impl Grid {
    pub fn new(size: usize) -> Result<Self> {
        if !(MIN_GRID_SIZE..=MAX_GRID_SIZE).contains(&size) {
            return Err(GameError::InvalidBoardSize(size));
        }
        Ok(Self {
            size,
            cells: vec![None; size * size],
            tiles: HashMap::new(),
            next_id: 0,
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_in_bounds(&self, position: Position) -> bool {
        let size = self.size as i64;
        let (x, y) = (i64::from(position.x), i64::from(position.y));
        (0..size).contains(&x) && (0..size).contains(&y)
    }

    fn index(&self, position: Position) -> Option<usize> {
        self.is_in_bounds(position)
            .then(|| position.x as usize * self.size + position.y as usize)
    }

    /// Id of the tile occupying `position`, if any.
    pub fn cell_id(&self, position: Position) -> Option<TileId> {
        self.index(position).and_then(|index| self.cells[index])
    }

    /// Tile at `position`; `None` when empty or out of bounds.
    pub fn cell_content(&self, position: Position) -> Option<&Tile> {
        self.cell_id(position).and_then(|id| self.tiles.get(&id))
    }

    pub fn is_occupied(&self, position: Position) -> bool {
        self.cell_content(position).is_some()
    }

    pub fn is_available(&self, position: Position) -> bool {
        self.is_in_bounds(position) && !self.is_occupied(position)
    }

    /// Resolve a tile by id, including tiles no longer placed on the board.
    pub fn tile(&self, id: TileId) -> Option<&Tile> {
        self.tiles.get(&id)
    }

    pub fn tile_mut(&mut self, id: TileId) -> Option<&mut Tile> {
        self.tiles.get_mut(&id)
    }

    /// Every empty cell in row-major order (x outer, y inner).
    pub fn available_cells(&self) -> Vec<Position> {
        self.cells()
            .filter(|(_, tile)| tile.is_none())
            .map(|(position, _)| position)
            .collect()
    }

    /// Uniformly pick an empty cell, or `None` when the board is full.
    pub fn random_available_cell<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Position> {
        let cells = self.available_cells();
        if cells.is_empty() {
            return None;
        }
        Some(cells[rng.gen_range(0..cells.len())])
    }

    pub fn has_available_cells(&self) -> bool {
        self.cells.iter().any(Option::is_none)
    }

    /// Place `tile` at its own position, replacing whatever the cell held.
    ///
    /// Out-of-bounds tiles are kept in the arena but never placed.
    pub fn insert(&mut self, tile: Tile) -> TileId {
        let id = TileId(self.next_id);
        self.next_id += 1;
        if let Some(index) = self.index(tile.position()) {
            self.cells[index] = Some(id);
        }
        self.tiles.insert(id, tile);
        id
    }

    /// Clear the cell at the tile's current position, whatever occupies it.
    ///
    /// The tile stays resolvable through [`Grid::tile`] until released.
    pub fn remove(&mut self, id: TileId) {
        let Some(position) = self.tiles.get(&id).map(Tile::position) else {
            return;
        };
        if let Some(index) = self.index(position) {
            self.cells[index] = None;
        }
    }

    /// Move a placed tile to `target`, keeping cell and tile in sync.
    pub(crate) fn relocate(&mut self, id: TileId, target: Position) {
        self.remove(id);
        if let Some(tile) = self.tiles.get_mut(&id) {
            tile.update_position(target);
        }
        if let Some(index) = self.index(target) {
            self.cells[index] = Some(id);
        }
    }

    /// Drop arena tiles that no cell references any more.
    pub fn release_detached(&mut self) {
        let placed: HashSet<TileId> = self.cells.iter().flatten().copied().collect();
        self.tiles.retain(|id, _| placed.contains(id));
    }

    /// Row-major walk over every cell.
    pub fn cells(&self) -> impl Iterator<Item = (Position, Option<&Tile>)> + '_ {
        (0..self.size).flat_map(move |x| {
            (0..self.size).map(move |y| {
                let position = Position::new(x as i32, y as i32);
                (position, self.cell_content(position))
            })
        })
    }

    /// Row-major walk over occupied cells only.
    pub fn tiles(&self) -> impl Iterator<Item = (TileId, &Tile)> + '_ {
        self.cells
            .iter()
            .flatten()
            .filter_map(move |id| self.tiles.get(id).map(|tile| (*id, tile)))
    }

    pub(crate) fn placed_ids(&self) -> Vec<TileId> {
        self.cells.iter().flatten().copied().collect()
    }

    pub fn occupied_count(&self) -> usize {
        self.cells.iter().flatten().count()
    }

    /// Sum of all placed tile values.
    pub fn total_value(&self) -> u64 {
        self.tiles().map(|(_, tile)| u64::from(tile.value())).sum()
    }

    pub fn max_value(&self) -> Option<u32> {
        self.tiles().map(|(_, tile)| tile.value()).max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn pos(x: i32, y: i32) -> Position {
        Position::new(x, y)
    }

    #[test]
    fn rejects_out_of_range_sizes() {
        assert_eq!(Grid::new(1).unwrap_err(), GameError::InvalidBoardSize(1));
        assert!(Grid::new(2).is_ok());
        assert!(Grid::new(MAX_GRID_SIZE).is_ok());
        assert_eq!(
            Grid::new(MAX_GRID_SIZE + 1).unwrap_err(),
            GameError::InvalidBoardSize(MAX_GRID_SIZE + 1)
        );
    }

    #[test]
    fn out_of_bounds_queries_are_empty() {
        let grid = Grid::new(4).unwrap();
        for position in [pos(-1, 0), pos(0, -1), pos(4, 0), pos(0, 4), pos(i32::MAX, 2)] {
            assert!(!grid.is_in_bounds(position));
            assert!(grid.cell_content(position).is_none());
            assert!(!grid.is_occupied(position));
            assert!(!grid.is_available(position));
        }
    }

    #[test]
    fn available_cells_are_row_major() {
        let mut grid = Grid::new(2).unwrap();
        grid.insert(Tile::new(pos(0, 1)));
        assert_eq!(grid.available_cells(), vec![pos(0, 0), pos(1, 0), pos(1, 1)]);
        assert!(grid.has_available_cells());
    }

    #[test]
    fn insert_and_remove_follow_tile_position() {
        let mut grid = Grid::new(3).unwrap();
        let id = grid.insert(Tile::with_value(pos(2, 1), 8));
        assert_eq!(grid.cell_content(pos(2, 1)).map(Tile::value), Some(8));
        assert_eq!(grid.cell_id(pos(2, 1)), Some(id));

        grid.remove(id);
        assert!(grid.is_available(pos(2, 1)));
        assert!(grid.tile(id).is_some(), "removed tiles stay in the arena");

        grid.release_detached();
        assert!(grid.tile(id).is_none());
    }

    #[test]
    fn remove_clears_by_position_not_identity() {
        let mut grid = Grid::new(2).unwrap();
        let first = grid.insert(Tile::new(pos(0, 0)));
        let second = grid.insert(Tile::with_value(pos(0, 0), 4));
        assert_eq!(grid.cell_id(pos(0, 0)), Some(second));

        grid.remove(first);
        assert!(grid.cell_content(pos(0, 0)).is_none());
    }

    #[test]
    fn relocate_keeps_cell_and_tile_in_sync() {
        let mut grid = Grid::new(4).unwrap();
        let id = grid.insert(Tile::new(pos(3, 3)));
        grid.relocate(id, pos(0, 3));
        assert!(grid.is_available(pos(3, 3)));
        assert_eq!(grid.cell_id(pos(0, 3)), Some(id));
        assert_eq!(grid.tile(id).map(Tile::position), Some(pos(0, 3)));
    }

    #[test]
    fn full_board_has_no_random_cell() {
        let mut grid = Grid::new(2).unwrap();
        for (x, y) in [(0, 0), (0, 1), (1, 0), (1, 1)] {
            grid.insert(Tile::new(pos(x, y)));
        }
        let mut rng = StdRng::seed_from_u64(7);
        assert!(!grid.has_available_cells());
        assert!(grid.random_available_cell(&mut rng).is_none());
    }

    #[test]
    fn random_cell_is_always_available() {
        let mut grid = Grid::new(4).unwrap();
        grid.insert(Tile::new(pos(1, 1)));
        grid.insert(Tile::new(pos(2, 2)));
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..64 {
            let cell = grid.random_available_cell(&mut rng).unwrap();
            assert!(grid.is_available(cell));
        }
    }

    #[test]
    fn cells_iterator_is_restartable() {
        let mut grid = Grid::new(3).unwrap();
        grid.insert(Tile::with_value(pos(1, 2), 16));
        let first: Vec<_> = grid.cells().map(|(p, t)| (p, t.map(Tile::value))).collect();
        let second: Vec<_> = grid.cells().map(|(p, t)| (p, t.map(Tile::value))).collect();
        assert_eq!(first.len(), 9);
        assert_eq!(first, second);
        assert_eq!(first[5], (pos(1, 2), Some(16)));
        assert_eq!(grid.total_value(), 16);
        assert_eq!(grid.max_value(), Some(16));
    }
}
