//! Random tile placement.

use rand::Rng;
use serde::Serialize;
use tracing::debug;

use crate::{
    engine::Rules,
    grid::Grid,
    tile::{Position, Tile, TileId},
};

/// A tile dropped onto the board after a move or at game start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SpawnedTile {
    pub id: TileId,
    pub position: Position,
    pub value: u32,
}

/// Value of a freshly spawned tile: 2 with `rules.two_probability`, else 4.
pub fn random_tile_value<R: Rng + ?Sized>(rules: &Rules, rng: &mut R) -> u32 {
    if rng.gen::<f64>() < rules.two_probability {
        2
    } else {
        4
    }
}

/// Drop one random tile on a uniformly chosen empty cell.
///
/// Returns `None` without touching the board when it is full.
pub fn spawn_random_tile<R: Rng + ?Sized>(
    grid: &mut Grid,
    rules: &Rules,
    rng: &mut R,
) -> Option<SpawnedTile> {
    if !grid.has_available_cells() {
        return None;
    }
    let value = random_tile_value(rules, rng);
    let position = grid.random_available_cell(rng)?;
    let id = grid.insert(Tile::with_value(position, value));
    debug!(%position, value, "Tile spawned");
    Some(SpawnedTile {
        id,
        position,
        value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn spawns_onto_empty_cell() {
        let rules = Rules::default();
        let mut grid = Grid::new(4).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let spawned = spawn_random_tile(&mut grid, &rules, &mut rng).unwrap();
        assert!(matches!(spawned.value, 2 | 4));
        assert_eq!(grid.cell_id(spawned.position), Some(spawned.id));
        assert_eq!(grid.occupied_count(), 1);
    }

    #[test]
    fn full_board_spawns_nothing() {
        let rules = Rules::default();
        let mut grid = Grid::new(2).unwrap();
        for (x, y) in [(0, 0), (0, 1), (1, 0), (1, 1)] {
            grid.insert(Tile::new(Position::new(x, y)));
        }
        let mut rng = StdRng::seed_from_u64(1);
        assert!(spawn_random_tile(&mut grid, &rules, &mut rng).is_none());
        assert_eq!(grid.occupied_count(), 4);
    }

    #[test]
    fn probability_extremes_are_deterministic() {
        let mut rng = StdRng::seed_from_u64(9);
        let always_two = Rules {
            two_probability: 1.0,
            ..Rules::default()
        };
        let always_four = Rules {
            two_probability: 0.0,
            ..Rules::default()
        };
        for _ in 0..32 {
            assert_eq!(random_tile_value(&always_two, &mut rng), 2);
            assert_eq!(random_tile_value(&always_four, &mut rng), 4);
        }
    }

    #[test]
    fn default_mix_produces_both_values() {
        let rules = Rules::default();
        let mut rng = StdRng::seed_from_u64(2024);
        let values: Vec<u32> = (0..200).map(|_| random_tile_value(&rules, &mut rng)).collect();
        let twos = values.iter().filter(|v| **v == 2).count();
        assert!(twos > 100 && twos < 190, "unexpected share of twos: {twos}");
        assert!(values.contains(&4));
    }
}
