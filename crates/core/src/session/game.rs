use anyhow::Result;
use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::{info, warn};

use crate::{
    command::Command,
    engine::{self, Direction, Rules},
    grid::Grid,
    score::{BestScorePolicy, ScoreStore},
    tile::{Position, Tile},
};

use super::models::{MoveOutcome, Renderer, Snapshot, TileView};

/// A single game of 2048 plus its best-score bookkeeping.
///
/// Not meant for concurrent mutation; hosts serialize access.
pub struct GameSession<R = StdRng> {
    rules: Rules,
    grid: Grid,
    score: u32,
    best_score: u32,
    moves: u64,
    is_game_over: bool,
    is_win: bool,
    rng: R,
    store: Option<Box<dyn ScoreStore>>,
    policy: BestScorePolicy,
}

impl GameSession<StdRng> {
    /// Session whose spawns are reproducible from `seed`.
    pub fn seeded(rules: Rules, seed: u64) -> Result<Self> {
        Self::new(rules, StdRng::seed_from_u64(seed))
    }

    /// Session seeded from the operating system.
    pub fn from_entropy(rules: Rules) -> Result<Self> {
        Self::new(rules, StdRng::from_entropy())
    }
}

impl<R: Rng> GameSession<R> {
    /// Start a fresh game with `rules.start_tiles` random tiles.
    pub fn new(rules: Rules, rng: R) -> Result<Self> {
        rules.validate()?;
        let grid = Grid::new(rules.size)?;
        let mut session = Self::with_grid(grid, rules, rng);
        session.spawn_start_tiles();
        Ok(session)
    }

    /// Continue from an existing board; `rules.size` follows the grid.
    pub fn from_grid(grid: Grid, mut rules: Rules, rng: R) -> Result<Self> {
        rules.size = grid.size();
        rules.validate()?;
        Ok(Self::with_grid(grid, rules, rng))
    }

    fn with_grid(grid: Grid, rules: Rules, rng: R) -> Self {
        Self {
            rules,
            grid,
            score: 0,
            best_score: 0,
            moves: 0,
            is_game_over: false,
            is_win: false,
            rng,
            store: None,
            policy: BestScorePolicy::default(),
        }
    }

    /// Attach a best-score store, seeding the in-memory best from it.
    pub fn with_store(mut self, store: impl ScoreStore + 'static, policy: BestScorePolicy) -> Self {
        match store.best() {
            Ok(best) => self.best_score = best.unwrap_or(0).max(self.score),
            Err(err) => warn!("Failed to read best score: {err:#}"),
        }
        self.store = Some(Box::new(store));
        self.policy = policy;
        self
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn size(&self) -> usize {
        self.grid.size()
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn best_score(&self) -> u32 {
        self.best_score
    }

    pub fn moves(&self) -> u64 {
        self.moves
    }

    pub fn is_game_over(&self) -> bool {
        self.is_game_over
    }

    pub fn is_win(&self) -> bool {
        self.is_win
    }

    /// A won or lost game accepts no more moves.
    pub fn is_terminal(&self) -> bool {
        self.is_game_over || self.is_win
    }

    /// Replace the board with a fresh `size`×`size` one.
    pub fn new_game(&mut self, size: usize, start_tiles: usize) -> Result<()> {
        let rules = Rules {
            size,
            start_tiles,
            ..self.rules.clone()
        };
        rules.validate()?;
        self.rules = rules;
        self.reset_board()?;

        if self.policy == BestScorePolicy::ResetOnNewGame {
            self.best_score = 0;
            if let Some(store) = self.store.as_mut() {
                if let Err(err) = store.reset() {
                    warn!("Failed to reset best score: {err:#}");
                }
            }
        }
        info!(size, start_tiles, policy = ?self.policy, "New game started");
        Ok(())
    }

    /// Start over with the current size; the best score is left alone.
    pub fn restart(&mut self) -> Result<()> {
        self.reset_board()?;
        info!(size = self.rules.size, "Game restarted");
        Ok(())
    }

    fn reset_board(&mut self) -> Result<()> {
        self.grid = Grid::new(self.rules.size)?;
        self.score = 0;
        self.moves = 0;
        self.is_game_over = false;
        self.is_win = false;
        self.spawn_start_tiles();
        Ok(())
    }

    fn spawn_start_tiles(&mut self) {
        for _ in 0..self.rules.start_tiles {
            engine::spawn_random_tile(&mut self.grid, &self.rules, &mut self.rng);
        }
    }

    /// Slide every tile towards `direction`.
    pub fn apply_move(&mut self, direction: Direction) -> MoveOutcome {
        if self.is_terminal() {
            return MoveOutcome::Ignored;
        }

        let report = engine::apply_move(&mut self.grid, direction, &self.rules, &mut self.rng);
        if !report.moved {
            return MoveOutcome::NoOp;
        }

        self.moves += 1;
        if report.score_delta > 0 {
            self.score += report.score_delta;
            self.record_score();
        }
        if report.reached_win {
            self.is_win = true;
            info!(score = self.score, moves = self.moves, "Game won");
        }
        if report.game_over {
            self.is_game_over = true;
            info!(score = self.score, moves = self.moves, "Game over");
        }
        MoveOutcome::Applied(report)
    }

    fn record_score(&mut self) {
        if self.score > self.best_score {
            self.best_score = self.score;
        }
        let Some(store) = self.store.as_mut() else {
            return;
        };
        match store.offer(self.score) {
            Ok(true) => info!(best = self.score, "New best score"),
            Ok(false) => {}
            Err(err) => warn!("Failed to record best score: {err:#}"),
        }
    }

    /// Route an input command, returning a snapshot only when state changed.
    pub fn dispatch(&mut self, command: Command) -> Result<Option<Snapshot>> {
        let changed = match command {
            Command::Move(direction) => self.apply_move(direction).is_applied(),
            Command::Restart => {
                self.restart()?;
                true
            }
            Command::NewGame => {
                self.new_game(self.rules.size, self.rules.start_tiles)?;
                true
            }
        };
        Ok(changed.then(|| self.snapshot()))
    }

    /// Like [`GameSession::dispatch`], handing any snapshot to `renderer`.
    pub fn dispatch_to(&mut self, command: Command, renderer: &mut impl Renderer) -> Result<bool> {
        match self.dispatch(command)? {
            Some(snapshot) => {
                renderer.render(&snapshot);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        let tiles = self
            .grid
            .tiles()
            .map(|(id, tile)| {
                let merged_from = tile.merged_from().map(|sources| {
                    sources.map(|source| {
                        self.grid
                            .tile(source)
                            .map(origin_of)
                            .unwrap_or_else(|| tile.position())
                    })
                });
                TileView {
                    id,
                    position: tile.position(),
                    value: tile.value(),
                    previous_position: tile.previous_position(),
                    merged_from,
                    is_merged: merged_from.is_some(),
                    is_new: merged_from.is_none() && tile.previous_position().is_none(),
                }
            })
            .collect();

        Snapshot {
            size: self.grid.size(),
            tiles,
            score: self.score,
            best_score: self.best_score,
            moves: self.moves,
            is_game_over: self.is_game_over,
            is_win: self.is_win,
        }
    }
}

fn origin_of(tile: &Tile) -> Position {
    tile.previous_position().unwrap_or_else(|| tile.position())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::MemoryScoreStore;

    fn pos(x: i32, y: i32) -> Position {
        Position::new(x, y)
    }

    fn session_from(tiles: &[(i32, i32, u32)], size: usize) -> GameSession {
        let mut grid = Grid::new(size).unwrap();
        for &(x, y, value) in tiles {
            grid.insert(Tile::with_value(pos(x, y), value));
        }
        GameSession::from_grid(grid, Rules::default(), StdRng::seed_from_u64(17)).unwrap()
    }

    struct FailingStore;

    impl ScoreStore for FailingStore {
        fn best(&self) -> Result<Option<u32>> {
            Err(anyhow::anyhow!("disk unavailable"))
        }

        fn offer(&mut self, _score: u32) -> Result<bool> {
            Err(anyhow::anyhow!("disk unavailable"))
        }

        fn reset(&mut self) -> Result<()> {
            Err(anyhow::anyhow!("disk unavailable"))
        }
    }

    #[test]
    fn new_session_places_start_tiles() -> Result<()> {
        let session = GameSession::seeded(Rules::default(), 1)?;
        assert_eq!(session.grid().occupied_count(), 2);
        assert_eq!(session.score(), 0);
        assert!(!session.is_terminal());
        let snapshot = session.snapshot();
        assert!(snapshot.tiles.iter().all(|tile| tile.is_new));
        Ok(())
    }

    #[test]
    fn invalid_rules_are_rejected() {
        let rules = Rules {
            size: 1,
            ..Rules::default()
        };
        assert!(GameSession::seeded(rules, 1).is_err());
    }

    #[test]
    fn left_merge_scores_and_spawns() {
        let mut session = session_from(&[(0, 0, 2), (1, 0, 2)], 4);
        let outcome = session.apply_move(Direction::Left);
        assert!(outcome.is_applied());
        assert_eq!(session.grid().cell_content(pos(0, 0)).map(Tile::value), Some(4));
        assert_eq!(session.score(), 4);
        assert_eq!(session.grid().occupied_count(), 2);
        assert_eq!(session.grid().available_cells().len(), 14);
        assert_eq!(session.moves(), 1);

        let snapshot = session.snapshot();
        let merged = snapshot.tile_at(pos(0, 0)).unwrap();
        assert!(merged.is_merged);
        assert!(!merged.is_new);
        assert_eq!(merged.merged_from, Some([pos(1, 0), pos(0, 0)]));
        let spawned = outcome.report().and_then(|report| report.spawned).unwrap();
        assert!(snapshot.tile_at(spawned.position).unwrap().is_new);
    }

    #[test]
    fn blocked_move_changes_nothing() {
        let mut session = session_from(&[(0, 0, 2), (0, 1, 4)], 4);
        let before = session.snapshot();
        assert_eq!(session.apply_move(Direction::Left), MoveOutcome::NoOp);
        let after = session.snapshot();
        assert_eq!(after.rows(), before.rows());
        assert_eq!(after.score, before.score);
        assert_eq!(after.moves, 0);
    }

    #[test]
    fn full_board_without_moves_is_not_rechecked() {
        let mut session = session_from(&[(0, 0, 2), (1, 0, 4), (0, 1, 8), (1, 1, 16)], 2);
        for direction in Direction::ALL {
            assert_eq!(session.apply_move(direction), MoveOutcome::NoOp);
        }
        assert!(!session.grid().has_available_cells());
        assert!(!engine::tile_matches_available(session.grid()));
        assert!(!session.is_game_over());
    }

    #[test]
    fn reaching_win_value_ends_input() {
        let mut session = session_from(&[(0, 0, 1024), (1, 0, 1024)], 4);
        assert!(session.apply_move(Direction::Left).is_applied());
        assert!(session.is_win());
        assert_eq!(session.score(), 2048);

        let before = session.snapshot();
        for direction in Direction::ALL {
            assert_eq!(session.apply_move(direction), MoveOutcome::Ignored);
        }
        assert_eq!(session.snapshot(), before);
    }

    #[test]
    fn game_over_ends_input() {
        // Sliding left fills the board; whichever tile spawns, 2/4 pairs remain impossible.
        let mut session = session_from(&[(0, 0, 32), (1, 0, 64), (1, 1, 128)], 2);
        let outcome = session.apply_move(Direction::Left);
        assert!(outcome.is_applied());
        assert!(session.is_game_over());
        assert_eq!(session.apply_move(Direction::Right), MoveOutcome::Ignored);
    }

    #[test]
    fn score_increases_are_offered_to_the_store() {
        let observer = MemoryScoreStore::with_best(2);
        let mut session =
            session_from(&[(0, 0, 2), (1, 0, 2)], 4).with_store(observer.clone(), BestScorePolicy::Preserve);
        assert_eq!(session.best_score(), 2);

        session.apply_move(Direction::Left);
        assert_eq!(observer.current(), Some(4));
        assert_eq!(session.best_score(), 4);
    }

    #[test]
    fn store_failures_do_not_abort_moves() {
        let mut session =
            session_from(&[(0, 0, 2), (1, 0, 2)], 4).with_store(FailingStore, BestScorePolicy::ResetOnNewGame);
        assert!(session.apply_move(Direction::Left).is_applied());
        assert_eq!(session.score(), 4);
        assert!(session.new_game(4, 2).is_ok());
    }

    #[test]
    fn best_score_policy_applies_to_new_game_only() -> Result<()> {
        let preserved = MemoryScoreStore::with_best(500);
        let mut session = GameSession::seeded(Rules::default(), 3)?
            .with_store(preserved.clone(), BestScorePolicy::Preserve);
        session.new_game(4, 2)?;
        assert_eq!(preserved.current(), Some(500));
        assert_eq!(session.best_score(), 500);

        let resettable = MemoryScoreStore::with_best(500);
        let mut session = GameSession::seeded(Rules::default(), 3)?
            .with_store(resettable.clone(), BestScorePolicy::ResetOnNewGame);
        session.restart()?;
        assert_eq!(resettable.current(), Some(500));
        session.new_game(4, 2)?;
        assert_eq!(resettable.current(), Some(0));
        assert_eq!(session.best_score(), 0);
        Ok(())
    }

    #[test]
    fn new_game_resets_state_and_resizes() -> Result<()> {
        let mut session = session_from(&[(0, 0, 1024), (1, 0, 1024)], 4);
        session.apply_move(Direction::Left);
        assert!(session.is_win());

        session.new_game(5, 3)?;
        assert_eq!(session.size(), 5);
        assert_eq!(session.score(), 0);
        assert_eq!(session.grid().occupied_count(), 3);
        assert!(!session.is_terminal());
        assert!(session.new_game(1, 2).is_err());
        assert_eq!(session.size(), 5);
        Ok(())
    }

    #[test]
    fn renderer_only_sees_state_changes() -> Result<()> {
        let mut session = session_from(&[(0, 0, 2), (0, 1, 4)], 4);
        let mut frames: Vec<Snapshot> = Vec::new();
        let mut renderer = |snapshot: &Snapshot| frames.push(snapshot.clone());

        assert!(!session.dispatch_to(Command::Move(Direction::Left), &mut renderer)?);
        assert!(session.dispatch_to(Command::Move(Direction::Right), &mut renderer)?);
        assert!(session.dispatch_to(Command::Restart, &mut renderer)?);

        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].score, 0);
        assert_eq!(frames[1].tiles.len(), 2);
        Ok(())
    }

    #[test]
    fn equal_seeds_replay_identically() -> Result<()> {
        let mut first = GameSession::seeded(Rules::default(), 99)?;
        let mut second = GameSession::seeded(Rules::default(), 99)?;
        for direction in Direction::ALL.iter().cycle().take(40) {
            first.apply_move(*direction);
            second.apply_move(*direction);
        }
        assert_eq!(first.snapshot(), second.snapshot());
        Ok(())
    }
}
