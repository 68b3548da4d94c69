#![allow(missing_docs)]

//! Best-score persistence.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Directory under the user's data dir used for score files.
pub const DEFAULT_SCORE_DIR: &str = "2048tui";

/// Storage for the best score reached so far.
pub trait ScoreStore: Send {
    /// Best score recorded, or `None` when nothing was stored yet.
    fn best(&self) -> Result<Option<u32>>;

    /// Record `score` if it beats the stored best. Returns whether it did.
    fn offer(&mut self, score: u32) -> Result<bool>;

    /// Store a best score of 0.
    fn reset(&mut self) -> Result<()>;
}

/// What starting a new game does to the stored best score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BestScorePolicy {
    #[default]
    Preserve,
    ResetOnNewGame,
}

/// Serialized contents of a score file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub best: u32,
    pub board_size: usize,
    pub updated_at: DateTime<Utc>,
}

/// JSON file holding the best score for one board size.
#[derive(Debug, Clone)]
pub struct FileScoreStore {
    path: PathBuf,
    board_size: usize,
}

impl FileScoreStore {
    /// Store rooted at `root`, one file per board size.
    pub fn new(root: impl AsRef<Path>, board_size: usize) -> Self {
        let file_name = format!("best-score-{board_size}x{board_size}.json");
        Self {
            path: root.as_ref().join(file_name),
            board_size,
        }
    }

    /// Default location under the user's data directory.
    pub fn default_root() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(DEFAULT_SCORE_DIR)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored record, returning `None` if the file does not exist.
    pub fn load(&self) -> Result<Option<ScoreRecord>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read score file {}", self.path.display()))?;
        let record = serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse score file {}", self.path.display()))?;
        Ok(Some(record))
    }

    fn write(&self, best: u32) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let record = ScoreRecord {
            best,
            board_size: self.board_size,
            updated_at: Utc::now(),
        };
        let serialized =
            serde_json::to_string_pretty(&record).context("failed to serialize score record")?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("failed to write score file {}", self.path.display()))
    }
}

impl ScoreStore for FileScoreStore {
    fn best(&self) -> Result<Option<u32>> {
        Ok(self.load()?.map(|record| record.best))
    }

    fn offer(&mut self, score: u32) -> Result<bool> {
        match self.best()? {
            Some(best) if best >= score => Ok(false),
            _ => {
                self.write(score)?;
                Ok(true)
            }
        }
    }

    fn reset(&mut self) -> Result<()> {
        self.write(0)
    }
}

/// In-process store; clones share the same value.
#[derive(Debug, Clone, Default)]
pub struct MemoryScoreStore {
    best: Arc<Mutex<Option<u32>>>,
}

impl MemoryScoreStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_best(best: u32) -> Self {
        Self {
            best: Arc::new(Mutex::new(Some(best))),
        }
    }

    pub fn current(&self) -> Option<u32> {
        *self.best.lock()
    }
}

impl ScoreStore for MemoryScoreStore {
    fn best(&self) -> Result<Option<u32>> {
        Ok(self.current())
    }

    fn offer(&mut self, score: u32) -> Result<bool> {
        let mut best = self.best.lock();
        if best.map_or(true, |current| score > current) {
            *best = Some(score);
            return Ok(true);
        }
        Ok(false)
    }

    fn reset(&mut self) -> Result<()> {
        *self.best.lock() = Some(0);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn file_store_round_trip() -> Result<()> {
        let dir = tempdir()?;
        let mut store = FileScoreStore::new(dir.path().join("scores"), 4);
        assert_eq!(store.best()?, None);

        assert!(store.offer(120)?);
        assert!(store.path().exists());
        assert_eq!(store.best()?, Some(120));

        assert!(!store.offer(80)?);
        assert!(!store.offer(120)?);
        assert_eq!(store.best()?, Some(120));

        assert!(store.offer(300)?);
        let record = store.load()?.expect("expected a stored record");
        assert_eq!(record.best, 300);
        assert_eq!(record.board_size, 4);

        store.reset()?;
        assert_eq!(store.best()?, Some(0));
        Ok(())
    }

    #[test]
    fn board_sizes_use_separate_files() -> Result<()> {
        let dir = tempdir()?;
        let mut small = FileScoreStore::new(dir.path(), 3);
        let large = FileScoreStore::new(dir.path(), 5);
        small.offer(64)?;
        assert_eq!(large.best()?, None);
        assert!(small.path().ends_with("best-score-3x3.json"));
        Ok(())
    }

    #[test]
    fn corrupt_file_is_an_error() -> Result<()> {
        let dir = tempdir()?;
        let store = FileScoreStore::new(dir.path(), 4);
        fs::write(store.path(), "not json")?;
        let err = store.best().unwrap_err();
        assert!(err.to_string().contains("failed to parse score file"));
        Ok(())
    }

    #[test]
    fn memory_store_clones_share_state() -> Result<()> {
        let observer = MemoryScoreStore::new();
        let mut store = observer.clone();
        assert!(store.offer(16)?);
        assert!(!store.offer(8)?);
        assert_eq!(observer.current(), Some(16));
        store.reset()?;
        assert_eq!(observer.current(), Some(0));
        Ok(())
    }
}
