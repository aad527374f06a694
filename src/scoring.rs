//! Points, levels and the persisted score.
//!
//! `ScoreBoard` is the single owner of the running total. It reads the total
//! once from a `KeyValueStore` when built and writes it back on every change.
//! Level data is never stored; it is derived from the total on each read.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, warn};

/// Storage key of the total score. The value is a base-10 integer string.
pub const SCORE_KEY: &str = "subjuntivo_score";

/// Display ceiling used for the progress bar once the top level is reached.
pub const MAX_LEVEL_CEILING: u64 = 2000;

#[derive(Debug, Error)]
pub enum StoreError {
  #[error("storage I/O failed for key `{key}`: {source}")]
  Io {
    key: String,
    #[source]
    source: std::io::Error,
  },
  #[error("invalid storage key `{0}`")]
  InvalidKey(String),
}

/// Durable string key/value port. Implementations must be cheap to call from
/// the request path; values are tiny.
pub trait KeyValueStore: Send + Sync {
  fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
  fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// One file per key inside `base_dir`.
pub struct FileStore {
  base_dir: PathBuf,
}

impl FileStore {
  pub fn new(base_dir: PathBuf) -> Result<Self, StoreError> {
    fs::create_dir_all(&base_dir).map_err(|source| StoreError::Io { key: String::new(), source })?;
    Ok(Self { base_dir })
  }

  /// Platform data dir (`~/.local/share/subjuntivo` on Linux), or `./subjuntivo`.
  pub fn default_dir() -> PathBuf {
    dirs::data_dir()
      .unwrap_or_else(|| PathBuf::from("."))
      .join("subjuntivo")
  }

  fn file_path(&self, key: &str) -> Result<PathBuf, StoreError> {
    let ok = !key.is_empty()
      && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if !ok {
      return Err(StoreError::InvalidKey(key.to_string()));
    }
    Ok(self.base_dir.join(key))
  }
}

impl KeyValueStore for FileStore {
  fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
    let path = self.file_path(key)?;
    if !path.exists() {
      return Ok(None);
    }
    fs::read_to_string(&path)
      .map(Some)
      .map_err(|source| StoreError::Io { key: key.to_string(), source })
  }

  fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
    let path = self.file_path(key)?;
    let tmp_path = path.with_extension("tmp");
    let io = |source| StoreError::Io { key: key.to_string(), source };

    let mut file = fs::File::create(&tmp_path).map_err(io)?;
    file.write_all(value.as_bytes()).map_err(io)?;
    file.sync_all().map_err(io)?;
    fs::rename(&tmp_path, &path).map_err(io)?;
    Ok(())
  }
}

/// In-process store for tests and ephemeral runs.
#[derive(Default)]
pub struct MemoryStore {
  values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
  #[cfg(test)]
  pub fn with_value(key: &str, value: &str) -> Self {
    let store = Self::default();
    if let Ok(mut values) = store.values.lock() {
      values.insert(key.to_string(), value.to_string());
    }
    store
  }
}

impl KeyValueStore for MemoryStore {
  fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
    Ok(self.values.lock().ok().and_then(|v| v.get(key).cloned()))
  }

  fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
    if let Ok(mut values) = self.values.lock() {
      values.insert(key.to_string(), value.to_string());
    }
    Ok(())
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelInfo {
  pub level: u8,
  pub title: &'static str,
  pub next_threshold: u64,
}

/// Step function over fixed thresholds (inclusive lower bounds).
pub fn level_for(points: u64) -> LevelInfo {
  let (level, title, next_threshold) = match points {
    0..=99 => (1, "Novato", 100),
    100..=299 => (2, "Aprendiz", 300),
    300..=599 => (3, "Practicante", 600),
    600..=999 => (4, "Experto", 1000),
    _ => (5, "Maestro Subjuntivo", MAX_LEVEL_CEILING),
  };
  LevelInfo { level, title, next_threshold }
}

/// `min(100, 100 * points / next_threshold)`.
///
/// Level 5 has no real ceiling; its threshold stays at 2000 so the bar keeps
/// filling between 1000 and 2000 and then sits at 100.
pub fn progress_percent(points: u64) -> f64 {
  let next = level_for(points).next_threshold as f64;
  (100.0 * points as f64 / next).min(100.0)
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreSummary {
  pub points: u64,
  #[serde(flatten)]
  pub level: LevelInfo,
  pub progress_percent: f64,
}

impl ScoreSummary {
  pub fn for_points(points: u64) -> Self {
    Self { points, level: level_for(points), progress_percent: progress_percent(points) }
  }
}

pub struct ScoreBoard {
  points: u64,
  store: Box<dyn KeyValueStore>,
}

impl ScoreBoard {
  /// Read the persisted total once. Absent or unparsable values start at 0.
  pub fn open(store: Box<dyn KeyValueStore>) -> Self {
    let points = match store.get(SCORE_KEY) {
      Ok(Some(raw)) => match raw.trim().parse::<u64>() {
        Ok(p) => p,
        Err(e) => {
          warn!(target: "score", raw = %raw, error = %e, "Stored score is not an integer; starting at 0");
          0
        }
      },
      Ok(None) => 0,
      Err(e) => {
        error!(target: "score", error = %e, "Failed to read stored score; starting at 0");
        0
      }
    };
    info!(target: "score", points, level = level_for(points).level, "Score loaded");
    Self { points, store }
  }

  pub fn summary(&self) -> ScoreSummary {
    ScoreSummary::for_points(self.points)
  }

  /// Add a positive award and flush it. A zero award is a no-op.
  ///
  /// A failed write is logged and the in-memory total is kept: the round
  /// still counts for this process.
  pub fn add_points(&mut self, delta: u32) -> u64 {
    if delta == 0 {
      return self.points;
    }
    let before = level_for(self.points).level;
    self.points = self.points.saturating_add(u64::from(delta));
    if let Err(e) = self.store.set(SCORE_KEY, &self.points.to_string()) {
      error!(target: "score", error = %e, points = self.points, "Failed to persist score");
    }
    let after = level_for(self.points);
    if after.level > before {
      info!(target: "score", points = self.points, level = after.level, title = after.title, "Level up");
    }
    self.points
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::Arc;

  /// Shares one MemoryStore between the board and the test body.
  struct Shared(Arc<MemoryStore>);
  impl KeyValueStore for Shared {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
      self.0.get(key)
    }
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
      self.0.set(key, value)
    }
  }

  #[test]
  fn levels_follow_thresholds() {
    assert_eq!(level_for(0).title, "Novato");
    assert_eq!(level_for(99).level, 1);
    assert_eq!(level_for(100).title, "Aprendiz");
    assert_eq!(level_for(299).level, 2);
    assert_eq!(level_for(300).title, "Practicante");
    assert_eq!(level_for(600).title, "Experto");
    assert_eq!(level_for(999).next_threshold, 1000);
    assert_eq!(level_for(1000).title, "Maestro Subjuntivo");
    assert_eq!(level_for(u64::MAX).next_threshold, MAX_LEVEL_CEILING);
  }

  #[test]
  fn level_is_monotonic_and_progress_bounded() {
    let mut last = 1;
    for s in (0..5000u64).chain([u64::MAX / 2, u64::MAX]) {
      let l = level_for(s).level;
      assert!((1..=5).contains(&l));
      assert!(l >= last, "level dropped at {s}");
      last = l;
      let p = progress_percent(s);
      assert!((0.0..=100.0).contains(&p), "progress {p} out of range at {s}");
    }
  }

  #[test]
  fn top_level_progress_uses_fixed_ceiling() {
    assert_eq!(progress_percent(1000), 50.0);
    assert_eq!(progress_percent(1500), 75.0);
    assert_eq!(progress_percent(4000), 100.0);
    assert_eq!(progress_percent(50), 50.0);
  }

  #[test]
  fn awards_accumulate_and_persist() {
    let store = Arc::new(MemoryStore::default());
    let mut board = ScoreBoard::open(Box::new(Shared(store.clone())));
    board.add_points(10);
    board.add_points(15);
    board.add_points(15);
    assert_eq!(board.summary().points, 40);
    assert_eq!(board.summary().level.title, "Novato");
    assert_eq!(store.get(SCORE_KEY).unwrap().as_deref(), Some("40"));
  }

  #[test]
  fn zero_award_does_not_write() {
    let store = Arc::new(MemoryStore::default());
    let mut board = ScoreBoard::open(Box::new(Shared(store.clone())));
    board.add_points(0);
    assert_eq!(store.get(SCORE_KEY).unwrap(), None);
  }

  #[test]
  fn unparsable_stored_value_starts_at_zero() {
    let board = ScoreBoard::open(Box::new(MemoryStore::with_value(SCORE_KEY, "muchos")));
    assert_eq!(board.summary().points, 0);
    let board = ScoreBoard::open(Box::new(MemoryStore::with_value(SCORE_KEY, " 250\n")));
    assert_eq!(board.summary().points, 250);
    assert_eq!(board.summary().level.level, 2);
  }

  #[test]
  fn file_store_round_trips_the_score_across_boards() {
    let dir = tempfile::tempdir().unwrap();
    {
      let mut board = ScoreBoard::open(Box::new(FileStore::new(dir.path().to_path_buf()).unwrap()));
      board.add_points(25);
      board.add_points(20);
    }
    let raw = std::fs::read_to_string(dir.path().join(SCORE_KEY)).unwrap();
    assert_eq!(raw, "45");
    let board = ScoreBoard::open(Box::new(FileStore::new(dir.path().to_path_buf()).unwrap()));
    assert_eq!(board.summary().points, 45);
  }

  #[test]
  fn file_store_rejects_path_like_keys() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path().to_path_buf()).unwrap();
    assert!(matches!(store.set("../x", "1"), Err(StoreError::InvalidKey(_))));
  }
}
