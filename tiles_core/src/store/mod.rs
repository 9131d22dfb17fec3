//! Best-effort high-score persistence.
//!
//! Records are string-keyed integers, `ft:hs:{title}:{difficulty}`. Failures
//! never reach gameplay: [`finalize_run`] logs them and carries on as if no
//! previous score existed.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use song_schema::DifficultyKey;

use crate::error::StoreError;
use crate::gameplay::events::RunEndReason;
use crate::Millis;

pub fn high_score_key(title: &str, difficulty: DifficultyKey) -> String {
    format!("ft:hs:{title}:{difficulty}")
}

pub trait HighScoreStore {
    fn get(&self, title: &str, difficulty: DifficultyKey) -> Result<Option<u64>, StoreError>;
    fn set(&self, title: &str, difficulty: DifficultyKey, score: u64) -> Result<(), StoreError>;
}

#[derive(Debug, Default)]
pub struct MemoryHighScores {
    records: Mutex<HashMap<String, u64>>,
}

impl MemoryHighScores {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HighScoreStore for MemoryHighScores {
    fn get(&self, title: &str, difficulty: DifficultyKey) -> Result<Option<u64>, StoreError> {
        Ok(self.records.lock().get(&high_score_key(title, difficulty)).copied())
    }

    fn set(&self, title: &str, difficulty: DifficultyKey, score: u64) -> Result<(), StoreError> {
        self.records.lock().insert(high_score_key(title, difficulty), score);
        Ok(())
    }
}

/// All records in one pretty-printed JSON object. A missing file is an empty store.
#[derive(Debug)]
pub struct JsonFileHighScores {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileHighScores {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, u64>, StoreError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(err) => Err(err.into()),
        }
    }
}

impl HighScoreStore for JsonFileHighScores {
    fn get(&self, title: &str, difficulty: DifficultyKey) -> Result<Option<u64>, StoreError> {
        let _guard = self.lock.lock();
        Ok(self.load()?.get(&high_score_key(title, difficulty)).copied())
    }

    fn set(&self, title: &str, difficulty: DifficultyKey, score: u64) -> Result<(), StoreError> {
        let _guard = self.lock.lock();
        let mut records = self.load()?;
        records.insert(high_score_key(title, difficulty), score);

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&records)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

/// Final numbers of an ended run, before the high-score comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub title: String,
    pub difficulty: DifficultyKey,
    pub score: u64,
    pub max_combo: u32,
    pub reason: RunEndReason,
    pub ended_at_ms: Millis,
}

/// What the result screen shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub title: String,
    pub difficulty: DifficultyKey,
    pub score: u64,
    pub max_combo: u32,
    pub reason: RunEndReason,
    pub previous_best: u64,
    pub new_high_score: bool,
}

/// Compares against the stored best and writes the new one if beaten.
pub fn finalize_run(store: &dyn HighScoreStore, result: &RunResult) -> RunSummary {
    let previous_best = match store.get(&result.title, result.difficulty) {
        Ok(best) => best.unwrap_or(0),
        Err(err) => {
            log::warn!("high score read failed for {:?}: {err}", result.title);
            0
        }
    };

    let new_high_score = result.score > previous_best;
    if new_high_score {
        match store.set(&result.title, result.difficulty, result.score) {
            Ok(()) => log::info!(
                "new high score for {} [{}]: {} (was {previous_best})",
                result.title,
                result.difficulty,
                result.score
            ),
            Err(err) => log::warn!("high score write failed for {:?}: {err}", result.title),
        }
    }

    RunSummary {
        title: result.title.clone(),
        difficulty: result.difficulty,
        score: result.score,
        max_combo: result.max_combo,
        reason: result.reason,
        previous_best,
        new_high_score,
    }
}
