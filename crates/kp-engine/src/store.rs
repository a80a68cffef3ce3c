//! Persistence port and stores
//!
//! The engine's in-memory session is authoritative. Stores only mirror it,
//! and every failure they report is logged and dropped by the caller.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::error::PersistError;
use crate::leaderboard::{FinalScore, Leaderboard};
use crate::session::PersistedProgress;

/// Save/load collaborator for one player's session
pub trait SessionStore: Send + Sync {
    /// Stored progress, if any
    fn load_progress(&self) -> Result<Option<PersistedProgress>, PersistError>;

    /// Mirror the counters after a spin
    fn save_progress(&self, progress: &PersistedProgress) -> Result<(), PersistError>;

    /// Record the score of a finished game
    fn save_final_score(&self, score: &FinalScore) -> Result<(), PersistError>;
}

// ============ Memory Store ============

/// In-memory store that keeps every write
#[derive(Debug, Default)]
pub struct MemoryStore {
    progress: Mutex<Option<PersistedProgress>>,
    progress_writes: Mutex<Vec<PersistedProgress>>,
    final_scores: Mutex<Vec<FinalScore>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-loaded with progress
    pub fn with_progress(progress: PersistedProgress) -> Self {
        let store = Self::new();
        *store.progress.lock() = Some(progress);
        store
    }

    /// Last saved progress
    pub fn progress(&self) -> Option<PersistedProgress> {
        *self.progress.lock()
    }

    /// Every progress write, oldest first
    pub fn progress_writes(&self) -> Vec<PersistedProgress> {
        self.progress_writes.lock().clone()
    }

    pub fn final_scores(&self) -> Vec<FinalScore> {
        self.final_scores.lock().clone()
    }
}

impl SessionStore for MemoryStore {
    fn load_progress(&self) -> Result<Option<PersistedProgress>, PersistError> {
        Ok(*self.progress.lock())
    }

    fn save_progress(&self, progress: &PersistedProgress) -> Result<(), PersistError> {
        *self.progress.lock() = Some(*progress);
        self.progress_writes.lock().push(*progress);
        Ok(())
    }

    fn save_final_score(&self, score: &FinalScore) -> Result<(), PersistError> {
        self.final_scores.lock().push(score.clone());
        Ok(())
    }
}

// ============ JSON File Store ============

/// Progress and leaderboard kept as JSON files in one directory
///
/// Layout: `<player>_progress.json` per player and a shared
/// `leaderboard.json`.
#[derive(Debug)]
pub struct JsonFileStore {
    dir: PathBuf,
    player: String,
    leaderboard_capacity: usize,
    /// Serializes leaderboard read-modify-write
    leaderboard_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>, player: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            player: player.into(),
            leaderboard_capacity: crate::leaderboard::DEFAULT_LEADERBOARD_CAPACITY,
            leaderboard_lock: Mutex::new(()),
        }
    }

    /// Builder: leaderboard size
    pub fn with_leaderboard_capacity(mut self, capacity: usize) -> Self {
        self.leaderboard_capacity = capacity;
        self
    }

    pub fn player(&self) -> &str {
        &self.player
    }

    pub fn progress_path(&self) -> PathBuf {
        self.dir
            .join(format!("{}_progress.json", sanitize_filename(&self.player)))
    }

    pub fn leaderboard_path(&self) -> PathBuf {
        self.dir.join("leaderboard.json")
    }

    /// Read the shared leaderboard (empty if missing)
    pub fn load_leaderboard(&self) -> Result<Leaderboard, PersistError> {
        let path = self.leaderboard_path();
        if !path.exists() {
            return Ok(Leaderboard::with_capacity(self.leaderboard_capacity));
        }
        let json = std::fs::read_to_string(&path)?;
        let mut board: Leaderboard = serde_json::from_str(&json)?;
        board.set_capacity(self.leaderboard_capacity);
        Ok(board)
    }

    fn write_json<T: serde::Serialize>(&self, path: &Path, value: &T) -> Result<(), PersistError> {
        std::fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(value)?;

        // Write to a sibling file first so readers never see a torn file
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }
}

impl SessionStore for JsonFileStore {
    fn load_progress(&self) -> Result<Option<PersistedProgress>, PersistError> {
        let path = self.progress_path();
        if !path.exists() {
            return Ok(None);
        }
        let json = std::fs::read_to_string(&path)?;
        let value: serde_json::Value = serde_json::from_str(&json)?;
        Ok(Some(PersistedProgress::from_value(&value)))
    }

    fn save_progress(&self, progress: &PersistedProgress) -> Result<(), PersistError> {
        self.write_json(&self.progress_path(), progress)
    }

    fn save_final_score(&self, score: &FinalScore) -> Result<(), PersistError> {
        let _lock = self.leaderboard_lock.lock();
        let mut board = self.load_leaderboard()?;
        match board.record(score.clone()) {
            Some(rank) => log::info!("{} placed #{} with {}", score.player, rank + 1, score.score),
            None => log::debug!("{} scored {} (not ranked)", score.player, score.score),
        }
        self.write_json(&self.leaderboard_path(), &board)
    }
}

/// Make a player name safe to use as a file name
fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            _ => c,
        })
        .collect();

    let mut result = sanitized.replace("..", "");
    result = result.trim_matches(|c| c == '.' || c == ' ').to_string();

    if result.is_empty() {
        result = "player".to_string();
    }

    // Player names are capped at 40 characters upstream
    if result.chars().count() > 40 {
        result = result.chars().take(40).collect();
    }

    result
}
