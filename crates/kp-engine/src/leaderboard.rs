//! Leaderboard of finished games

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Entries kept by default
pub const DEFAULT_LEADERBOARD_CAPACITY: usize = 50;

/// Final score of one game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalScore {
    pub player: String,
    pub score: u64,
    /// Paid spins the game was played with
    pub spins: u32,
    pub recorded_at: DateTime<Utc>,
}

impl FinalScore {
    pub fn new(player: impl Into<String>, score: u64, spins: u32) -> Self {
        Self {
            player: player.into(),
            score,
            spins,
            recorded_at: Utc::now(),
        }
    }
}

/// Best scores, highest first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leaderboard {
    entries: Vec<FinalScore>,
    capacity: usize,
}

impl Leaderboard {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_LEADERBOARD_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            capacity: capacity.max(1),
        }
    }

    /// Insert a score, keeping order and capacity
    ///
    /// Returns the 0-based rank, or `None` if the score did not make the cut.
    pub fn record(&mut self, entry: FinalScore) -> Option<usize> {
        let rank = self
            .entries
            .iter()
            .position(|e| outranks(&entry, e))
            .unwrap_or(self.entries.len());

        if rank >= self.capacity {
            return None;
        }

        self.entries.insert(rank, entry);
        self.entries.truncate(self.capacity);
        Some(rank)
    }

    /// Top `n` entries
    pub fn top(&self, n: usize) -> &[FinalScore] {
        &self.entries[..n.min(self.entries.len())]
    }

    pub fn entries(&self) -> &[FinalScore] {
        &self.entries
    }

    /// Best entry of a player
    pub fn best_for(&self, player: &str) -> Option<&FinalScore> {
        self.entries.iter().find(|e| e.player == player)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Change the capacity, dropping the lowest entries that no longer fit
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        self.entries.truncate(self.capacity);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for Leaderboard {
    fn default() -> Self {
        Self::new()
    }
}

/// Higher score first; ties keep the earlier entry ahead
fn outranks(a: &FinalScore, b: &FinalScore) -> bool {
    a.score > b.score
}
