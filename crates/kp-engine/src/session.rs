//! Per-player session counters

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Session lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// Paid or free spins remain
    Active,
    /// Nothing left to spin until reset
    GameOver,
}

/// Mutable state of one game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    /// Paid spins remaining
    pub spins_left: u32,
    /// Banked free spins, consumed before paid spins
    pub free_spins: u32,
    /// Free spins granted so far this game
    pub free_spins_used: u32,
    /// Cumulative score, never negative
    pub score: u64,
}

impl SessionState {
    /// Fresh game
    pub fn new(max_spins: u32) -> Self {
        Self {
            spins_left: max_spins,
            free_spins: 0,
            free_spins_used: 0,
            score: 0,
        }
    }

    /// Rebuild a session from persisted counters
    ///
    /// Each field is checked on its own: a missing, negative or
    /// out-of-range `spins_left` becomes `max_spins`, a missing or negative
    /// `score` becomes 0.
    pub fn load(spins_left: Option<i64>, score: Option<i64>, max_spins: u32) -> Self {
        let spins_left = match spins_left {
            Some(n) if (0..=max_spins as i64).contains(&n) => n as u32,
            _ => max_spins,
        };
        let score = match score {
            Some(n) if n >= 0 => n as u64,
            _ => 0,
        };
        Self {
            spins_left,
            score,
            ..Self::new(max_spins)
        }
    }

    /// Rebuild from a persisted progress record
    pub fn from_progress(progress: &PersistedProgress, max_spins: u32) -> Self {
        Self::load(progress.spins_left, progress.score, max_spins)
    }

    pub fn phase(&self) -> SessionPhase {
        if self.spins_left == 0 && self.free_spins == 0 {
            SessionPhase::GameOver
        } else {
            SessionPhase::Active
        }
    }

    pub fn is_game_over(&self) -> bool {
        self.phase() == SessionPhase::GameOver
    }

    /// Spend one turn, free spins first
    ///
    /// Returns `Some(true)` for a free spin, `Some(false)` for a paid spin and
    /// `None` when the game is over.
    pub fn consume_turn(&mut self) -> Option<bool> {
        if self.free_spins > 0 {
            self.free_spins -= 1;
            Some(true)
        } else if self.spins_left > 0 {
            self.spins_left -= 1;
            Some(false)
        } else {
            None
        }
    }

    /// Add a round's points, flooring the score at zero
    pub fn apply_points(&mut self, points: i32) -> u64 {
        let next = self.score as i128 + points as i128;
        self.score = next.clamp(0, u64::MAX as i128) as u64;
        self.score
    }

    /// Grant up to `requested` free spins without exceeding `cap` per game
    ///
    /// Returns the number actually granted; the excess is dropped.
    pub fn grant_free_spins(&mut self, requested: u32, cap: u32) -> u32 {
        let budget = cap.saturating_sub(self.free_spins_used);
        let granted = requested.min(budget);
        self.free_spins += granted;
        self.free_spins_used += granted;
        granted
    }

    /// Back to a fresh game
    pub fn reset(&mut self, max_spins: u32) {
        *self = Self::new(max_spins);
    }

    /// Counters mirrored to the persistence collaborator
    pub fn progress(&self) -> PersistedProgress {
        PersistedProgress {
            spins_left: Some(self.spins_left as i64),
            score: Some(self.score as i64),
        }
    }
}

/// Persisted mirror of a session
///
/// Fields are optional because stored data may be missing or malformed;
/// [`SessionState::load`] applies the defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedProgress {
    #[serde(default)]
    pub spins_left: Option<i64>,
    #[serde(default, alias = "currentScore")]
    pub score: Option<i64>,
}

impl PersistedProgress {
    pub fn new(spins_left: i64, score: i64) -> Self {
        Self {
            spins_left: Some(spins_left),
            score: Some(score),
        }
    }

    /// Extract counters from loosely typed JSON
    ///
    /// Accepts numbers and numeric strings; anything else is treated as
    /// missing.
    pub fn from_value(value: &Value) -> Self {
        let field = |names: &[&str]| {
            names
                .iter()
                .find_map(|name| value.get(*name))
                .and_then(number_from_value)
        };
        Self {
            spins_left: field(&["spinsLeft", "spins_left"]),
            score: field(&["score", "currentScore"]),
        }
    }
}

fn number_from_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}
