//! Spin results

use serde::{Deserialize, Serialize};

use crate::rules::{BonusTrigger, WinKind};
use crate::session::SessionState;
use crate::symbols::Symbol;

/// Outcome of one completed spin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpinResult {
    /// 1-based spin counter for this engine
    pub spin_index: u64,
    /// Drawn symbols, left to right
    pub reels: [Symbol; 3],
    /// Points awarded this spin (may be negative)
    pub points: i32,
    /// How the window scored
    pub kind: WinKind,
    /// Was this turn a free spin?
    pub was_free_spin: bool,
    /// Free-spin conditions met (empty on free spins)
    pub triggers: Vec<BonusTrigger>,
    /// Free spins actually granted after the per-game cap
    pub free_spins_awarded: u32,
    /// Session after the spin
    pub state: SessionState,
}

impl SpinResult {
    pub fn is_win(&self) -> bool {
        self.points > 0
    }

    pub fn is_loss(&self) -> bool {
        self.points < 0
    }

    /// Did this spin use the last turn?
    pub fn ends_game(&self) -> bool {
        self.state.is_game_over()
    }
}

/// Why a spin request did nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoOpReason {
    /// Another spin on the same session has not finished
    SpinInProgress,
    /// No paid or free spins left
    GameOver,
}

/// Result of a spin request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpinOutcome {
    Spun(SpinResult),
    NoOp(NoOpReason),
}

impl SpinOutcome {
    pub fn result(&self) -> Option<&SpinResult> {
        match self {
            SpinOutcome::Spun(result) => Some(result),
            SpinOutcome::NoOp(_) => None,
        }
    }

    pub fn into_result(self) -> Option<SpinResult> {
        match self {
            SpinOutcome::Spun(result) => Some(result),
            SpinOutcome::NoOp(_) => None,
        }
    }

    pub fn is_noop(&self) -> bool {
        matches!(self, SpinOutcome::NoOp(_))
    }
}
