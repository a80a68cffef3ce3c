//! Spin Engine: session bookkeeping around the rule variants

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::Mutex;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::config::EngineConfig;
use crate::error::ConfigError;
use crate::session::SessionState;
use crate::spin::{NoOpReason, SpinOutcome, SpinResult};
use crate::symbols::Symbol;

/// Spin Engine
///
/// Owns one session and turns spin requests into results. Every method takes
/// `&self`, so an engine can be shared between host threads; a spin runs as
/// one atomic step and a request arriving mid-spin is a no-op.
pub struct SpinEngine {
    /// Configuration (immutable after construction)
    config: EngineConfig,
    /// Session counters
    session: Mutex<SessionState>,
    /// Random number generator
    rng: Mutex<ChaCha8Rng>,
    /// Reentrancy guard
    spinning: AtomicBool,
    /// Completed spins since construction
    spin_count: AtomicU64,
}

/// Clears the spinning flag when a spin finishes
struct SpinGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for SpinGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

impl SpinEngine {
    /// Create an engine with a fresh session
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        let state = SessionState::new(config.max_spins);
        Self::with_state(config, state)
    }

    /// Create an engine resuming a session
    pub fn with_state(config: EngineConfig, mut state: SessionState) -> Result<Self, ConfigError> {
        config.validate()?;

        state.spins_left = state.spins_left.min(config.max_spins);
        state.free_spins_used = state.free_spins_used.min(config.max_free_spins_per_game);

        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_rng(&mut rand::rng()),
        };

        log::debug!(
            "Spin engine '{}' ({:?}) ready: {:?}",
            config.name,
            config.variant,
            state
        );

        Ok(Self {
            config,
            session: Mutex::new(state),
            rng: Mutex::new(rng),
            spinning: AtomicBool::new(false),
            spin_count: AtomicU64::new(0),
        })
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // ACCESSORS
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Snapshot of the session
    pub fn state(&self) -> SessionState {
        *self.session.lock()
    }

    pub fn is_game_over(&self) -> bool {
        self.session.lock().is_game_over()
    }

    /// Is a spin running right now?
    pub fn is_spinning(&self) -> bool {
        self.spinning.load(Ordering::SeqCst)
    }

    /// Completed spins since construction
    pub fn spin_count(&self) -> u64 {
        self.spin_count.load(Ordering::Relaxed)
    }

    /// Seed RNG for reproducible results
    pub fn seed(&self, seed: u64) {
        *self.rng.lock() = ChaCha8Rng::seed_from_u64(seed);
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // SPIN EXECUTION
    // ═══════════════════════════════════════════════════════════════════════════

    /// Execute a random spin
    pub fn spin(&self) -> SpinOutcome {
        self.spin_internal(None)
    }

    /// Execute a spin with a fixed draw
    ///
    /// Turn consumption, scoring, free-spin awards and the score floor behave
    /// exactly as for [`spin`](Self::spin).
    pub fn spin_forced(&self, reels: [Symbol; 3]) -> SpinOutcome {
        self.spin_internal(Some(reels))
    }

    /// Start a new game
    pub fn reset(&self) {
        let mut session = self.session.lock();
        session.reset(self.config.max_spins);
        log::info!("Session reset to {} spins", self.config.max_spins);
    }

    fn try_begin(&self) -> Option<SpinGuard<'_>> {
        self.spinning
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| SpinGuard {
                flag: &self.spinning,
            })
    }

    fn spin_internal(&self, forced: Option<[Symbol; 3]>) -> SpinOutcome {
        let Some(_guard) = self.try_begin() else {
            log::debug!("Spin ignored: another spin is in progress");
            return SpinOutcome::NoOp(NoOpReason::SpinInProgress);
        };

        let mut session = self.session.lock();

        // The turn is spent before anything is drawn and is never refunded
        let Some(is_free_spin) = session.consume_turn() else {
            return SpinOutcome::NoOp(NoOpReason::GameOver);
        };

        let variant = self.config.variant;
        let reels = match forced {
            Some(reels) => reels,
            None => variant.draw(&self.config.weights, &mut *self.rng.lock()),
        };

        let eval = variant.evaluate(&reels, &self.config.score_table, &self.config.partial_pays);
        session.apply_points(eval.points);

        // Free spins never award further free spins
        let (triggers, free_spins_awarded) = if is_free_spin {
            (Vec::new(), 0)
        } else {
            let triggers = variant.free_spin_triggers(&reels);
            let requested: u32 = triggers.iter().map(|t| t.spins()).sum();
            let granted = if requested > 0 {
                session.grant_free_spins(requested, self.config.max_free_spins_per_game)
            } else {
                0
            };
            (triggers, granted)
        };

        let spin_index = self.spin_count.fetch_add(1, Ordering::Relaxed) + 1;
        let state = *session;

        log::debug!(
            "Spin #{spin_index}{}: {:?} -> {:+} ({:?}), score {}, spins {}, free {}",
            if is_free_spin { " (free)" } else { "" },
            reels,
            eval.points,
            eval.kind,
            state.score,
            state.spins_left,
            state.free_spins
        );
        if free_spins_awarded > 0 {
            log::debug!("Awarded {free_spins_awarded} free spin(s) from {triggers:?}");
        }
        if state.is_game_over() {
            log::info!("Game over after spin #{spin_index} with score {}", state.score);
        }

        SpinOutcome::Spun(SpinResult {
            spin_index,
            reels,
            points: eval.points,
            kind: eval.kind,
            was_free_spin: is_free_spin,
            triggers,
            free_spins_awarded,
            state,
        })
    }
}

impl std::fmt::Debug for SpinEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpinEngine")
            .field("config", &self.config.name)
            .field("variant", &self.config.variant)
            .field("state", &self.state())
            .field("spin_count", &self.spin_count())
            .finish()
    }
}
