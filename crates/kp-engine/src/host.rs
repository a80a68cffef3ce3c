//! Session host
//!
//! Wires a [`SpinEngine`] to a [`SessionStore`] through a
//! [`BackgroundPersister`]. The engine stays the source of truth; the store
//! only ever sees copies of its counters.
//!
//! A host may be shared between threads. Each spin or reset holds the turn
//! lock until its writes are queued, so the store sees progress in the order
//! the engine produced it.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;

use crate::config::EngineConfig;
use crate::engine::SpinEngine;
use crate::error::HostError;
use crate::leaderboard::FinalScore;
use crate::persister::{BackgroundPersister, PersisterStats};
use crate::session::SessionState;
use crate::spin::{NoOpReason, SpinOutcome};
use crate::store::SessionStore;
use crate::symbols::Symbol;

/// One player's game with persistence attached
pub struct SessionHost {
    /// Player name used for the final score
    player: String,
    /// Engine (authoritative session)
    engine: SpinEngine,
    /// Fire-and-forget writer
    persister: BackgroundPersister,
    /// Final score already submitted for the current game
    final_reported: AtomicBool,
    /// Held from the engine call until its writes are queued
    turn: Mutex<()>,
}

impl SessionHost {
    /// Load the player's progress and start the engine on it
    ///
    /// A store that fails or holds nothing yields a fresh session.
    pub fn open(
        config: EngineConfig,
        store: Arc<dyn SessionStore>,
        player: impl Into<String>,
    ) -> Result<Self, HostError> {
        let player = player.into();
        let max_spins = config.max_spins;

        let state = match store.load_progress() {
            Ok(Some(progress)) => SessionState::from_progress(&progress, max_spins),
            Ok(None) => SessionState::new(max_spins),
            Err(e) => {
                log::warn!("Could not load progress for '{player}', starting fresh: {e}");
                SessionState::new(max_spins)
            }
        };

        let engine = SpinEngine::with_state(config, state)?;
        let persister = BackgroundPersister::new(store)?;

        log::info!(
            "Session opened for '{player}': {} spins left, score {}",
            state.spins_left,
            state.score
        );

        Ok(Self {
            player,
            // A game that was already over when loaded has been reported
            final_reported: AtomicBool::new(engine.is_game_over()),
            engine,
            persister,
            turn: Mutex::new(()),
        })
    }

    pub fn player(&self) -> &str {
        &self.player
    }

    pub fn engine(&self) -> &SpinEngine {
        &self.engine
    }

    pub fn state(&self) -> SessionState {
        self.engine.state()
    }

    /// Spin and persist the outcome
    ///
    /// A spin racing another spin on the same host is a no-op.
    pub fn spin(&self) -> SpinOutcome {
        let Some(_turn) = self.turn.try_lock() else {
            return SpinOutcome::NoOp(NoOpReason::SpinInProgress);
        };
        let outcome = self.engine.spin();
        self.persist(&outcome);
        outcome
    }

    /// Spin with a fixed draw and persist the outcome
    pub fn spin_forced(&self, reels: [Symbol; 3]) -> SpinOutcome {
        let Some(_turn) = self.turn.try_lock() else {
            return SpinOutcome::NoOp(NoOpReason::SpinInProgress);
        };
        let outcome = self.engine.spin_forced(reels);
        self.persist(&outcome);
        outcome
    }

    /// Start a new game and persist the fresh counters
    pub fn reset(&self) {
        let _turn = self.turn.lock();
        self.engine.reset();
        self.final_reported.store(false, Ordering::SeqCst);
        // Drops are logged and counted by the persister
        let _ = self.persister.submit_progress(self.engine.state().progress());
    }

    /// Wait for queued writes (see [`BackgroundPersister::flush`])
    pub fn flush(&self, timeout: Duration) -> bool {
        self.persister.flush(timeout)
    }

    pub fn persist_stats(&self) -> &PersisterStats {
        self.persister.stats()
    }

    fn persist(&self, outcome: &SpinOutcome) {
        let Some(result) = outcome.result() else {
            return;
        };

        let _ = self.persister.submit_progress(result.state.progress());

        if result.ends_game()
            && self
                .final_reported
                .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
        {
            let _ = self.persister.submit_final_score(FinalScore::new(
                self.player.clone(),
                result.state.score,
                self.engine.config().max_spins,
            ));
        }
    }
}

impl std::fmt::Debug for SessionHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHost")
            .field("player", &self.player)
            .field("engine", &self.engine)
            .field("final_reported", &self.final_reported.load(Ordering::Relaxed))
            .finish()
    }
}
