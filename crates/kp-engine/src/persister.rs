//! Background persistence
//!
//! Writes are handed to a worker thread over a bounded queue so a slow or
//! failing store never stalls the spin path:
//! - `submit_*` never blocks; a full queue drops the write with a warning
//!   and reports [`PersistError::QueueFull`]
//! - Store errors are logged and counted, never returned to the caller
//! - Dropping the persister drains the queue and joins the worker

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Sender, TrySendError, bounded};

use crate::error::PersistError;
use crate::leaderboard::FinalScore;
use crate::session::PersistedProgress;
use crate::store::SessionStore;

/// Default queue depth
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

// ============ Jobs ============

enum PersistJob {
    Progress(PersistedProgress),
    FinalScore(FinalScore),
    /// Acknowledge once everything queued before it is written
    Flush(Sender<()>),
}

// ============ Stats ============

/// Counters for the worker
#[derive(Debug, Default)]
pub struct PersisterStats {
    /// Writes the store accepted
    pub written: AtomicU64,
    /// Writes the store rejected
    pub failed: AtomicU64,
    /// Writes dropped because the queue was full or the worker had stopped
    pub dropped: AtomicU64,
}

impl PersisterStats {
    pub fn written(&self) -> u64 {
        self.written.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

// ============ Background Persister ============

/// Fire-and-forget writer in front of a [`SessionStore`]
pub struct BackgroundPersister {
    /// Job queue (taken on drop to stop the worker)
    tx: Option<Sender<PersistJob>>,
    /// Worker handle
    worker: Option<JoinHandle<()>>,
    /// Shared counters
    stats: Arc<PersisterStats>,
}

impl BackgroundPersister {
    pub fn new(store: Arc<dyn SessionStore>) -> Result<Self, PersistError> {
        Self::with_capacity(store, DEFAULT_QUEUE_CAPACITY)
    }

    pub fn with_capacity(store: Arc<dyn SessionStore>, capacity: usize) -> Result<Self, PersistError> {
        let (tx, rx) = bounded::<PersistJob>(capacity.max(1));
        let stats = Arc::new(PersisterStats::default());
        let worker_stats = stats.clone();

        let worker = thread::Builder::new()
            .name("kp-persist".into())
            .spawn(move || {
                loop {
                    match rx.recv_timeout(Duration::from_millis(100)) {
                        Ok(job) => run_job(store.as_ref(), job, &worker_stats),
                        Err(crossbeam_channel::RecvTimeoutError::Timeout) => {
                            // Idle
                        }
                        Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                            break;
                        }
                    }
                }

                log::debug!("Persist worker exiting");
            })?;

        log::debug!("Persist worker started (queue {capacity})");

        Ok(Self {
            tx: Some(tx),
            worker: Some(worker),
            stats,
        })
    }

    /// Queue a progress write
    pub fn submit_progress(&self, progress: PersistedProgress) -> Result<(), PersistError> {
        self.submit(PersistJob::Progress(progress))
    }

    /// Queue a final score
    pub fn submit_final_score(&self, score: FinalScore) -> Result<(), PersistError> {
        self.submit(PersistJob::FinalScore(score))
    }

    /// Wait until every write queued so far has been attempted
    ///
    /// Returns `false` if the worker did not catch up within `timeout`.
    pub fn flush(&self, timeout: Duration) -> bool {
        let Some(tx) = &self.tx else {
            return false;
        };
        let (ack_tx, ack_rx) = bounded(1);
        if tx.send_timeout(PersistJob::Flush(ack_tx), timeout).is_err() {
            return false;
        }
        ack_rx.recv_timeout(timeout).is_ok()
    }

    pub fn stats(&self) -> &PersisterStats {
        &self.stats
    }

    fn submit(&self, job: PersistJob) -> Result<(), PersistError> {
        let Some(tx) = &self.tx else {
            return Err(PersistError::Stopped);
        };
        let err = match tx.try_send(job) {
            Ok(()) => return Ok(()),
            Err(TrySendError::Full(_)) => PersistError::QueueFull,
            Err(TrySendError::Disconnected(_)) => PersistError::Stopped,
        };

        self.stats.dropped.fetch_add(1, Ordering::Relaxed);
        log::warn!("{err}, write dropped");
        Err(err)
    }
}

impl Drop for BackgroundPersister {
    fn drop(&mut self) {
        // Closing the queue lets the worker drain what is left and exit
        self.tx.take();
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                log::error!("Persist worker panicked");
            }
        }
    }
}

impl std::fmt::Debug for BackgroundPersister {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackgroundPersister")
            .field("running", &self.worker.is_some())
            .field("stats", &self.stats)
            .finish()
    }
}

fn run_job(store: &dyn SessionStore, job: PersistJob, stats: &PersisterStats) {
    let result = match job {
        PersistJob::Progress(progress) => store.save_progress(&progress),
        PersistJob::FinalScore(score) => store.save_final_score(&score),
        PersistJob::Flush(ack) => {
            let _ = ack.send(());
            return;
        }
    };

    match result {
        Ok(()) => {
            stats.written.fetch_add(1, Ordering::Relaxed);
        }
        Err(e) => {
            stats.failed.fetch_add(1, Ordering::Relaxed);
            log::warn!("Persist failed: {e}");
        }
    }
}
