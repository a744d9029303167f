use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::{Mutex as AsyncMutex, MutexGuard};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use super::store::ProgressStore;
use crate::config::ProgressConfig;
use crate::models::ProgressRecord;

/// Tunables for the sampling and persistence engine.
#[derive(Debug, Clone, Copy)]
pub struct ProgressSettings {
    pub save_interval: Duration,
    pub min_delta_seconds: f64,
    pub completion_threshold: f64,
}

impl From<&ProgressConfig> for ProgressSettings {
    fn from(config: &ProgressConfig) -> Self {
        Self {
            save_interval: config.save_interval(),
            min_delta_seconds: config.min_delta_seconds,
            completion_threshold: config.completion_threshold,
        }
    }
}

struct TrackerState {
    record: ProgressRecord,
    /// `watched_seconds` of the last successful write.
    last_saved_seconds: Option<f64>,
    /// Whether `completed` has reached the store.
    completed_persisted: bool,
    last_write_at: Option<Instant>,
    /// An explicit seek or restart permits the next sample to move backward.
    seek_pending: bool,
}

impl TrackerState {
    fn dirty(&self) -> bool {
        self.last_saved_seconds != Some(self.record.watched_seconds)
            || (self.record.completed && !self.completed_persisted)
    }
}

struct TrackerInner {
    store: Arc<dyn ProgressStore>,
    settings: ProgressSettings,
    state: Mutex<TrackerState>,
    /// Held while a write is in flight; at most one at a time.
    write_gate: AsyncMutex<()>,
    /// Set when a flush arrived while a write was in flight; the holder
    /// issues one more write if the record changed.
    rerun_flush: AtomicBool,
}

impl TrackerInner {
    /// Write the latest in-memory record, skipping only when the store
    /// already has it. Caller must hold the write gate.
    async fn write_locked(self: &Arc<Self>, _gate: &MutexGuard<'_, ()>) {
        loop {
            let record = {
                let state = self.state.lock().unwrap();
                if !state.dirty() {
                    trace!("Skipping write; store already has the latest record");
                    return;
                }
                state.record.clone()
            };

            match self.store.save_progress(&record).await {
                Ok(()) => {
                    debug!(
                        content_id = %record.content_id,
                        watched_seconds = record.watched_seconds,
                        "Progress saved"
                    );
                    let mut state = self.state.lock().unwrap();
                    state.last_saved_seconds = Some(record.watched_seconds);
                    state.last_write_at = Some(Instant::now());
                    state.record.last_saved_at = Some(Utc::now());
                    if record.completed {
                        state.completed_persisted = true;
                    }
                }
                Err(e) => {
                    // Never surfaces to the caller; the in-memory record
                    // stays authoritative and the next tick or flush retries
                    warn!(content_id = %record.content_id, "Progress write failed: {}", e);
                }
            }

            // A flush arrived mid-write: one more pass with the latest
            // record, on the failure path too, so the final write a flush
            // represents is never dropped
            if self.rerun_flush.swap(false, Ordering::SeqCst) {
                continue;
            }
            return;
        }
    }

    async fn write_latest(self: &Arc<Self>) {
        let gate = self.write_gate.lock().await;
        self.write_locked(&gate).await;
    }
}

/// Samples playback time, decides which position changes are worth
/// persisting, and guarantees a final write on teardown.
///
/// Owns its own timer: the save-interval tick is the scheduled retry
/// opportunity for failed or deferred writes, created with the tracker and
/// destroyed with it.
pub struct ProgressTracker {
    inner: Arc<TrackerInner>,
    interval_timer: Mutex<Option<JoinHandle<()>>>,
}

impl ProgressTracker {
    /// `initial_watched` is the resume position the page fetched before
    /// mount; it counts as already synchronized with the store.
    pub fn new(
        store: Arc<dyn ProgressStore>,
        settings: ProgressSettings,
        content_id: impl Into<String>,
        initial_watched: f64,
        total_seconds: f64,
    ) -> Self {
        let record = ProgressRecord::new(content_id, initial_watched, total_seconds);
        let inner = Arc::new(TrackerInner {
            store,
            settings,
            state: Mutex::new(TrackerState {
                last_saved_seconds: Some(record.watched_seconds),
                completed_persisted: false,
                last_write_at: Some(Instant::now()),
                seek_pending: false,
                record,
            }),
            write_gate: AsyncMutex::new(()),
            rerun_flush: AtomicBool::new(false),
        });
        Self {
            inner,
            interval_timer: Mutex::new(None),
        }
    }

    /// Start the save-interval timer. Idempotent.
    pub fn start(&self) {
        let mut timer = self.interval_timer.lock().unwrap();
        if timer.is_some() {
            return;
        }
        let inner = self.inner.clone();
        let interval = self.inner.settings.save_interval;
        *timer = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            ticker.tick().await; // first tick fires immediately
            loop {
                ticker.tick().await;
                if inner.state.lock().unwrap().dirty() {
                    inner.write_latest().await;
                }
            }
        }));
    }

    /// Accept one playback sample. The in-memory record always takes it;
    /// a persistence write is scheduled only when the save interval elapsed
    /// or the position moved at least `min_delta_seconds` since the last
    /// successful write. Returns whether a write was scheduled.
    pub async fn sample(&self, current_time: f64, duration: f64) -> bool {
        let (crossed_completion, should_write) = {
            let mut state = self.inner.state.lock().unwrap();
            if duration > 0.0 {
                state.record.total_seconds = duration;
            }
            let current = current_time.max(0.0);
            if current >= state.record.watched_seconds || state.seek_pending {
                state.record.watched_seconds = current;
                state.seek_pending = false;
            }
            // else: backward jitter without an explicit seek is dropped to
            // keep watched_seconds monotonic

            let crossed = !state.record.completed
                && state.record.total_seconds > 0.0
                && state.record.progress_percentage() >= self.inner.settings.completion_threshold;

            let interval_elapsed = state
                .last_write_at
                .is_none_or(|at| at.elapsed() >= self.inner.settings.save_interval);
            let delta = state
                .last_saved_seconds
                .map_or(f64::INFINITY, |saved| {
                    (state.record.watched_seconds - saved).abs()
                });
            let should_write = state.dirty()
                && (interval_elapsed || delta >= self.inner.settings.min_delta_seconds);
            (crossed, should_write)
        };

        if crossed_completion {
            self.mark_completed().await;
            return true;
        }

        if should_write {
            let inner = self.inner.clone();
            tokio::spawn(async move {
                inner.write_latest().await;
            });
        }
        should_write
    }

    /// Permit the next sample to move the position backward (explicit user
    /// seek or restart).
    pub fn note_seek(&self, position: f64) {
        let mut state = self.inner.state.lock().unwrap();
        state.seek_pending = true;
        state.record.watched_seconds = position.max(0.0);
    }

    /// Mark the content finished and flush immediately, bypassing the
    /// interval/delta gate. Idempotent: only the first call writes, and
    /// `completed` never reverts within this session.
    pub async fn mark_completed(&self) -> bool {
        {
            let mut state = self.inner.state.lock().unwrap();
            if state.record.completed {
                return false;
            }
            state.record.completed = true;
            info!(
                content_id = %state.record.content_id,
                watched_seconds = state.record.watched_seconds,
                "Content completed"
            );
        }
        self.inner.write_latest().await;
        true
    }

    /// Unconditional write of the current in-memory record. Never debounced.
    ///
    /// If a write is already in flight this does not block: the in-flight
    /// writer is told to run once more so the latest record still lands.
    pub async fn flush(&self) {
        match self.inner.write_gate.try_lock() {
            Ok(gate) => self.inner.write_locked(&gate).await,
            Err(_) => {
                trace!("Write in flight; scheduling follow-up flush");
                self.inner.rerun_flush.store(true, Ordering::SeqCst);
            }
        }
    }

    /// Current in-memory record — the source of truth for resuming within
    /// this session, regardless of what the store has accepted.
    pub fn record(&self) -> ProgressRecord {
        self.inner.state.lock().unwrap().record.clone()
    }

    pub fn is_completed(&self) -> bool {
        self.inner.state.lock().unwrap().record.completed
    }

    /// Stop the save-interval timer so no callback outlives the player.
    pub fn shutdown(&self) {
        if let Some(timer) = self.interval_timer.lock().unwrap().take() {
            timer.abort();
        }
    }
}

impl Drop for ProgressTracker {
    fn drop(&mut self) {
        self.shutdown();
    }
}
