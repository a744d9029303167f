#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::sleep;

use playhead::orchestrator::Navigator;
use playhead::player::{FullscreenHost, MediaElement, MediaElementEvent};
use playhead::progress::ProgressStore;
use playhead::{PlayheadError, PlayheadResult, ProgressRecord};

/// Shared, ordered log of store writes and navigations, for asserting that
/// flushes land before navigation.
pub type ActionLog = Arc<Mutex<Vec<String>>>;

pub fn action_log() -> ActionLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// Media element double: records commands and lets tests feed events back.
pub struct MockMediaElement {
    calls: Mutex<Vec<String>>,
    events_tx: mpsc::UnboundedSender<MediaElementEvent>,
    events_rx: Mutex<Option<mpsc::UnboundedReceiver<MediaElementEvent>>>,
}

impl MockMediaElement {
    pub fn new() -> Arc<Self> {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            events_tx,
            events_rx: Mutex::new(Some(events_rx)),
        })
    }

    /// Deliver an element event to the player, as the platform would.
    pub fn emit(&self, event: MediaElementEvent) {
        let _ = self.events_tx.send(event);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Wait until the recorded commands contain `expected`.
    pub async fn wait_for_call(&self, expected: &str, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if self.calls().iter().any(|c| c == expected) {
                return true;
            }
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            sleep(Duration::from_millis(5)).await;
        }
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl MediaElement for MockMediaElement {
    async fn set_source(&self, url: &str) -> Result<()> {
        self.record(format!("set_source:{url}"));
        Ok(())
    }

    async fn play(&self) -> Result<()> {
        self.record("play".to_string());
        Ok(())
    }

    async fn pause(&self) -> Result<()> {
        self.record("pause".to_string());
        Ok(())
    }

    async fn set_current_time(&self, seconds: f64) -> Result<()> {
        self.record(format!("set_current_time:{seconds}"));
        Ok(())
    }

    async fn set_volume(&self, volume: f64) -> Result<()> {
        self.record(format!("set_volume:{volume}"));
        Ok(())
    }

    async fn set_muted(&self, muted: bool) -> Result<()> {
        self.record(format!("set_muted:{muted}"));
        Ok(())
    }

    fn take_events(&self) -> Option<mpsc::UnboundedReceiver<MediaElementEvent>> {
        self.events_rx.lock().unwrap().take()
    }
}

/// Progress store double with error injection and an optional shared log.
pub struct MockStore {
    writes: Mutex<Vec<ProgressRecord>>,
    fail: AtomicBool,
    log: Option<ActionLog>,
}

impl Default for MockStore {
    fn default() -> Self {
        Self {
            writes: Mutex::new(Vec::new()),
            fail: AtomicBool::new(false),
            log: None,
        }
    }
}

impl MockStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_log(log: ActionLog) -> Arc<Self> {
        Arc::new(Self {
            log: Some(log),
            ..Self::default()
        })
    }

    pub fn writes(&self) -> Vec<ProgressRecord> {
        self.writes.lock().unwrap().clone()
    }

    pub fn inject_error(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    pub fn clear_error(&self) {
        self.fail.store(false, Ordering::SeqCst);
    }

    /// Wait until at least `count` writes have been accepted.
    pub async fn wait_for_writes(&self, count: usize, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if self.writes.lock().unwrap().len() >= count {
                return true;
            }
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            sleep(Duration::from_millis(5)).await;
        }
    }
}

#[async_trait]
impl ProgressStore for MockStore {
    async fn save_progress(&self, record: &ProgressRecord) -> PlayheadResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(PlayheadError::PersistenceWriteFailure(
                "injected failure".to_string(),
            ));
        }
        self.writes.lock().unwrap().push(record.clone());
        if let Some(log) = &self.log {
            log.lock()
                .unwrap()
                .push(format!("write:{}:{}", record.content_id, record.watched_seconds));
        }
        Ok(())
    }
}

/// Navigator double recording navigation targets.
pub struct MockNavigator {
    targets: Mutex<Vec<String>>,
    log: Option<ActionLog>,
}

impl Default for MockNavigator {
    fn default() -> Self {
        Self {
            targets: Mutex::new(Vec::new()),
            log: None,
        }
    }
}

impl MockNavigator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_log(log: ActionLog) -> Arc<Self> {
        Arc::new(Self {
            log: Some(log),
            ..Self::default()
        })
    }

    pub fn targets(&self) -> Vec<String> {
        self.targets.lock().unwrap().clone()
    }

    pub async fn wait_for_navigation(&self, timeout: Duration) -> Option<String> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if let Some(target) = self.targets.lock().unwrap().last().cloned() {
                return Some(target);
            }
            if tokio::time::Instant::now() >= deadline {
                return None;
            }
            sleep(Duration::from_millis(10)).await;
        }
    }
}

#[async_trait]
impl Navigator for MockNavigator {
    async fn navigate_to(&self, content_id: &str) -> Result<()> {
        self.targets.lock().unwrap().push(content_id.to_string());
        if let Some(log) = &self.log {
            log.lock().unwrap().push(format!("navigate:{content_id}"));
        }
        Ok(())
    }
}

/// Fullscreen host double; flips state only through its change stream.
pub struct MockFullscreenHost {
    calls: Mutex<Vec<String>>,
    changes_tx: mpsc::UnboundedSender<bool>,
    changes_rx: Mutex<Option<mpsc::UnboundedReceiver<bool>>>,
}

impl MockFullscreenHost {
    pub fn new() -> Arc<Self> {
        let (changes_tx, changes_rx) = mpsc::unbounded_channel();
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            changes_tx,
            changes_rx: Mutex::new(Some(changes_rx)),
        })
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Report a fullscreen change, as the platform would.
    pub fn emit_change(&self, active: bool) {
        let _ = self.changes_tx.send(active);
    }
}

#[async_trait]
impl FullscreenHost for MockFullscreenHost {
    async fn request_fullscreen(&self) -> Result<()> {
        self.calls.lock().unwrap().push("request".to_string());
        Ok(())
    }

    async fn exit_fullscreen(&self) -> Result<()> {
        self.calls.lock().unwrap().push("exit".to_string());
        Ok(())
    }

    fn take_changes(&self) -> Option<mpsc::UnboundedReceiver<bool>> {
        self.changes_rx.lock().unwrap().take()
    }
}
