use anyhow::Result;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::controls::ControlsVisibility;
use crate::error::PlayheadError;
use crate::events::{EventBus, PlaybackEvent, PlaybackEventType};
use crate::models::{ContentRecord, VideoSource};
use crate::player::{
    EmbedOptions, FullscreenHost, MediaElement, PlaybackState, PlayerController, PlayerEvent,
    PlayerHandle, PlayerState,
};
use crate::progress::{ProgressSettings, ProgressStore, ProgressTracker};

/// Page-level navigation the orchestrator triggers for episode changes.
///
/// Routing lives outside this core; auto-advance and the prev/next commands
/// call through this seam after the progress flush has completed.
#[async_trait]
pub trait Navigator: Send + Sync {
    async fn navigate_to(&self, content_id: &str) -> Result<()>;
}

/// External collaborators the orchestrator is wired to.
#[derive(Clone)]
pub struct OrchestratorDeps {
    pub store: Arc<dyn ProgressStore>,
    pub navigator: Arc<dyn Navigator>,
    pub bus: Arc<EventBus>,
    pub config: Config,
}

/// Coordinates one mounted content item: the player session, progress
/// tracking, controls visibility, and episode navigation.
///
/// Lifecycle: [`mount`](Self::mount) resolves the source and spins up the
/// player session; [`teardown`](Self::teardown) flushes progress and stops
/// every timer and task. Any transport command cancels a pending auto-advance
/// countdown.
pub struct PlaybackOrchestrator {
    content: ContentRecord,
    source: VideoSource,
    handle: PlayerHandle,
    tracker: Arc<ProgressTracker>,
    controls: Arc<Mutex<ControlsVisibility>>,
    bus: Arc<EventBus>,
    navigator: Arc<dyn Navigator>,
    countdown: Arc<Mutex<Option<JoinHandle<()>>>>,
    controller_task: JoinHandle<()>,
    wiring_task: JoinHandle<()>,
}

impl std::fmt::Debug for PlaybackOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackOrchestrator")
            .field("content", &self.content)
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

impl PlaybackOrchestrator {
    /// Resolve the content's source and start the playback session.
    ///
    /// Fails with [`PlayheadError::NoPlayableSource`] when no reference field
    /// is set; the caller renders that as a terminal state rather than
    /// retrying.
    pub async fn mount(
        content: ContentRecord,
        deps: OrchestratorDeps,
        element: Option<Arc<dyn MediaElement>>,
        fullscreen_host: Option<Arc<dyn FullscreenHost>>,
    ) -> Result<Self> {
        let source = VideoSource::resolve(&content)
            .ok_or_else(|| PlayheadError::NoPlayableSource(content.id.clone()))?;
        info!(content_id = %content.id, controllable = source.is_controllable(), "Mounting playback session");

        let options = EmbedOptions {
            autoplay: deps.config.playback.autoplay,
            start_seconds: content.resume_position_seconds,
            ..EmbedOptions::default()
        };
        let (handle, controller) = PlayerController::new(
            &source,
            element,
            fullscreen_host,
            options,
            deps.config.playback.default_volume,
        )?;
        let controller_task = tokio::spawn(controller.run());

        let tracker = Arc::new(ProgressTracker::new(
            deps.store.clone(),
            ProgressSettings::from(&deps.config.progress),
            content.id.clone(),
            content.resume_position_seconds,
            0.0,
        ));
        tracker.start();

        let controls = Arc::new(Mutex::new(ControlsVisibility::new(
            deps.config.controls.hide_delay(),
        )));
        let countdown = Arc::new(Mutex::new(None));

        let wiring = EventWiring {
            content_id: content.id.clone(),
            next_episode_id: content.next_episode_id.clone(),
            resume_position: content.resume_position_seconds,
            controllable: source.is_controllable(),
            autoplay: deps.config.playback.autoplay,
            auto_advance: deps.config.playback.auto_advance,
            advance_delay: deps.config.playback.auto_advance_delay(),
            handle: handle.clone(),
            tracker: tracker.clone(),
            controls: controls.clone(),
            bus: deps.bus.clone(),
            navigator: deps.navigator.clone(),
            countdown: countdown.clone(),
            started: false,
        };
        let wiring_task = tokio::spawn(wiring.run(handle.subscribe()));

        handle
            .load()
            .await
            .map_err(|e| PlayheadError::BackendLoadFailure(e.to_string()))?;

        Ok(Self {
            content,
            source,
            handle,
            tracker,
            controls,
            bus: deps.bus,
            navigator: deps.navigator,
            countdown,
            controller_task,
            wiring_task,
        })
    }

    pub fn content(&self) -> &ContentRecord {
        &self.content
    }

    pub fn source(&self) -> &VideoSource {
        &self.source
    }

    /// Raw backend event stream, for page code that renders playback state.
    pub fn player_events(&self) -> broadcast::Receiver<PlayerEvent> {
        self.handle.subscribe()
    }

    /// Observe controls visibility.
    pub fn controls_visibility(&self) -> watch::Receiver<bool> {
        self.controls.lock().unwrap().watch()
    }

    pub async fn state(&self) -> Result<PlaybackState> {
        self.handle.get_state().await
    }

    /// Current in-memory progress record for this session.
    pub fn progress(&self) -> crate::models::ProgressRecord {
        self.tracker.record()
    }

    pub async fn embed_url(&self) -> Result<Option<url::Url>> {
        self.handle.embed_url().await
    }

    /// Retry loading after a backend failure. State moves back through
    /// `Loading`; nothing else about the session is rebuilt.
    pub async fn reload(&self) -> Result<()> {
        self.cancel_countdown();
        self.handle
            .load()
            .await
            .map_err(|e| PlayheadError::BackendLoadFailure(e.to_string()).into())
    }

    pub async fn play(&self) -> Result<()> {
        self.cancel_countdown();
        self.handle.play().await
    }

    pub async fn pause(&self) -> Result<()> {
        self.cancel_countdown();
        self.handle.pause().await
    }

    pub async fn toggle(&self) -> Result<()> {
        self.cancel_countdown();
        self.handle.toggle().await
    }

    pub async fn seek(&self, position_seconds: f64) -> Result<()> {
        self.cancel_countdown();
        // Embeds ignore seek, so their record must not move either; for the
        // self-hosted backend the tracker must accept the backward move
        // before the next sample arrives
        if self.source.is_controllable() {
            self.tracker.note_seek(position_seconds.max(0.0));
        }
        self.handle.seek(position_seconds).await
    }

    pub async fn set_volume(&self, volume: f64) -> Result<()> {
        self.handle.set_volume(volume).await
    }

    pub async fn toggle_mute(&self) -> Result<()> {
        self.handle.toggle_mute().await
    }

    pub async fn change_quality(&self, quality_url: impl Into<String>) -> Result<()> {
        self.cancel_countdown();
        self.handle.change_quality(quality_url).await
    }

    pub async fn request_fullscreen(&self) -> Result<()> {
        self.handle.request_fullscreen().await
    }

    pub async fn exit_fullscreen(&self) -> Result<()> {
        self.handle.exit_fullscreen().await
    }

    /// Pointer activity over the player surface.
    pub fn register_activity(&self) {
        self.controls.lock().unwrap().register_activity();
    }

    /// Navigate to the previous episode, flushing progress first.
    pub async fn previous_episode(&self) -> Result<()> {
        self.navigate(self.content.previous_episode_id.clone()).await
    }

    /// Navigate to the next episode, flushing progress first.
    pub async fn next_episode(&self) -> Result<()> {
        self.navigate(self.content.next_episode_id.clone()).await
    }

    async fn navigate(&self, target: Option<String>) -> Result<()> {
        self.cancel_countdown();
        let Some(target) = target else {
            debug!(content_id = %self.content.id, "No adjacent episode; staying put");
            return Ok(());
        };
        // The write must land before the page unloads this session
        self.tracker.flush().await;
        self.navigator.navigate_to(&target).await
    }

    /// Best-effort flush for page-hide and unload notifications. The session
    /// stays mounted.
    pub async fn on_unload(&self) {
        self.tracker.flush().await;
    }

    /// Flush progress and stop every task and timer owned by this session.
    pub async fn teardown(self) {
        debug!(content_id = %self.content.id, "Tearing down playback session");
        self.cancel_countdown();
        self.wiring_task.abort();
        self.controller_task.abort();

        self.tracker.flush().await;
        self.tracker.shutdown();
        self.controls.lock().unwrap().shutdown();

        let record = self.tracker.record();
        self.bus.publish(
            PlaybackEvent::new(PlaybackEventType::Stopped, &self.content.id)
                .with_position(record.watched_seconds, record.total_seconds),
        );
    }

    fn cancel_countdown(&self) {
        if let Some(task) = self.countdown.lock().unwrap().take() {
            debug!("Auto-advance countdown cancelled");
            task.abort();
        }
    }
}

/// Task that applies backend telemetry to the tracker, controls, and bus.
struct EventWiring {
    content_id: String,
    next_episode_id: Option<String>,
    resume_position: f64,
    controllable: bool,
    autoplay: bool,
    auto_advance: bool,
    advance_delay: Duration,
    handle: PlayerHandle,
    tracker: Arc<ProgressTracker>,
    controls: Arc<Mutex<ControlsVisibility>>,
    bus: Arc<EventBus>,
    navigator: Arc<dyn Navigator>,
    countdown: Arc<Mutex<Option<JoinHandle<()>>>>,
    started: bool,
}

impl EventWiring {
    async fn run(mut self, mut events: broadcast::Receiver<PlayerEvent>) {
        loop {
            match events.recv().await {
                Ok(event) => self.handle_event(event).await,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("Playback event wiring lagged by {} events", n);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }

    async fn handle_event(&mut self, event: PlayerEvent) {
        match event {
            PlayerEvent::Ready { duration } => {
                if self.controllable {
                    if self.resume_position > 0.0 && self.resume_position < duration {
                        debug!(position = self.resume_position, "Resuming from saved position");
                        if let Err(e) = self.handle.seek(self.resume_position).await {
                            warn!("Failed to seek to resume position: {}", e);
                        }
                    }
                    if self.autoplay
                        && let Err(e) = self.handle.play().await
                    {
                        warn!("Autoplay failed: {}", e);
                    }
                }
            }
            PlayerEvent::PlayStateChanged { playing } => {
                let status = if playing {
                    PlayerState::Playing
                } else {
                    PlayerState::Paused
                };
                self.controls.lock().unwrap().on_status_changed(&status);
                if let Some(task) = self.countdown.lock().unwrap().take() {
                    task.abort();
                }
                let event_type = match (playing, self.started) {
                    (true, false) => {
                        self.started = true;
                        PlaybackEventType::Started
                    }
                    (true, true) => PlaybackEventType::Resumed,
                    (false, _) => PlaybackEventType::Paused,
                };
                self.bus
                    .publish(PlaybackEvent::new(event_type, &self.content_id));
            }
            PlayerEvent::TimeUpdate { position, duration } => {
                let was_completed = self.tracker.is_completed();
                let wrote = self.tracker.sample(position, duration).await;
                if !was_completed && self.tracker.is_completed() {
                    self.bus.publish(
                        PlaybackEvent::new(PlaybackEventType::Completed, &self.content_id)
                            .with_position(position, duration),
                    );
                } else if wrote {
                    self.bus.publish(
                        PlaybackEvent::new(PlaybackEventType::PositionSaved, &self.content_id)
                            .with_position(position, duration),
                    );
                }
            }
            PlayerEvent::Buffering(buffering) => {
                let status = if buffering {
                    PlayerState::Buffering
                } else {
                    PlayerState::Playing
                };
                self.controls.lock().unwrap().on_status_changed(&status);
                if buffering {
                    self.bus
                        .publish(PlaybackEvent::new(PlaybackEventType::Buffering, &self.content_id));
                }
            }
            PlayerEvent::Seeked { position } => {
                self.tracker.note_seek(position);
            }
            PlayerEvent::Ended => {
                self.controls
                    .lock()
                    .unwrap()
                    .on_status_changed(&PlayerState::Ended);
                let record = self.tracker.record();
                if self.tracker.mark_completed().await {
                    self.bus.publish(
                        PlaybackEvent::new(PlaybackEventType::Completed, &self.content_id)
                            .with_position(record.watched_seconds, record.total_seconds),
                    );
                }
                self.start_countdown();
            }
            PlayerEvent::FullscreenChanged(_) => {}
            PlayerEvent::Error(message) => {
                warn!(content_id = %self.content_id, "Playback error: {}", message);
                self.controls
                    .lock()
                    .unwrap()
                    .on_status_changed(&PlayerState::Error(message.clone()));
                self.bus.publish(
                    PlaybackEvent::new(PlaybackEventType::Errored, &self.content_id)
                        .with_metadata("message", serde_json::Value::String(message)),
                );
            }
        }
    }

    /// Arm the auto-advance countdown if there is a next episode.
    ///
    /// The flush happens inside the countdown task, after the final tick and
    /// before navigation, so the completed record is persisted even if the
    /// destination page never loads.
    fn start_countdown(&self) {
        if !self.auto_advance {
            return;
        }
        let Some(next_id) = self.next_episode_id.clone() else {
            debug!(content_id = %self.content_id, "Last episode; no auto-advance");
            return;
        };

        let content_id = self.content_id.clone();
        let bus = self.bus.clone();
        let tracker = self.tracker.clone();
        let navigator = self.navigator.clone();
        let secs = self.advance_delay.as_secs().max(1);

        info!(next = %next_id, delay_secs = secs, "Auto-advance countdown started");
        let task = tokio::spawn(async move {
            for remaining in (1..=secs).rev() {
                bus.publish(
                    PlaybackEvent::new(PlaybackEventType::CountdownTick, &content_id)
                        .with_metadata("seconds_remaining", serde_json::json!(remaining)),
                );
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
            tracker.flush().await;
            if let Err(e) = navigator.navigate_to(&next_id).await {
                warn!("Auto-advance navigation failed: {}", e);
            }
        });

        let mut countdown = self.countdown.lock().unwrap();
        if let Some(old) = countdown.replace(task) {
            old.abort();
        }
    }
}
