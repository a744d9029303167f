use anyhow::Result;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use super::traits::{MediaElement, MediaElementEvent, PlayerState};
use super::types::{PlaybackState, PlayerEvent};

/// State captured before a quality switch so the new source can pick up where
/// the old one left off.
#[derive(Debug, Clone, Copy)]
struct PendingSwitch {
    position: f64,
    was_playing: bool,
}

/// Backend for self-hosted content driving a native media element.
///
/// Commands map 1:1 onto element calls; `status` is updated only from the
/// element's events, never optimistically, so the reported state cannot
/// desync from actual playback.
pub struct SelfHostedPlayer {
    element: Arc<dyn MediaElement>,
    source_url: String,
    state: PlaybackState,
    events: mpsc::UnboundedSender<PlayerEvent>,
    pending_switch: Option<PendingSwitch>,
}

impl SelfHostedPlayer {
    pub fn new(
        source_url: impl Into<String>,
        element: Arc<dyn MediaElement>,
        events: mpsc::UnboundedSender<PlayerEvent>,
        default_volume: f64,
    ) -> Self {
        Self {
            element,
            source_url: source_url.into(),
            state: PlaybackState::new(default_volume),
            events,
            pending_switch: None,
        }
    }

    /// Start (or retry) loading the current source.
    pub async fn load(&mut self) -> Result<()> {
        debug!(url = %self.source_url, "Loading self-hosted media");
        self.state.status = PlayerState::Loading;
        self.element.set_volume(self.state.volume).await?;
        self.element.set_muted(self.state.muted).await?;
        self.element.set_source(&self.source_url).await?;
        Ok(())
    }

    pub async fn play(&self) -> Result<()> {
        // Status flips when the element reports `play`
        self.element.play().await
    }

    pub async fn pause(&self) -> Result<()> {
        self.element.pause().await
    }

    pub async fn toggle(&self) -> Result<()> {
        match self.state.status {
            PlayerState::Playing | PlayerState::Buffering => self.pause().await,
            PlayerState::Paused => self.play().await,
            _ => Ok(()),
        }
    }

    /// Seek with clamping to `[0, duration]`.
    pub async fn seek(&mut self, position_seconds: f64) -> Result<()> {
        let clamped = position_seconds.clamp(0.0, self.state.duration_seconds);
        self.element.set_current_time(clamped).await?;
        self.state.current_time_seconds = clamped;
        self.emit(PlayerEvent::Seeked { position: clamped });
        Ok(())
    }

    pub async fn set_volume(&mut self, volume: f64) -> Result<()> {
        let clamped = volume.clamp(0.0, 1.0);
        self.element.set_volume(clamped).await?;
        self.state.volume = clamped;
        Ok(())
    }

    pub async fn toggle_mute(&mut self) -> Result<()> {
        let muted = !self.state.muted;
        self.element.set_muted(muted).await?;
        self.state.muted = muted;
        Ok(())
    }

    /// Switch the underlying source while preserving position and play state.
    ///
    /// Captures `(was_playing, current_time)` before the switch; once the new
    /// source reports metadata, the position is restored and playback resumed
    /// iff it was playing before.
    pub async fn change_quality(&mut self, quality_url: &str) -> Result<()> {
        if self.state.active_quality_url.as_deref() == Some(quality_url) {
            return Ok(());
        }
        let pending = PendingSwitch {
            position: self.state.current_time_seconds,
            was_playing: matches!(
                self.state.status,
                PlayerState::Playing | PlayerState::Buffering
            ),
        };
        debug!(
            url = quality_url,
            position = pending.position,
            was_playing = pending.was_playing,
            "Switching quality"
        );
        self.pending_switch = Some(pending);
        self.source_url = quality_url.to_string();
        self.state.active_quality_url = Some(quality_url.to_string());
        self.state.status = PlayerState::Loading;
        self.element.set_source(quality_url).await?;
        Ok(())
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn set_fullscreen_state(&mut self, active: bool) {
        self.state.is_fullscreen = active;
        self.emit(PlayerEvent::FullscreenChanged(active));
    }

    /// Apply one native element event to the playback state.
    ///
    /// The only place `status` is mutated outside of load/quality-switch
    /// bookkeeping.
    pub async fn handle_element_event(&mut self, event: MediaElementEvent) {
        trace!(?event, "Native element event");
        match event {
            MediaElementEvent::LoadedMetadata { duration } => {
                self.state.duration_seconds = duration.max(0.0);
                if let Some(pending) = self.pending_switch.take() {
                    if let Err(e) = self.restore_after_switch(pending).await {
                        warn!("Failed to restore playback after quality switch: {}", e);
                    }
                } else {
                    self.state.status = PlayerState::Paused;
                }
                self.emit(PlayerEvent::Ready {
                    duration: self.state.duration_seconds,
                });
            }
            MediaElementEvent::Play => {
                self.state.status = PlayerState::Playing;
                self.emit(PlayerEvent::PlayStateChanged { playing: true });
            }
            MediaElementEvent::Pause => {
                // `pause` also fires at end of stream; Ended wins
                if self.state.status != PlayerState::Ended {
                    self.state.status = PlayerState::Paused;
                    self.emit(PlayerEvent::PlayStateChanged { playing: false });
                }
            }
            MediaElementEvent::TimeUpdate { position } => {
                self.state.current_time_seconds = position.max(0.0);
                self.emit(PlayerEvent::TimeUpdate {
                    position: self.state.current_time_seconds,
                    duration: self.state.duration_seconds,
                });
            }
            MediaElementEvent::Waiting => {
                if self.state.status.is_playing() {
                    self.state.status = PlayerState::Buffering;
                    self.emit(PlayerEvent::Buffering(true));
                }
            }
            MediaElementEvent::CanPlay => {
                if self.state.status == PlayerState::Buffering {
                    self.state.status = PlayerState::Playing;
                    self.emit(PlayerEvent::Buffering(false));
                }
            }
            MediaElementEvent::Ended => {
                self.state.status = PlayerState::Ended;
                self.emit(PlayerEvent::Ended);
            }
            MediaElementEvent::Error(message) => {
                warn!("Native element reported error: {}", message);
                self.state.status = PlayerState::Error(message.clone());
                self.emit(PlayerEvent::Error(message));
            }
        }
    }

    async fn restore_after_switch(&mut self, pending: PendingSwitch) -> Result<()> {
        let position = pending.position.clamp(0.0, self.state.duration_seconds);
        self.element.set_current_time(position).await?;
        self.state.current_time_seconds = position;
        self.state.status = PlayerState::Paused;
        if pending.was_playing {
            self.element.play().await?;
        }
        Ok(())
    }

    fn emit(&self, event: PlayerEvent) {
        let _ = self.events.send(event);
    }
}
