/// Common types shared by player backends.
use serde::{Deserialize, Serialize};

use super::traits::PlayerState;

/// Uniform event stream emitted by every backend, whichever is active.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    /// Media metadata is available; playback can be controlled.
    Ready { duration: f64 },
    PlayStateChanged { playing: bool },
    TimeUpdate { position: f64, duration: f64 },
    Buffering(bool),
    Seeked { position: f64 },
    Ended,
    FullscreenChanged(bool),
    Error(String),
}

/// Snapshot of the engine's playback state.
///
/// Owned exclusively by the active backend; mutated only by backend event
/// callbacks or explicit commands, and reported outward as a value.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackState {
    pub status: PlayerState,
    pub current_time_seconds: f64,
    pub duration_seconds: f64,
    pub volume: f64,
    pub muted: bool,
    pub active_quality_url: Option<String>,
    pub is_fullscreen: bool,
}

impl PlaybackState {
    pub fn new(volume: f64) -> Self {
        Self {
            status: PlayerState::Idle,
            current_time_seconds: 0.0,
            duration_seconds: 0.0,
            volume: volume.clamp(0.0, 1.0),
            muted: false,
            active_quality_url: None,
            is_fullscreen: false,
        }
    }
}

/// Parameters substituted into an embedded provider's URL scheme.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmbedOptions {
    pub autoplay: bool,
    pub start_seconds: f64,
    pub loop_playback: bool,
    pub muted: bool,
}

impl Default for EmbedOptions {
    fn default() -> Self {
        Self {
            autoplay: false,
            start_seconds: 0.0,
            loop_playback: false,
            muted: false,
        }
    }
}
