use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Playback lifecycle event published on the [`EventBus`](super::EventBus).
///
/// Consumed by surrounding page code (continue-watching rails, episode lists)
/// that is outside this core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackEvent {
    pub id: String,
    pub event_type: PlaybackEventType,
    pub content_id: String,
    pub position_seconds: Option<f64>,
    pub duration_seconds: Option<f64>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub metadata: HashMap<String, serde_json::Value>,
}

impl PlaybackEvent {
    pub fn new(event_type: PlaybackEventType, content_id: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            event_type,
            content_id: content_id.into(),
            position_seconds: None,
            duration_seconds: None,
            timestamp: chrono::Utc::now(),
            metadata: HashMap::new(),
        }
    }

    pub fn with_position(mut self, position: f64, duration: f64) -> Self {
        self.position_seconds = Some(position);
        self.duration_seconds = Some(duration);
        self
    }

    pub fn with_metadata(mut self, key: &str, value: serde_json::Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PlaybackEventType {
    Started,
    Paused,
    Resumed,
    Buffering,
    PositionSaved,
    Completed,
    CountdownTick,
    Stopped,
    Errored,
}

impl PlaybackEventType {
    /// String form used for filtering and log output.
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaybackEventType::Started => "playback.started",
            PlaybackEventType::Paused => "playback.paused",
            PlaybackEventType::Resumed => "playback.resumed",
            PlaybackEventType::Buffering => "playback.buffering",
            PlaybackEventType::PositionSaved => "playback.position_saved",
            PlaybackEventType::Completed => "playback.completed",
            PlaybackEventType::CountdownTick => "playback.countdown_tick",
            PlaybackEventType::Stopped => "playback.stopped",
            PlaybackEventType::Errored => "playback.errored",
        }
    }
}
