mod source;

pub use source::VideoSource;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One selectable rendition of a self-hosted video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityVariant {
    pub label: String,
    pub url: String,
}

/// The content record supplied by the surrounding page before mount.
///
/// Exactly one of the three source reference fields is expected to be set;
/// when several are present the resolver picks by fixed priority, and when
/// none are present the content has no playable source.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentRecord {
    pub id: String,

    #[serde(default)]
    pub title: String,

    pub provider_a_id: Option<String>,
    pub provider_b_id: Option<String>,
    pub direct_url: Option<String>,

    #[serde(default)]
    pub quality_variants: Vec<QualityVariant>,

    pub previous_episode_id: Option<String>,
    pub next_episode_id: Option<String>,

    /// Resume position fetched by the page before mount.
    #[serde(default)]
    pub resume_position_seconds: f64,
}

/// Persisted watch-position state for one content item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub content_id: String,
    pub watched_seconds: f64,
    pub total_seconds: f64,
    pub completed: bool,
    pub last_saved_at: Option<DateTime<Utc>>,
}

impl ProgressRecord {
    pub fn new(content_id: impl Into<String>, watched_seconds: f64, total_seconds: f64) -> Self {
        Self {
            content_id: content_id.into(),
            watched_seconds: watched_seconds.max(0.0),
            total_seconds: total_seconds.max(0.0),
            completed: false,
            last_saved_at: None,
        }
    }

    pub fn progress_percentage(&self) -> f64 {
        if self.total_seconds > 0.0 {
            self.watched_seconds / self.total_seconds * 100.0
        } else {
            0.0
        }
    }
}
