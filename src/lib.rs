//! Playback and watch-progress core for a content streaming page.
//!
//! The crate covers everything between the page's content record and its
//! persistence API: resolving which video backend applies, driving playback
//! through a uniform engine surface, tracking and rate-limiting progress
//! writes, auto-hiding transport controls, and auto-advancing between
//! episodes. Rendering, routing, and the actual store live outside and plug
//! in through the [`MediaElement`](player::MediaElement),
//! [`Navigator`](orchestrator::Navigator), and
//! [`ProgressStore`](progress::ProgressStore) seams.

pub mod config;
pub mod controls;
pub mod error;
pub mod events;
pub mod models;
pub mod orchestrator;
pub mod player;
pub mod progress;

pub use config::Config;
pub use controls::ControlsVisibility;
pub use error::{PlayheadError, PlayheadResult};
pub use events::{EventBus, EventFilter, PlaybackEvent, PlaybackEventType};
pub use models::{ContentRecord, ProgressRecord, QualityVariant, VideoSource};
pub use orchestrator::{Navigator, OrchestratorDeps, PlaybackOrchestrator};
pub use player::{
    EmbedOptions, MediaElement, MediaElementEvent, PlaybackState, PlayerEvent, PlayerHandle,
    PlayerState,
};
pub use progress::{ProgressSettings, ProgressStore, ProgressTracker};
