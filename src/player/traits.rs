use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Playback status of the active backend.
///
/// `Ended` is terminal for the current item; a new content id always starts
/// a fresh engine at `Idle`.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerState {
    Idle,
    Loading,
    Playing,
    Paused,
    Buffering,
    Ended,
    Error(String),
}

impl PlayerState {
    pub fn is_playing(&self) -> bool {
        matches!(self, PlayerState::Playing)
    }
}

/// Events a native media element reports back to the self-hosted backend.
///
/// These mirror the standard element events: `loadedmetadata`, `play`,
/// `pause`, `timeupdate`, `waiting`, `canplay`, `ended`, `error`.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaElementEvent {
    LoadedMetadata { duration: f64 },
    Play,
    Pause,
    TimeUpdate { position: f64 },
    Waiting,
    CanPlay,
    Ended,
    Error(String),
}

/// Control surface of a native media element.
///
/// The element is an external collaborator: the page supplies one when the
/// content resolves to a self-hosted source. The self-hosted backend never
/// updates its status optimistically; it issues these commands and waits for
/// the element's events.
#[async_trait]
pub trait MediaElement: Send + Sync {
    async fn set_source(&self, url: &str) -> Result<()>;
    async fn play(&self) -> Result<()>;
    async fn pause(&self) -> Result<()>;
    async fn set_current_time(&self, seconds: f64) -> Result<()>;
    async fn set_volume(&self, volume: f64) -> Result<()>;
    async fn set_muted(&self, muted: bool) -> Result<()>;

    /// Take the element's event stream. Yields `Some` exactly once; the
    /// controller drains it for the lifetime of the player instance.
    fn take_events(&self) -> Option<mpsc::UnboundedReceiver<MediaElementEvent>>;
}

/// Platform fullscreen API on the player's root container.
///
/// The platform can reject a request or terminate fullscreen externally, so
/// `is_fullscreen` is driven only by the change notifications, never
/// optimistically.
#[async_trait]
pub trait FullscreenHost: Send + Sync {
    async fn request_fullscreen(&self) -> Result<()>;
    async fn exit_fullscreen(&self) -> Result<()>;

    /// Take the fullscreen-change notification stream. Yields `Some` exactly
    /// once.
    fn take_changes(&self) -> Option<mpsc::UnboundedReceiver<bool>>;
}
