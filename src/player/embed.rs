use tokio::sync::mpsc;
use tracing::{debug, trace};
use url::Url;

use super::traits::PlayerState;
use super::types::{EmbedOptions, PlaybackState, PlayerEvent};

/// Which embedded provider an [`EmbedPlayer`] renders through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedProvider {
    A,
    B,
}

const PROVIDER_A_BASE: &str = "https://iframe.provider-a.example/embed/";
const PROVIDER_B_BASE: &str = "https://player.provider-b.example/v/";

/// Backend for the two embedded providers.
///
/// The embed is an opaque iframe with no inbound control channel, so play and
/// pause can only be requested: the engine flips `status` optimistically and
/// emits the corresponding event instead of waiting for confirmation. If the
/// viewer interacts with the embed's own chrome, the reported state can
/// desync; that limitation is inherent to these providers.
///
/// Seek, volume and quality commands are documented no-ops here. `muted` is
/// tracked purely as a UI affordance.
pub struct EmbedPlayer {
    provider: EmbedProvider,
    reference_id: String,
    options: EmbedOptions,
    state: PlaybackState,
    events: mpsc::UnboundedSender<PlayerEvent>,
}

impl EmbedPlayer {
    pub fn new(
        provider: EmbedProvider,
        reference_id: impl Into<String>,
        options: EmbedOptions,
        events: mpsc::UnboundedSender<PlayerEvent>,
        default_volume: f64,
    ) -> Self {
        let mut state = PlaybackState::new(default_volume);
        state.muted = options.muted;
        Self {
            provider,
            reference_id: reference_id.into(),
            options,
            state,
            events,
        }
    }

    /// Deterministic template substitution into the provider's documented
    /// embed URL scheme.
    ///
    /// The reference id is externally supplied page data; it is appended as
    /// one percent-encoded path segment, so a hostile id can neither panic
    /// here nor escape the embed path.
    pub fn embed_url(&self) -> Url {
        let base = match self.provider {
            EmbedProvider::A => PROVIDER_A_BASE,
            EmbedProvider::B => PROVIDER_B_BASE,
        };
        let mut url = Url::parse(base).expect("embed base URLs are constant and valid");
        url.path_segments_mut()
            .expect("embed base URLs have a path")
            .pop_if_empty()
            .push(&self.reference_id);

        let flag = |b: bool| if b { "1" } else { "0" };
        url.query_pairs_mut()
            .append_pair("autoplay", flag(self.options.autoplay))
            .append_pair("start", &format!("{}", self.options.start_seconds as u64))
            .append_pair("loop", flag(self.options.loop_playback))
            .append_pair("muted", flag(self.options.muted));
        url
    }

    /// Mark the embed as mounted. There is no ready callback from the iframe;
    /// duration stays 0 and the state moves straight to paused (or playing
    /// when the embed URL requested autoplay).
    pub fn load(&mut self) {
        debug!(
            provider = ?self.provider,
            reference_id = %self.reference_id,
            "Mounting embedded player"
        );
        self.state.status = if self.options.autoplay {
            PlayerState::Playing
        } else {
            PlayerState::Paused
        };
        self.emit(PlayerEvent::Ready { duration: 0.0 });
        if self.options.autoplay {
            self.emit(PlayerEvent::PlayStateChanged { playing: true });
        }
    }

    pub fn play(&mut self) {
        if self.state.status.is_playing() {
            return;
        }
        // Optimistic: the embed offers no confirmation channel
        self.state.status = PlayerState::Playing;
        self.emit(PlayerEvent::PlayStateChanged { playing: true });
    }

    pub fn pause(&mut self) {
        if !self.state.status.is_playing() {
            return;
        }
        self.state.status = PlayerState::Paused;
        self.emit(PlayerEvent::PlayStateChanged { playing: false });
    }

    pub fn toggle(&mut self) {
        if self.state.status.is_playing() {
            self.pause();
        } else {
            self.play();
        }
    }

    /// No-op: the embed exposes no seek API. Not an error.
    pub fn seek(&self, position_seconds: f64) {
        trace!(position_seconds, "Ignoring seek on embedded provider");
    }

    /// No-op: the embed exposes no volume API.
    pub fn set_volume(&self, volume: f64) {
        trace!(volume, "Ignoring volume change on embedded provider");
    }

    /// Flips the UI affordance only; the embed's actual audio is untouched.
    pub fn toggle_mute(&mut self) {
        self.state.muted = !self.state.muted;
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn set_fullscreen_state(&mut self, active: bool) {
        self.state.is_fullscreen = active;
        self.emit(PlayerEvent::FullscreenChanged(active));
    }

    fn emit(&self, event: PlayerEvent) {
        let _ = self.events.send(event);
    }
}
