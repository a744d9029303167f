use anyhow::{Result, anyhow};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

use super::embed::{EmbedPlayer, EmbedProvider};
use super::native::SelfHostedPlayer;
use super::traits::{MediaElement, MediaElementEvent};
use super::types::{EmbedOptions, PlaybackState, PlayerEvent};
use crate::models::VideoSource;

/// The active backend instance behind the uniform engine surface.
///
/// A closed enum rather than a trait object: the three backends are the whole
/// population, and capability gaps (no seek on embeds) are explicit no-ops in
/// the dispatch instead of silent behavioral drift.
pub enum Player {
    EmbeddedA(EmbedPlayer),
    EmbeddedB(EmbedPlayer),
    SelfHosted(SelfHostedPlayer),
}

impl Player {
    pub fn new(
        source: &VideoSource,
        element: Option<Arc<dyn MediaElement>>,
        options: EmbedOptions,
        events: mpsc::UnboundedSender<PlayerEvent>,
        default_volume: f64,
    ) -> Result<Self> {
        match source {
            VideoSource::EmbeddedProviderA { reference_id } => {
                info!("Creating embedded provider A backend");
                Ok(Player::EmbeddedA(EmbedPlayer::new(
                    EmbedProvider::A,
                    reference_id.clone(),
                    options,
                    events,
                    default_volume,
                )))
            }
            VideoSource::EmbeddedProviderB { reference_id } => {
                info!("Creating embedded provider B backend");
                Ok(Player::EmbeddedB(EmbedPlayer::new(
                    EmbedProvider::B,
                    reference_id.clone(),
                    options,
                    events,
                    default_volume,
                )))
            }
            VideoSource::SelfHosted { primary_url, .. } => {
                info!("Creating self-hosted backend");
                let element = element
                    .ok_or_else(|| anyhow!("Self-hosted source requires a media element"))?;
                Ok(Player::SelfHosted(SelfHostedPlayer::new(
                    primary_url.clone(),
                    element,
                    events,
                    default_volume,
                )))
            }
        }
    }

    pub async fn load(&mut self) -> Result<()> {
        match self {
            Player::EmbeddedA(p) | Player::EmbeddedB(p) => {
                p.load();
                Ok(())
            }
            Player::SelfHosted(p) => p.load().await,
        }
    }

    pub async fn play(&mut self) -> Result<()> {
        match self {
            Player::EmbeddedA(p) | Player::EmbeddedB(p) => {
                p.play();
                Ok(())
            }
            Player::SelfHosted(p) => p.play().await,
        }
    }

    pub async fn pause(&mut self) -> Result<()> {
        match self {
            Player::EmbeddedA(p) | Player::EmbeddedB(p) => {
                p.pause();
                Ok(())
            }
            Player::SelfHosted(p) => p.pause().await,
        }
    }

    pub async fn toggle(&mut self) -> Result<()> {
        match self {
            Player::EmbeddedA(p) | Player::EmbeddedB(p) => {
                p.toggle();
                Ok(())
            }
            Player::SelfHosted(p) => p.toggle().await,
        }
    }

    /// Seek on an embedded provider is a documented no-op, never an error.
    pub async fn seek(&mut self, position_seconds: f64) -> Result<()> {
        match self {
            Player::EmbeddedA(p) | Player::EmbeddedB(p) => {
                p.seek(position_seconds);
                Ok(())
            }
            Player::SelfHosted(p) => p.seek(position_seconds).await,
        }
    }

    pub async fn set_volume(&mut self, volume: f64) -> Result<()> {
        match self {
            Player::EmbeddedA(p) | Player::EmbeddedB(p) => {
                p.set_volume(volume);
                Ok(())
            }
            Player::SelfHosted(p) => p.set_volume(volume).await,
        }
    }

    pub async fn toggle_mute(&mut self) -> Result<()> {
        match self {
            Player::EmbeddedA(p) | Player::EmbeddedB(p) => {
                p.toggle_mute();
                Ok(())
            }
            Player::SelfHosted(p) => p.toggle_mute().await,
        }
    }

    /// Quality switching only exists for the self-hosted backend.
    pub async fn change_quality(&mut self, quality_url: &str) -> Result<()> {
        match self {
            Player::EmbeddedA(_) | Player::EmbeddedB(_) => Ok(()),
            Player::SelfHosted(p) => p.change_quality(quality_url).await,
        }
    }

    pub fn state(&self) -> PlaybackState {
        match self {
            Player::EmbeddedA(p) | Player::EmbeddedB(p) => p.state().clone(),
            Player::SelfHosted(p) => p.state().clone(),
        }
    }

    pub fn set_fullscreen_state(&mut self, active: bool) {
        match self {
            Player::EmbeddedA(p) | Player::EmbeddedB(p) => p.set_fullscreen_state(active),
            Player::SelfHosted(p) => p.set_fullscreen_state(active),
        }
    }

    /// Embed URL for the page to render; `None` for the self-hosted backend.
    pub fn embed_url(&self) -> Option<url::Url> {
        match self {
            Player::EmbeddedA(p) | Player::EmbeddedB(p) => Some(p.embed_url()),
            Player::SelfHosted(_) => None,
        }
    }

    pub async fn handle_element_event(&mut self, event: MediaElementEvent) {
        if let Player::SelfHosted(p) = self {
            p.handle_element_event(event).await;
        }
    }
}
