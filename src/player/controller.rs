use anyhow::{Result, anyhow};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, trace, warn};

use super::factory::Player;
use super::traits::{FullscreenHost, MediaElement, MediaElementEvent};
use super::types::{EmbedOptions, PlaybackState, PlayerEvent};
use crate::error::PlayheadError;
use crate::models::VideoSource;

const EVENT_CAPACITY: usize = 256;

/// Commands that can be sent to the player controller.
#[derive(Debug)]
pub enum PlayerCommand {
    /// Load (or retry loading) the resolved source.
    Load {
        respond_to: oneshot::Sender<Result<()>>,
    },
    Play {
        respond_to: oneshot::Sender<Result<()>>,
    },
    Pause {
        respond_to: oneshot::Sender<Result<()>>,
    },
    Toggle {
        respond_to: oneshot::Sender<Result<()>>,
    },
    Seek {
        position_seconds: f64,
        respond_to: oneshot::Sender<Result<()>>,
    },
    SetVolume {
        volume: f64,
        respond_to: oneshot::Sender<Result<()>>,
    },
    ToggleMute {
        respond_to: oneshot::Sender<Result<()>>,
    },
    ChangeQuality {
        quality_url: String,
        respond_to: oneshot::Sender<Result<()>>,
    },
    RequestFullscreen {
        respond_to: oneshot::Sender<Result<()>>,
    },
    ExitFullscreen {
        respond_to: oneshot::Sender<Result<()>>,
    },
    GetState {
        respond_to: oneshot::Sender<PlaybackState>,
    },
    GetEmbedUrl {
        respond_to: oneshot::Sender<Option<url::Url>>,
    },
}

/// Controller that owns the active backend and processes commands.
///
/// Runs as a task: commands arrive over an mpsc channel, backend telemetry is
/// fanned out over a broadcast channel, and native element / fullscreen
/// notifications are drained in the same loop so all state mutation happens
/// in one place.
pub struct PlayerController {
    player: Player,
    receiver: mpsc::UnboundedReceiver<PlayerCommand>,
    backend_rx: mpsc::UnboundedReceiver<PlayerEvent>,
    element_rx: Option<mpsc::UnboundedReceiver<MediaElementEvent>>,
    fullscreen_rx: Option<mpsc::UnboundedReceiver<bool>>,
    fullscreen_host: Option<Arc<dyn FullscreenHost>>,
    events_tx: broadcast::Sender<PlayerEvent>,
}

impl PlayerController {
    pub fn new(
        source: &VideoSource,
        element: Option<Arc<dyn MediaElement>>,
        fullscreen_host: Option<Arc<dyn FullscreenHost>>,
        options: EmbedOptions,
        default_volume: f64,
    ) -> Result<(PlayerHandle, PlayerController)> {
        let (backend_tx, backend_rx) = mpsc::unbounded_channel();
        let element_rx = element.as_ref().and_then(|e| e.take_events());
        if matches!(source, VideoSource::SelfHosted { .. }) && element_rx.is_none() {
            return Err(anyhow!("Media element event stream already taken"));
        }
        let fullscreen_rx = fullscreen_host.as_ref().and_then(|h| h.take_changes());

        let player = Player::new(source, element, options, backend_tx, default_volume)?;
        let (sender, receiver) = mpsc::unbounded_channel();
        let (events_tx, _) = broadcast::channel(EVENT_CAPACITY);

        let controller = PlayerController {
            player,
            receiver,
            backend_rx,
            element_rx,
            fullscreen_rx,
            fullscreen_host,
            events_tx: events_tx.clone(),
        };
        let handle = PlayerHandle { sender, events_tx };

        Ok((handle, controller))
    }

    /// Run the controller event loop until every handle is dropped.
    pub async fn run(self) {
        debug!("PlayerController event loop started");

        let PlayerController {
            mut player,
            mut receiver,
            mut backend_rx,
            mut element_rx,
            mut fullscreen_rx,
            fullscreen_host,
            events_tx,
        } = self;

        loop {
            tokio::select! {
                command = receiver.recv() => match command {
                    Some(command) => {
                        handle_command(&mut player, &fullscreen_host, command).await;
                    }
                    None => break,
                },
                Some(event) = backend_rx.recv() => {
                    let _ = events_tx.send(event);
                },
                event = recv_opt(&mut element_rx) => match event {
                    Some(event) => player.handle_element_event(event).await,
                    None => element_rx = None,
                },
                change = recv_opt(&mut fullscreen_rx) => match change {
                    Some(active) => player.set_fullscreen_state(active),
                    None => fullscreen_rx = None,
                },
            }
        }

        // Drain telemetry the backend emitted while handling the last command
        while let Ok(event) = backend_rx.try_recv() {
            let _ = events_tx.send(event);
        }

        debug!("PlayerController event loop terminated");
    }
}

/// Receive from an optional channel; a missing channel never yields.
async fn recv_opt<T>(rx: &mut Option<mpsc::UnboundedReceiver<T>>) -> Option<T> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

async fn handle_command(
    player: &mut Player,
    fullscreen_host: &Option<Arc<dyn FullscreenHost>>,
    command: PlayerCommand,
) {
    match command {
        PlayerCommand::Load { respond_to } => {
            trace!("Loading media");
            let _ = respond_to.send(player.load().await);
        }
        PlayerCommand::Play { respond_to } => {
            trace!("Starting playback");
            let _ = respond_to.send(player.play().await);
        }
        PlayerCommand::Pause { respond_to } => {
            trace!("Pausing playback");
            let _ = respond_to.send(player.pause().await);
        }
        PlayerCommand::Toggle { respond_to } => {
            trace!("Toggling playback");
            let _ = respond_to.send(player.toggle().await);
        }
        PlayerCommand::Seek {
            position_seconds,
            respond_to,
        } => {
            trace!("Seeking to {}s", position_seconds);
            let _ = respond_to.send(player.seek(position_seconds).await);
        }
        PlayerCommand::SetVolume { volume, respond_to } => {
            trace!("Setting volume to {}", volume);
            let _ = respond_to.send(player.set_volume(volume).await);
        }
        PlayerCommand::ToggleMute { respond_to } => {
            trace!("Toggling mute");
            let _ = respond_to.send(player.toggle_mute().await);
        }
        PlayerCommand::ChangeQuality {
            quality_url,
            respond_to,
        } => {
            trace!("Changing quality to {}", quality_url);
            let _ = respond_to.send(player.change_quality(&quality_url).await);
        }
        PlayerCommand::RequestFullscreen { respond_to } => {
            trace!("Requesting fullscreen");
            let result = match fullscreen_host {
                // State flips only on the host's change notification
                Some(host) => host.request_fullscreen().await,
                None => {
                    warn!("No fullscreen host registered; ignoring request");
                    Ok(())
                }
            };
            let _ = respond_to.send(result);
        }
        PlayerCommand::ExitFullscreen { respond_to } => {
            trace!("Exiting fullscreen");
            let result = match fullscreen_host {
                Some(host) => host.exit_fullscreen().await,
                None => Ok(()),
            };
            let _ = respond_to.send(result);
        }
        PlayerCommand::GetState { respond_to } => {
            let _ = respond_to.send(player.state());
        }
        PlayerCommand::GetEmbedUrl { respond_to } => {
            let _ = respond_to.send(player.embed_url());
        }
    }
}

/// Handle to send commands to the player controller.
#[derive(Clone)]
pub struct PlayerHandle {
    sender: mpsc::UnboundedSender<PlayerCommand>,
    events_tx: broadcast::Sender<PlayerEvent>,
}

impl std::fmt::Debug for PlayerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerHandle").finish_non_exhaustive()
    }
}

impl PlayerHandle {
    /// Subscribe to the uniform event stream of the active backend.
    pub fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
        self.events_tx.subscribe()
    }

    pub async fn load(&self) -> Result<()> {
        self.request(|respond_to| PlayerCommand::Load { respond_to })
            .await?
    }

    pub async fn play(&self) -> Result<()> {
        self.request(|respond_to| PlayerCommand::Play { respond_to })
            .await?
    }

    pub async fn pause(&self) -> Result<()> {
        self.request(|respond_to| PlayerCommand::Pause { respond_to })
            .await?
    }

    pub async fn toggle(&self) -> Result<()> {
        self.request(|respond_to| PlayerCommand::Toggle { respond_to })
            .await?
    }

    pub async fn seek(&self, position_seconds: f64) -> Result<()> {
        self.request(|respond_to| PlayerCommand::Seek {
            position_seconds,
            respond_to,
        })
        .await?
    }

    pub async fn set_volume(&self, volume: f64) -> Result<()> {
        self.request(|respond_to| PlayerCommand::SetVolume { volume, respond_to })
            .await?
    }

    pub async fn toggle_mute(&self) -> Result<()> {
        self.request(|respond_to| PlayerCommand::ToggleMute { respond_to })
            .await?
    }

    pub async fn change_quality(&self, quality_url: impl Into<String>) -> Result<()> {
        let quality_url = quality_url.into();
        self.request(|respond_to| PlayerCommand::ChangeQuality {
            quality_url,
            respond_to,
        })
        .await?
    }

    pub async fn request_fullscreen(&self) -> Result<()> {
        self.request(|respond_to| PlayerCommand::RequestFullscreen { respond_to })
            .await?
    }

    pub async fn exit_fullscreen(&self) -> Result<()> {
        self.request(|respond_to| PlayerCommand::ExitFullscreen { respond_to })
            .await?
    }

    pub async fn get_state(&self) -> Result<PlaybackState> {
        self.request(|respond_to| PlayerCommand::GetState { respond_to })
            .await
    }

    pub async fn embed_url(&self) -> Result<Option<url::Url>> {
        self.request(|respond_to| PlayerCommand::GetEmbedUrl { respond_to })
            .await
    }

    async fn request<T>(
        &self,
        make_command: impl FnOnce(oneshot::Sender<T>) -> PlayerCommand,
    ) -> Result<T> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(make_command(respond_to))
            .map_err(|_| PlayheadError::Disconnected)?;
        Ok(response.await.map_err(|_| PlayheadError::Disconnected)?)
    }
}
