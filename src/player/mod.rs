pub mod controller;
pub mod embed;
pub mod factory;
pub mod native;
pub mod traits;
pub mod types;

pub use controller::{PlayerController, PlayerHandle};
pub use embed::{EmbedPlayer, EmbedProvider};
pub use factory::Player;
pub use native::SelfHostedPlayer;
pub use traits::{FullscreenHost, MediaElement, MediaElementEvent, PlayerState};
pub use types::{EmbedOptions, PlaybackState, PlayerEvent};
