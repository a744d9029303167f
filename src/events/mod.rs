mod event_bus;
mod types;

pub use event_bus::{EventBus, EventFilter, EventSubscriber};
pub use types::{PlaybackEvent, PlaybackEventType};
