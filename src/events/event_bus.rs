use super::types::{PlaybackEvent, PlaybackEventType};
use anyhow::Result;
use tokio::sync::broadcast;
use tracing::trace;

const BUS_CAPACITY: usize = 256;

/// Broadcast bus for playback lifecycle events.
///
/// Subscribers that lag simply miss events; nothing in this core depends on
/// bus delivery for correctness.
pub struct EventBus {
    sender: broadcast::Sender<PlaybackEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(BUS_CAPACITY);
        Self { sender }
    }

    pub fn publish(&self, event: PlaybackEvent) {
        trace!(
            event = event.event_type.as_str(),
            content_id = %event.content_id,
            "Publishing playback event"
        );
        // No receivers is not an error
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> EventSubscriber {
        EventSubscriber {
            receiver: self.sender.subscribe(),
            filter: None,
        }
    }

    pub fn subscribe_filtered(&self, filter: EventFilter) -> EventSubscriber {
        EventSubscriber {
            receiver: self.sender.subscribe(),
            filter: Some(filter),
        }
    }
}

/// Event filter for selective subscription.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    event_types: Option<Vec<PlaybackEventType>>,
    content_id: Option<String>,
}

impl EventFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_types(mut self, types: Vec<PlaybackEventType>) -> Self {
        self.event_types = Some(types);
        self
    }

    pub fn with_content_id(mut self, content_id: impl Into<String>) -> Self {
        self.content_id = Some(content_id.into());
        self
    }

    pub fn matches(&self, event: &PlaybackEvent) -> bool {
        if let Some(ref types) = self.event_types
            && !types.contains(&event.event_type)
        {
            return false;
        }

        if let Some(ref content_id) = self.content_id
            && &event.content_id != content_id
        {
            return false;
        }

        true
    }
}

pub struct EventSubscriber {
    receiver: broadcast::Receiver<PlaybackEvent>,
    filter: Option<EventFilter>,
}

impl EventSubscriber {
    /// Receive the next event matching the filter.
    pub async fn recv(&mut self) -> Result<PlaybackEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => {
                    if self.filter.as_ref().is_none_or(|f| f.matches(&event)) {
                        return Ok(event);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Try to receive without blocking.
    pub fn try_recv(&mut self) -> Option<PlaybackEvent> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.filter.as_ref().is_none_or(|f| f.matches(&event)) {
                        return Some(event);
                    }
                }
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(_) => return None,
            }
        }
    }
}
