use tokio::sync::broadcast;

use crate::domain::ports::{SessionEvent, SessionEventPublisher};

/// Fans lifecycle events out to in-process subscribers
pub struct BroadcastEventPublisher {
    sender: broadcast::Sender<SessionEvent>,
}

impl BroadcastEventPublisher {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }
}

impl SessionEventPublisher for BroadcastEventPublisher {
    fn publish(&self, event: SessionEvent) {
        tracing::debug!(
            event = event.name(),
            camera_id = %event.camera_id(),
            "Publishing session event"
        );
        // No subscribers is not an error.
        let _ = self.sender.send(event);
    }
}
