//! Broadcast channel for sync progress events

use lubesync_domain::{SyncEvent, SyncEventStatus, SyncOperation};
use tokio::sync::broadcast;
use tracing::trace;

/// Bounded progress channel.
///
/// Publishing never blocks and never fails; a subscriber that falls behind
/// loses the oldest events and sees `RecvError::Lagged`.
#[derive(Debug, Clone)]
pub struct SyncEventBus {
    sender: broadcast::Sender<SyncEvent>,
}

impl SyncEventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.sender.subscribe()
    }

    pub fn publish(&self, event: SyncEvent) {
        trace!(
            entity_type = %event.entity_type,
            operation = %event.operation,
            status = %event.status,
            "sync_event"
        );
        // No receivers is fine.
        let _ = self.sender.send(event);
    }

    pub fn emit(
        &self,
        entity_type: &str,
        operation: SyncOperation,
        status: SyncEventStatus,
        message: Option<String>,
    ) {
        self.publish(SyncEvent::new(entity_type, operation, status, message));
    }
}
