//! Event Publication Gateway
//!
//! Fire-and-forget publication of domain events to downstream consumers.
//! Emission always happens after the durable write; the engine never
//! blocks on, retries, or observes delivery. Consumers are expected to be
//! at-least-once, idempotent-by-version processors.

use shared::events::RestaurantEvent;
use tokio::sync::broadcast;

const DEFAULT_CAPACITY: usize = 256;

/// Broadcast-backed publisher. Cheap to clone; all clones share the
/// same channel.
#[derive(Clone, Debug)]
pub struct EventPublisher {
    tx: broadcast::Sender<RestaurantEvent>,
}

impl EventPublisher {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish an event. Never fails from the caller's point of view: a
    /// send error only means there is currently no subscriber.
    pub fn emit(&self, event: RestaurantEvent) {
        let subject = event.subject();
        let id = event.restaurant_id().to_string();
        match self.tx.send(event) {
            Ok(receivers) => {
                tracing::debug!(%subject, %id, receivers, "Event published");
            }
            Err(_) => {
                tracing::debug!(%subject, %id, "Event published with no subscribers");
            }
        }
    }

    /// Subscribe to the event stream (used by forwarders and tests)
    pub fn subscribe(&self) -> broadcast::Receiver<RestaurantEvent> {
        self.tx.subscribe()
    }

    /// Number of live subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::events::RestaurantDeleted;

    fn deleted_event(id: &str) -> RestaurantEvent {
        RestaurantEvent::RestaurantDeleted(RestaurantDeleted {
            id: id.to_string(),
            version: 1,
        })
    }

    #[tokio::test]
    async fn test_emit_without_subscribers_is_silent() {
        let publisher = EventPublisher::new();
        publisher.emit(deleted_event("restaurant:a"));
    }

    #[tokio::test]
    async fn test_subscribers_receive_events_in_order() {
        let publisher = EventPublisher::new();
        let mut rx = publisher.subscribe();

        publisher.emit(deleted_event("restaurant:a"));
        publisher.emit(deleted_event("restaurant:b"));

        assert_eq!(rx.recv().await.unwrap().restaurant_id(), "restaurant:a");
        assert_eq!(rx.recv().await.unwrap().restaurant_id(), "restaurant:b");
    }
}
