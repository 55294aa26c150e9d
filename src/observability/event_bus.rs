//! Tokio broadcast event bus for admission notifications.

use crate::models::RegistryEvent;
use tokio::sync::broadcast;

/// Default buffer capacity of a new bus.
pub const DEFAULT_EVENT_BUS_CAPACITY: usize = 1024;

/// Broadcasts [`RegistryEvent`]s to every subscriber.
///
/// Publishing never blocks. A subscriber that falls more than `capacity`
/// events behind observes `RecvError::Lagged` and skips ahead.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<RegistryEvent>,
}

/// Filtered receiver that yields events matching a predicate.
pub struct FilteredReceiver<F> {
    receiver: broadcast::Receiver<RegistryEvent>,
    predicate: F,
}

impl EventBus {
    /// Creates a new event bus with the given buffer capacity.
    ///
    /// A capacity of zero is raised to one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes an event to all subscribers (best effort).
    pub fn publish(&self, event: RegistryEvent) {
        metrics::counter!("event_bus_publish_total", "type" => event.event_type()).increment(1);
        let receivers = self.sender.receiver_count();
        metrics::gauge!("event_bus_receivers").set(receivers as f64);
        match self.sender.send(event) {
            Ok(_) => {
                metrics::gauge!("event_bus_queue_depth").set(self.sender.len() as f64);
            },
            Err(_) => {
                // No live receivers.
                metrics::counter!("event_bus_publish_failed_total").increment(1);
            },
        }
    }

    /// Subscribes to the event bus.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<RegistryEvent> {
        metrics::counter!("event_bus_subscriptions_total").increment(1);
        metrics::gauge!("event_bus_receivers").set(self.sender.receiver_count() as f64);
        self.sender.subscribe()
    }

    /// Subscribes with a predicate to filter events by type or attributes.
    #[must_use]
    pub fn subscribe_filtered<F>(&self, predicate: F) -> FilteredReceiver<F>
    where
        F: Fn(&RegistryEvent) -> bool,
    {
        metrics::counter!("event_bus_subscriptions_total").increment(1);
        metrics::gauge!("event_bus_receivers").set(self.sender.receiver_count() as f64);
        FilteredReceiver {
            receiver: self.sender.subscribe(),
            predicate,
        }
    }

    /// Subscribes to events matching the provided event type
    /// (`"admitted"` or `"duplicate_detected"`).
    #[must_use]
    pub fn subscribe_event_type(
        &self,
        event_type: &'static str,
    ) -> FilteredReceiver<impl Fn(&RegistryEvent) -> bool> {
        self.subscribe_filtered(move |event| event.event_type() == event_type)
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUS_CAPACITY)
    }
}

impl<F> FilteredReceiver<F>
where
    F: Fn(&RegistryEvent) -> bool,
{
    /// Receives the next event that matches the predicate.
    ///
    /// # Errors
    ///
    /// Returns `RecvError::Closed` once every sender has been dropped.
    pub async fn recv(&mut self) -> Result<RegistryEvent, broadcast::error::RecvError> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => {
                    if (self.predicate)(&event) {
                        return Ok(event);
                    }
                },
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    metrics::counter!("event_bus_lagged_total").increment(skipped);
                },
                Err(err) => return Err(err),
            }
        }
    }

    /// Returns the next buffered matching event without waiting.
    ///
    /// # Errors
    ///
    /// Returns `TryRecvError::Empty` when nothing matching is buffered.
    pub fn try_recv(&mut self) -> Result<RegistryEvent, broadcast::error::TryRecvError> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if (self.predicate)(&event) {
                        return Ok(event);
                    }
                },
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    metrics::counter!("event_bus_lagged_total").increment(skipped);
                },
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContentFingerprint, EventMeta, MetadataFingerprint, Publisher, RecordId};

    fn admitted(id: u64) -> RegistryEvent {
        RegistryEvent::Admitted {
            meta: EventMeta::with_timestamp("test", id),
            id: RecordId::new(id),
            content_fingerprint: ContentFingerprint::from_bytes([1; 32]),
            metadata_fingerprint: MetadataFingerprint::from_bytes([2; 32]),
            publisher: Publisher::new("alice"),
            source: "Reuters".into(),
            timestamp: id,
        }
    }

    fn duplicate(existing: u64) -> RegistryEvent {
        RegistryEvent::DuplicateDetected {
            meta: EventMeta::with_timestamp("test", existing),
            existing_id: RecordId::new(existing),
            content_fingerprint: ContentFingerprint::from_bytes([1; 32]),
            attempted_publisher: Publisher::new("bob"),
        }
    }

    #[tokio::test]
    async fn test_subscribe_filtered_skips_non_matching() {
        let bus = EventBus::new(16);
        let mut filtered = bus.subscribe_event_type("admitted");

        bus.publish(duplicate(1));
        bus.publish(admitted(2));

        let event = filtered.recv().await.expect("receive event");
        assert_eq!(event.event_type(), "admitted");
        assert_eq!(event.record_id(), RecordId::new(2));
    }

    #[tokio::test]
    async fn test_subscribers_see_publish_order() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        bus.publish(admitted(1));
        bus.publish(duplicate(1));
        bus.publish(admitted(2));

        let types: Vec<_> = [
            rx.recv().await.unwrap(),
            rx.recv().await.unwrap(),
            rx.recv().await.unwrap(),
        ]
        .iter()
        .map(|e| (e.event_type(), e.record_id().get()))
        .collect();
        assert_eq!(
            types,
            vec![("admitted", 1), ("duplicate_detected", 1), ("admitted", 2)]
        );
    }

    #[test]
    fn test_publish_without_receivers_is_harmless() {
        let bus = EventBus::new(0);
        bus.publish(admitted(1));
        assert_eq!(bus.receiver_count(), 0);
    }

    #[test]
    fn test_try_recv_empty() {
        let bus = EventBus::new(4);
        let mut rx = bus.subscribe_event_type("duplicate_detected");
        bus.publish(admitted(1));
        assert!(matches!(
            rx.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }
}
