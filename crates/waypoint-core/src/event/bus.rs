//! Broadcast event bus for distributing `RecoveryEvent` to learning consumers.
//!
//! Built on `tokio::sync::broadcast`, the `EventBus` supports multiple
//! concurrent subscribers. Publishing with no active subscribers is a no-op,
//! so a missing consumer can never fail a recovery lookup.

use tokio::sync::broadcast;
use waypoint_types::event::RecoveryEvent;

/// Multi-consumer bounded channel for recovery events.
///
/// Cloning the bus clones the sender, allowing multiple producers and
/// consumers. Slow consumers observe `Lagged` instead of blocking producers.
pub struct EventBus {
    sender: broadcast::Sender<RecoveryEvent>,
}

impl EventBus {
    /// Create a new event bus with the given channel capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero (same contract as `broadcast::channel`).
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Create a new subscriber that will receive all future events.
    pub fn subscribe(&self) -> broadcast::Receiver<RecoveryEvent> {
        self.sender.subscribe()
    }

    /// Publish an event to all current subscribers.
    ///
    /// Returns the number of subscribers that received it (0 when nobody
    /// is listening).
    pub fn publish(&self, event: RecoveryEvent) -> usize {
        let name = event.name();
        match self.sender.send(event) {
            Ok(receivers) => receivers,
            Err(_) => {
                tracing::trace!(event = name, "No subscribers for recovery event");
                0
            }
        }
    }

    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("receiver_count", &self.sender.receiver_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;
    use uuid::Uuid;
    use waypoint_types::event::{ClassificationSummary, ContextSummary};
    use waypoint_types::recovery::{ErrorCategory, RecoveryStrategyType, Severity};

    fn sample_event() -> RecoveryEvent {
        RecoveryEvent::Outcome {
            event_id: Uuid::now_v7(),
            timestamp: Utc::now(),
            strategy_type: RecoveryStrategyType::RetrySame,
            classification: ClassificationSummary {
                severity: Severity::Warning,
                category: ErrorCategory::Transient,
                security_risk: false,
            },
            context: ContextSummary {
                step_id: "s".to_string(),
                step_type: "action".to_string(),
                tier: "tier3".to_string(),
                component: "test".to_string(),
                attempt_count: 0,
            },
            success: true,
            duration_ms: 5,
            resource_cost: json!(null),
        }
    }

    #[tokio::test]
    async fn publish_and_subscribe_delivers_event() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        assert_eq!(bus.publish(sample_event()), 1);

        let received = rx.recv().await.unwrap();
        assert_eq!(received.name(), RecoveryEvent::OUTCOME);
    }

    #[tokio::test]
    async fn multiple_subscribers_each_receive_event() {
        let bus = EventBus::new(16);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        assert_eq!(bus.publish(sample_event()), 2);

        assert!(matches!(rx1.recv().await.unwrap(), RecoveryEvent::Outcome { .. }));
        assert!(matches!(rx2.recv().await.unwrap(), RecoveryEvent::Outcome { .. }));
    }

    #[test]
    fn publish_with_no_subscribers_is_noop() {
        let bus = EventBus::new(16);
        assert_eq!(bus.publish(sample_event()), 0);
        assert_eq!(bus.publish(sample_event()), 0);
    }

    #[test]
    fn lagged_receiver_handles_gracefully() {
        let bus = EventBus::new(4);
        let mut rx = bus.subscribe();

        for _ in 0..10 {
            bus.publish(sample_event());
        }

        match rx.try_recv() {
            Ok(_) => {}
            Err(broadcast::error::TryRecvError::Lagged(_)) => {}
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn clone_shares_channel() {
        let bus = EventBus::new(16);
        let bus2 = bus.clone();
        let mut rx = bus.subscribe();

        bus2.publish(sample_event());

        assert!(rx.try_recv().is_ok());
    }

    #[test]
    fn debug_impl() {
        let bus = EventBus::new(16);
        let _rx = bus.subscribe();
        let debug = format!("{bus:?}");
        assert!(debug.contains("EventBus"));
        assert!(debug.contains("receiver_count"));
    }
}
