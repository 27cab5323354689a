//! Change notifications
//!
//! Tools publish an event after every persisted change; subscribers recompute
//! whatever derived view they keep.

use chrono::NaiveDate;
use serde::Serialize;
use tokio::sync::broadcast;

/// Buffered events per subscriber before the slowest one starts lagging
const CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NutritionEvent {
    LogUpdated { user_id: String, date: NaiveDate },
    GoalsUpdated { user_id: String },
    WeightRecorded { user_id: String, weight: f64 },
}

/// Broadcast channel for nutrition events
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<NutritionEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<NutritionEvent> {
        self.sender.subscribe()
    }

    /// Publish an event; returns how many subscribers received it
    ///
    /// Having no subscribers is not an error.
    pub fn publish(&self, event: NutritionEvent) -> usize {
        tracing::debug!("Publishing {:?}", event);
        self.sender.send(event).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_without_subscribers() {
        let bus = EventBus::new();
        assert_eq!(bus.publish(NutritionEvent::GoalsUpdated { user_id: "u1".into() }), 0);
    }

    #[tokio::test]
    async fn test_subscribers_receive_events() {
        let bus = EventBus::new();
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();

        let event = NutritionEvent::LogUpdated {
            user_id: "u1".into(),
            date: NaiveDate::from_ymd_opt(2026, 1, 13).unwrap(),
        };
        assert_eq!(bus.publish(event.clone()), 2);

        assert_eq!(first.recv().await.unwrap(), event);
        assert_eq!(second.recv().await.unwrap(), event);
    }

    #[test]
    fn test_event_serialization() {
        let json = serde_json::to_value(NutritionEvent::WeightRecorded { user_id: "u1".into(), weight: 180.0 }).unwrap();
        assert_eq!(json["type"], "weight_recorded");
        assert_eq!(json["weight"], 180.0);
    }
}
