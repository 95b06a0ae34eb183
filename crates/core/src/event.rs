//! Domain event system: decoupled observation of the agent.
//!
//! The fallback chain and the executor publish events here; anything that
//! wants to watch (a transcript logger, a metrics sink) subscribes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

/// All domain events in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DomainEvent {
    /// The fallback chain moved from one model to the next
    ModelFallback {
        from_model: String,
        to_model: String,
        reason: String,
        timestamp: DateTime<Utc>,
    },

    /// A tool was dispatched
    ToolDispatched {
        tool_name: String,
        success: bool,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// A user turn finished with an answer
    TurnCompleted {
        conversation_id: String,
        tools_used: usize,
        attempts: u32,
        timestamp: DateTime<Utc>,
    },

    /// A user turn gave up after exhausting retries
    TurnFailed {
        conversation_id: String,
        error_message: String,
        timestamp: DateTime<Utc>,
    },
}

/// A broadcast-based event bus for domain events.
pub struct EventBus {
    sender: broadcast::Sender<Arc<DomainEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: DomainEvent) {
        // No subscribers is fine
        let _ = self.sender.send(Arc::new(event));
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<DomainEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn event_bus_publish_subscribe() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.publish(DomainEvent::ToolDispatched {
            tool_name: "get_jobs_list".into(),
            success: true,
            duration_ms: 3,
            timestamp: Utc::now(),
        });

        let event = rx.recv().await.unwrap();
        match event.as_ref() {
            DomainEvent::ToolDispatched { tool_name, success, .. } => {
                assert_eq!(tool_name, "get_jobs_list");
                assert!(success);
            }
            _ => panic!("Expected ToolDispatched event"),
        }
    }

    #[test]
    fn event_bus_no_subscribers_doesnt_panic() {
        let bus = EventBus::new(16);
        bus.publish(DomainEvent::TurnFailed {
            conversation_id: "c1".into(),
            error_message: "no subscribers".into(),
            timestamp: Utc::now(),
        });
    }
}
