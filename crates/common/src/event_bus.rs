//! Typed multi-producer/multi-consumer publish/subscribe event bus.
//!
//! Topics are declared as string constants (no stringly-typed ad hoc
//! literals scattered through the codebase). Subscribers receive owned
//! [`Event`] values — never a shared mutable reference — and delivery is
//! best-effort ordered per topic, backed by a [`tokio::sync::broadcast`]
//! channel.

use serde_json::Value;
use tracing::trace;

/// Topic name constants. Config field topics match the field name emitted
/// by the config manager's `update()` path; the remaining topics are
/// cross-cutting signals described in the design notes.
pub mod topic {
    pub const PROVIDER: &str = "provider";
    pub const BASE_URL: &str = "baseUrl";
    pub const API_KEY: &str = "apiKey";
    pub const MODEL: &str = "model";
    pub const SYSTEM_PROMPT: &str = "systemPrompt";
    pub const THEME: &str = "theme";
    pub const OFFLINE_MODE: &str = "offlineMode";
    pub const FALLBACK_NAMESPACE: &str = "fallback-namespace";
    pub const SYSTEM_PROMPT_UPDATED: &str = "systemPromptUpdated";
}

pub type Topic = &'static str;

/// A single event carried on the bus.
#[derive(Debug, Clone)]
pub struct Event {
    pub topic: Topic,
    pub value: Value,
}

impl Event {
    pub fn new(topic: Topic, value: Value) -> Self {
        Self { topic, value }
    }
}

/// Multi-producer/multi-consumer event bus.
///
/// Cloning an [`EventBus`] shares the same underlying channel — all clones
/// publish to and can subscribe from the same stream of events.
#[derive(Clone)]
pub struct EventBus {
    sender: tokio::sync::broadcast::Sender<Event>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

impl EventBus {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = tokio::sync::broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event. Delivery is best-effort: if there are no
    /// subscribers this is a no-op, matching "listeners receive values,
    /// never shared mutable references" with no guaranteed-delivery
    /// backpressure on the publisher.
    pub fn publish(&self, topic: Topic, value: Value) {
        trace!(topic, "publishing event");
        let _ = self.sender.send(Event::new(topic, value));
    }

    /// Subscribe to the full event stream. Callers filter on `Event::topic`
    /// themselves — this keeps the bus itself topic-agnostic.
    #[must_use]
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Event> {
        self.sender.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_and_receive() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();
        bus.publish(topic::MODEL, serde_json::json!("gpt-4o-mini"));

        let event = rx.recv().await.unwrap();
        assert_eq!(event.topic, topic::MODEL);
        assert_eq!(event.value, serde_json::json!("gpt-4o-mini"));
    }

    #[tokio::test]
    async fn publish_with_no_subscribers_does_not_panic() {
        let bus = EventBus::default();
        bus.publish(topic::FALLBACK_NAMESPACE, serde_json::json!({"ns": "abcd1234"}));
    }

    #[tokio::test]
    async fn multiple_subscribers_each_receive() {
        let bus = EventBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();
        bus.publish(topic::THEME, serde_json::json!("dark"));

        assert_eq!(rx1.recv().await.unwrap().topic, topic::THEME);
        assert_eq!(rx2.recv().await.unwrap().topic, topic::THEME);
    }
}
