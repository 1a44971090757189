//! The live `ConfigManager`: holds the effective configuration and
//! publishes change events as fields are updated through [`ConfigManager::update`].

use std::sync::RwLock;

use hackare_common::event_bus::{topic, EventBus};

use crate::schema::HackareConfig;

/// Holds the effective configuration behind a single mutation path so every
/// change can be diffed and published on the event bus.
pub struct ConfigManager {
    current: RwLock<HackareConfig>,
    events: EventBus,
}

impl ConfigManager {
    pub fn new(initial: HackareConfig, events: EventBus) -> Self {
        Self { current: RwLock::new(initial), events }
    }

    /// Read the current configuration.
    pub fn get(&self) -> HackareConfig {
        self.current.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Mutate the configuration and publish an event per field that
    /// actually changed.
    pub fn update(&self, mutator: impl FnOnce(&mut HackareConfig)) {
        let before = self.get();
        let mut after = before.clone();
        mutator(&mut after);

        {
            let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
            *guard = after.clone();
        }

        self.publish_diff(&before, &after);
    }

    fn publish_diff(&self, before: &HackareConfig, after: &HackareConfig) {
        if before.provider != after.provider {
            self.events.publish(topic::PROVIDER, serde_json::json!(after.provider));
        }
        if before.base_url != after.base_url {
            self.events.publish(topic::BASE_URL, serde_json::json!(after.base_url));
        }
        if before.api_key != after.api_key {
            self.events.publish(topic::API_KEY, serde_json::json!(after.api_key.is_some()));
        }
        if before.model != after.model {
            self.events.publish(topic::MODEL, serde_json::json!(after.model));
        }
        if before.system_prompt != after.system_prompt {
            self.events
                .publish(topic::SYSTEM_PROMPT, serde_json::json!(after.system_prompt));
        }
        if before.theme != after.theme {
            self.events.publish(topic::THEME, serde_json::json!(after.theme));
        }
        if before.offline_mode != after.offline_mode {
            self.events.publish(topic::OFFLINE_MODE, serde_json::json!(after.offline_mode));
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_replaces_the_current_config() {
        let mgr = ConfigManager::new(HackareConfig::default(), EventBus::default());
        mgr.update(|cfg| cfg.model = "gpt-4o".to_string());
        assert_eq!(mgr.get().model, "gpt-4o");
    }

    #[tokio::test]
    async fn update_publishes_an_event_for_changed_fields_only() {
        let events = EventBus::default();
        let mut rx = events.subscribe();
        let mgr = ConfigManager::new(HackareConfig::default(), events);

        mgr.update(|cfg| cfg.model = "gpt-4o".to_string());

        let event = rx.recv().await.unwrap();
        assert_eq!(event.topic, topic::MODEL);
        assert_eq!(event.value, serde_json::json!("gpt-4o"));
    }

    #[tokio::test]
    async fn update_with_no_change_publishes_nothing() {
        let events = EventBus::default();
        let mut rx = events.subscribe();
        let mgr = ConfigManager::new(HackareConfig::default(), events);

        mgr.update(|_cfg| {});

        assert!(rx.try_recv().is_err());
    }
}
