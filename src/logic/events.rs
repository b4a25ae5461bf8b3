//! Detection Event Bus
//!
//! Named events with JSON payloads, dispatched synchronously to whoever
//! subscribed. Emitting without listeners is a silent no-op; the detector
//! never depends on subscribers existing.

use std::collections::HashMap;

use parking_lot::RwLock;
use serde::Serialize;

/// Event names
pub const OS_RECORDING_DETECTED: &str = "os-recording-detected";

type Listener = Box<dyn Fn(&serde_json::Value) + Send + Sync>;

#[derive(Default)]
pub struct EventBus {
    listeners: RwLock<HashMap<String, Vec<Listener>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for `event`
    pub fn subscribe<F>(&self, event: &str, listener: F)
    where
        F: Fn(&serde_json::Value) + Send + Sync + 'static,
    {
        self.listeners
            .write()
            .entry(event.to_string())
            .or_default()
            .push(Box::new(listener));
    }

    /// Serialize `payload` and dispatch to every listener of `event`
    pub fn emit<S: Serialize>(&self, event: &str, payload: &S) {
        let value = match serde_json::to_value(payload) {
            Ok(value) => value,
            Err(e) => {
                log::error!("event '{}' payload serialization failed: {}", event, e);
                return;
            }
        };

        let listeners = self.listeners.read();
        match listeners.get(event) {
            Some(list) => {
                for listener in list {
                    listener(&value);
                }
            }
            None => log::debug!("no listeners for '{}', event dropped", event),
        }
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners
            .read()
            .get(event)
            .map(Vec::len)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_emit_without_listeners_is_noop() {
        let bus = EventBus::new();
        bus.emit(OS_RECORDING_DETECTED, &serde_json::json!({"score": 0.9}));
        assert_eq!(bus.listener_count(OS_RECORDING_DETECTED), 0);
    }

    #[test]
    fn test_listener_receives_payload() {
        let bus = EventBus::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let seen = Arc::clone(&hits);
        bus.subscribe(OS_RECORDING_DETECTED, move |value| {
            assert_eq!(value["score"], 0.9);
            seen.fetch_add(1, Ordering::SeqCst);
        });

        bus.emit(OS_RECORDING_DETECTED, &serde_json::json!({"score": 0.9}));
        bus.emit("unrelated-event", &serde_json::json!({}));

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(bus.listener_count(OS_RECORDING_DETECTED), 1);
    }
}
