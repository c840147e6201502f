//! Bounded in-memory telemetry log.
//!
//! Keeps the most recent events for the diagnostics endpoint and mirrors each
//! one to `tracing`. Recording is a no-op when the telemetry flag is off.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::infrastructure::ports::ClockPort;

/// Events kept before the oldest is dropped.
pub const EVENT_LIMIT: usize = 200;

#[derive(Debug, Clone, Serialize)]
pub struct TelemetryEvent {
    pub name: String,
    pub metadata: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

pub struct TelemetryLog {
    enabled: bool,
    clock: Arc<dyn ClockPort>,
    events: Mutex<VecDeque<TelemetryEvent>>,
}

impl TelemetryLog {
    pub fn new(enabled: bool, clock: Arc<dyn ClockPort>) -> Self {
        Self {
            enabled,
            clock,
            events: Mutex::new(VecDeque::with_capacity(EVENT_LIMIT)),
        }
    }

    pub fn record(&self, name: &str, metadata: serde_json::Value) {
        if !self.enabled {
            return;
        }

        tracing::info!(event = name, metadata = %metadata, "telemetry");

        let mut events = self.events.lock().unwrap_or_else(|e| e.into_inner());
        if events.len() >= EVENT_LIMIT {
            events.pop_front();
        }
        events.push_back(TelemetryEvent {
            name: name.to_string(),
            metadata,
            timestamp: self.clock.now(),
        });
    }

    /// Snapshot of stored events, oldest first.
    pub fn events(&self) -> Vec<TelemetryEvent> {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::FixedClock;
    use serde_json::json;

    #[test]
    fn test_keeps_only_most_recent_events() {
        let log = TelemetryLog::new(true, Arc::new(FixedClock(Utc::now())));
        for i in 0..(EVENT_LIMIT + 5) {
            log.record("ai_fallback", json!({ "n": i }));
        }
        let events = log.events();
        assert_eq!(events.len(), EVENT_LIMIT);
        assert_eq!(events[0].metadata["n"], 5);
    }

    #[test]
    fn test_disabled_log_records_nothing() {
        let log = TelemetryLog::new(false, Arc::new(FixedClock(Utc::now())));
        log.record("ai_timeout", json!({}));
        assert!(log.events().is_empty());
    }
}
