//! Upstream health counters
//!
//! Written by the subscriber and simulator, read by the health endpoint.

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct UpstreamStatus {
    connected: AtomicBool,
    messages_received: AtomicU64,
    readings_broadcast: AtomicU64,
    decode_failures: AtomicU64,
    /// Milliseconds since the epoch; 0 means never
    last_reading_ms: AtomicI64,
}

/// Point-in-time copy of `UpstreamStatus`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpstreamSnapshot {
    pub broker_connected: bool,
    pub messages_received: u64,
    pub readings_broadcast: u64,
    pub decode_failures: u64,
    pub last_reading_at: Option<DateTime<Utc>>,
}

impl UpstreamStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::Relaxed);
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    pub fn record_message(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_decode_failure(&self) {
        self.decode_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_broadcast(&self) {
        self.readings_broadcast.fetch_add(1, Ordering::Relaxed);
        self.last_reading_ms
            .store(Utc::now().timestamp_millis(), Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> UpstreamSnapshot {
        let last_ms = self.last_reading_ms.load(Ordering::Relaxed);
        UpstreamSnapshot {
            broker_connected: self.is_connected(),
            messages_received: self.messages_received.load(Ordering::Relaxed),
            readings_broadcast: self.readings_broadcast.load(Ordering::Relaxed),
            decode_failures: self.decode_failures.load(Ordering::Relaxed),
            last_reading_at: (last_ms > 0)
                .then(|| Utc.timestamp_millis_opt(last_ms).single())
                .flatten(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let status = UpstreamStatus::new();
        assert_eq!(status.snapshot().last_reading_at, None);

        status.set_connected(true);
        status.record_message();
        status.record_message();
        status.record_decode_failure();
        status.record_broadcast();

        let snapshot = status.snapshot();
        assert!(snapshot.broker_connected);
        assert_eq!(snapshot.messages_received, 2);
        assert_eq!(snapshot.decode_failures, 1);
        assert_eq!(snapshot.readings_broadcast, 1);
        assert!(snapshot.last_reading_at.is_some());
    }
}
