//! Application State
//!
//! Shared state accessible by all handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use std::sync::Arc;
use std::time::Instant;

use crate::commands::{CommandSink, LogCommandSink};
use crate::upstream::UpstreamStatus;
use crate::websocket::{BroadcastHub, HubConfig, StreamSettings};

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Connected WebSocket clients
    pub hub: Arc<BroadcastHub>,
    /// Broker connection health, for `/health`
    pub upstream: Arc<UpstreamStatus>,
    /// Where client commands go
    pub commands: Arc<dyn CommandSink>,
    /// Heartbeat settings applied to every stream connection
    pub stream_settings: StreamSettings,
    /// Server start time for uptime tracking
    pub start_time: Instant,
}

impl AppState {
    /// Create state around an existing hub and upstream status
    pub fn new(
        hub: Arc<BroadcastHub>,
        upstream: Arc<UpstreamStatus>,
        commands: Arc<dyn CommandSink>,
        stream_settings: StreamSettings,
    ) -> Self {
        Self {
            hub,
            upstream,
            commands,
            stream_settings,
            start_time: Instant::now(),
        }
    }

    /// Standalone state with a fresh hub and a logging command sink
    pub fn with_hub_config(hub_config: HubConfig, stream_settings: StreamSettings) -> Self {
        Self::new(
            Arc::new(BroadcastHub::new(hub_config)),
            Arc::new(UpstreamStatus::new()),
            Arc::new(LogCommandSink),
            stream_settings,
        )
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::with_hub_config(HubConfig::default(), StreamSettings::default())
    }
}
