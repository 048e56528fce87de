//! # Sensor Bridge
//!
//! Relays sensor readings from an MQTT broker to live WebSocket dashboards.
//!
//! ## Features
//!
//! - **Normalization**: Tolerant decoding of heterogeneous sensor payloads
//! - **Fan-out**: Per-client bounded queues, one slow viewer never stalls the rest
//! - **Resilience**: Broker reconnect with capped exponential backoff
//! - **Simulation**: Synthetic readings when no sensor is attached
//!
//! ## Modules
//!
//! - [`reading`]: Canonical reading and payload normalization
//! - [`upstream`]: MQTT subscriber and simulator
//! - [`websocket`]: Broadcast hub and stream endpoint
//! - [`api`]: HTTP surface with Axum
//! - [`watch`]: Terminal client for the stream
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sensor_bridge::{api, AppState, Config};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env();
//!     let state = AppState::with_hub_config(
//!         config.hub.hub_config(),
//!         config.hub.stream_settings(),
//!     );
//!
//!     // Readings pushed into the hub reach every connected viewer
//!     state.hub.broadcast(sensor_bridge::Reading::default()).await?;
//!
//!     api::serve(state, &config.server).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod commands;
pub mod config;
pub mod logging;
pub mod reading;
pub mod upstream;
pub mod watch;
pub mod websocket;

// Re-export top-level types for convenience
pub use reading::{normalize, DecodeError, DecodeResult, Reading, Unit};

pub use upstream::{Backoff, BrokerAddress, Simulator, Subscriber, UpstreamSnapshot, UpstreamStatus};

pub use websocket::{
    BroadcastHub, BroadcastReport, ClientMessage, Command, Envelope, HubConfig, HubError,
    StreamSettings, stream_handler,
};

pub use commands::{CommandError, CommandSink, LogCommandSink, MqttCommandPublisher};

pub use api::{build_router, serve, ApiError, AppState};

pub use config::{
    Config, ConfigError, HubSettings, LoggingConfig, MqttConfig, ServerConfig, SimulationConfig,
};

pub use watch::{ReadingHistory, WatchClient, WatchError, WatchEvent};
