//! Upstream Broker Connection
//!
//! Everything that feeds readings into the hub:
//!
//! - **broker**: Broker URL parsing and MQTT client construction
//! - **subscriber**: Event loop that decodes publishes and broadcasts them
//! - **backoff**: Reconnect delay policy
//! - **simulator**: Synthetic readings for running without hardware
//! - **status**: Counters exposed by the health endpoint
//!
//! # Example
//!
//! ```rust,no_run
//! use sensor_bridge::config::MqttConfig;
//! use sensor_bridge::upstream::{connect, Subscriber, UpstreamStatus};
//! use sensor_bridge::websocket::BroadcastHub;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = MqttConfig {
//!         url: "mqtt://localhost:1883".to_string(),
//!         topics: vec!["classroom/+/telemetry".to_string()],
//!         ..Default::default()
//!     };
//!     let hub = Arc::new(BroadcastHub::default());
//!     let status = Arc::new(UpstreamStatus::new());
//!
//!     let (client, eventloop) = connect(&config)?;
//!     Subscriber::new(client, hub, status, &config).run(eventloop).await;
//!     Ok(())
//! }
//! ```

mod backoff;
mod broker;
mod simulator;
mod status;
mod subscriber;

pub use backoff::Backoff;
pub use broker::{connect, qos_level, BrokerAddress, BrokerAddressError, DEFAULT_MQTT_PORT};
pub use simulator::{synthetic_reading, Simulator};
pub use status::{UpstreamSnapshot, UpstreamStatus};
pub use subscriber::Subscriber;
