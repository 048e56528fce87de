//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::upstream::BrokerAddress;
use crate::websocket::{HubConfig, StreamSettings};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub mqtt: MqttConfig,

    #[serde(default)]
    pub hub: HubSettings,

    #[serde(default)]
    pub simulation: SimulationConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP / WebSocket listener configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3001
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Upstream broker configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MqttConfig {
    #[serde(default = "default_mqtt_url")]
    pub url: String,

    /// Generated when absent
    #[serde(default)]
    pub client_id: Option<String>,

    /// Topic filters to subscribe to after every connect; may be empty
    #[serde(default)]
    pub topics: Vec<String>,

    #[serde(default)]
    pub qos: u8,

    #[serde(default = "default_keep_alive")]
    pub keep_alive_secs: u64,

    #[serde(default = "default_reconnect_initial")]
    pub reconnect_initial_ms: u64,

    #[serde(default = "default_reconnect_max")]
    pub reconnect_max_ms: u64,

    /// Client commands are republished here when set
    #[serde(default)]
    pub command_topic: Option<String>,
}

fn default_mqtt_url() -> String {
    "mqtt://localhost:1883".to_string()
}

fn default_keep_alive() -> u64 {
    30
}

fn default_reconnect_initial() -> u64 {
    500
}

fn default_reconnect_max() -> u64 {
    30_000
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            url: default_mqtt_url(),
            client_id: None,
            topics: Vec::new(),
            qos: 0,
            keep_alive_secs: default_keep_alive(),
            reconnect_initial_ms: default_reconnect_initial(),
            reconnect_max_ms: default_reconnect_max(),
            command_topic: None,
        }
    }
}

impl MqttConfig {
    /// Configured client id, or a fresh `sensor-bridge-<uuid>`
    pub fn resolved_client_id(&self) -> String {
        match &self.client_id {
            Some(id) if !id.trim().is_empty() => id.clone(),
            _ => format!("sensor-bridge-{}", uuid::Uuid::new_v4().simple()),
        }
    }

    /// Parsed broker address
    pub fn broker(&self) -> Result<BrokerAddress, ConfigError> {
        self.url.parse().map_err(|e| ConfigError::Invalid {
            field: "mqtt.url",
            reason: format!("{}", e),
        })
    }
}

/// Broadcast hub and stream connection settings
#[derive(Debug, Clone, Deserialize)]
pub struct HubSettings {
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,

    #[serde(default = "default_queue_capacity")]
    pub client_queue_capacity: usize,

    #[serde(default = "default_heartbeat_interval")]
    pub heartbeat_interval_ms: u64,

    #[serde(default = "default_client_timeout")]
    pub client_timeout_ms: u64,
}

fn default_max_connections() -> usize {
    1000
}

fn default_queue_capacity() -> usize {
    64
}

fn default_heartbeat_interval() -> u64 {
    30_000
}

fn default_client_timeout() -> u64 {
    90_000
}

impl Default for HubSettings {
    fn default() -> Self {
        Self {
            max_connections: default_max_connections(),
            client_queue_capacity: default_queue_capacity(),
            heartbeat_interval_ms: default_heartbeat_interval(),
            client_timeout_ms: default_client_timeout(),
        }
    }
}

impl HubSettings {
    pub fn hub_config(&self) -> HubConfig {
        HubConfig {
            max_connections: self.max_connections,
            client_queue_capacity: self.client_queue_capacity,
        }
    }

    pub fn stream_settings(&self) -> StreamSettings {
        StreamSettings {
            heartbeat_interval: Duration::from_millis(self.heartbeat_interval_ms),
            client_timeout: Duration::from_millis(self.client_timeout_ms),
        }
    }
}

/// Synthetic reading generator, for running without hardware
#[derive(Debug, Clone, Deserialize)]
pub struct SimulationConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_simulation_interval")]
    pub interval_ms: u64,
}

fn default_simulation_interval() -> u64 {
    3000
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_ms: default_simulation_interval(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e,
        })
    }

    /// Parse configuration from TOML text
    fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Standard config file locations, highest priority first
    pub fn search_paths() -> Vec<PathBuf> {
        [
            dirs::config_dir().map(|p| p.join("sensor-bridge").join("config.toml")),
            Some(PathBuf::from("/etc/sensor-bridge/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    /// Load from default locations or environment
    ///
    /// Returns the file that was used, if any. A file that exists but cannot
    /// be loaded is an error rather than a silent fallback to defaults.
    pub fn load_default() -> Result<(Self, Option<PathBuf>), ConfigError> {
        Self::load_first(&Self::search_paths())
    }

    /// Load the first existing file in `paths`, or fall back to the environment
    pub fn load_first(paths: &[PathBuf]) -> Result<(Self, Option<PathBuf>), ConfigError> {
        match paths.iter().find(|path| path.exists()) {
            Some(path) => Ok((Self::load_with_env(path)?, Some(path.clone()))),
            None => Ok((Self::from_env(), None)),
        }
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any key lookup
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        // Server overrides
        if let Some(host) = lookup("SENSOR_BRIDGE_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("SENSOR_BRIDGE_PORT") {
            if let Ok(p) = port.parse() {
                self.server.port = p;
            }
        }

        // Broker overrides
        if let Some(url) = lookup("SENSOR_BRIDGE_MQTT_URL") {
            self.mqtt.url = url;
        }
        if let Some(topics) = lookup("SENSOR_BRIDGE_MQTT_TOPICS") {
            self.mqtt.topics = topics
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(String::from)
                .collect();
        }

        // Simulation overrides
        if let Some(enabled) = lookup("SENSOR_BRIDGE_SIMULATION") {
            self.simulation.enabled = enabled.to_lowercase() != "false" && enabled != "0";
        }

        // Logging overrides
        if let Some(level) = lookup("SENSOR_BRIDGE_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("SENSOR_BRIDGE_LOG_FORMAT") {
            self.logging.format = format;
        }
    }

    /// Reject settings the bridge cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.mqtt.broker()?;

        if self.mqtt.qos > 2 {
            return Err(ConfigError::Invalid {
                field: "mqtt.qos",
                reason: format!("must be 0, 1 or 2, got {}", self.mqtt.qos),
            });
        }
        if self.mqtt.reconnect_initial_ms == 0 || self.mqtt.reconnect_max_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "mqtt.reconnect_*_ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.hub.client_queue_capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "hub.client_queue_capacity",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.hub.heartbeat_interval_ms == 0 || self.hub.client_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "hub.heartbeat_interval_ms",
                reason: "heartbeat and timeout must be greater than zero".to_string(),
            });
        }
        if self.simulation.interval_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "simulation.interval_ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },

    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Sensor Bridge Configuration
#
# Environment variables override these settings:
# - SENSOR_BRIDGE_HOST
# - SENSOR_BRIDGE_PORT
# - SENSOR_BRIDGE_MQTT_URL
# - SENSOR_BRIDGE_MQTT_TOPICS (comma separated)
# - SENSOR_BRIDGE_SIMULATION
# - SENSOR_BRIDGE_LOG_LEVEL
# - SENSOR_BRIDGE_LOG_FORMAT

[server]
# Host to bind the HTTP / WebSocket listener to
host = "0.0.0.0"

# Port shared by the liveness endpoint and the WebSocket stream
port = 3001

[mqtt]
# Broker address (mqtt://host:port or tcp://host:port)
url = "mqtt://localhost:1883"

# Client id (a random one is generated when omitted)
# client_id = "sensor-bridge"

# Topic filters to subscribe to; leave empty to only receive what the
# broker pushes without a subscription
topics = ["classroom/+/telemetry"]

# Subscription QoS (0, 1 or 2)
qos = 0

# Keep-alive interval (seconds)
keep_alive_secs = 30

# Reconnect backoff: starts here and doubles up to the max (ms)
reconnect_initial_ms = 500
reconnect_max_ms = 30000

# Republish client commands to this topic
# command_topic = "classroom/commands"

[hub]
# Maximum number of concurrent WebSocket clients
max_connections = 1000

# Frames buffered per client before new ones are skipped
client_queue_capacity = 64

# Ping interval and idle timeout for WebSocket clients (ms)
heartbeat_interval_ms = 30000
client_timeout_ms = 90000

[simulation]
# Broadcast synthetic readings (for testing without a sensor)
enabled = false

# Interval between synthetic readings (ms)
interval_ms = 3000

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}
