//! Broker address parsing and MQTT client setup

use rumqttc::{AsyncClient, EventLoop, MqttOptions, QoS};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::config::{ConfigError, MqttConfig};

/// Default MQTT port when the URL has none
pub const DEFAULT_MQTT_PORT: u16 = 1883;

/// Capacity of the request channel between `AsyncClient` and `EventLoop`
const REQUEST_CHANNEL_CAPACITY: usize = 64;

/// Host and port of the broker, parsed from `mqtt://host[:port]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerAddress {
    pub host: String,
    pub port: u16,
}

/// Errors from parsing a broker URL
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BrokerAddressError {
    #[error("unsupported scheme '{0}' (expected mqtt or tcp)")]
    UnsupportedScheme(String),

    #[error("missing host")]
    MissingHost,

    #[error("invalid port '{0}'")]
    InvalidPort(String),
}

impl FromStr for BrokerAddress {
    type Err = BrokerAddressError;

    fn from_str(url: &str) -> Result<Self, Self::Err> {
        let url = url.trim();
        let (scheme, rest) = url.split_once("://").unwrap_or(("mqtt", url));
        if !matches!(scheme.to_ascii_lowercase().as_str(), "mqtt" | "tcp") {
            return Err(BrokerAddressError::UnsupportedScheme(scheme.to_string()));
        }

        // Drop any path; MQTT has no use for it
        let authority = rest.split('/').next().unwrap_or_default();

        let (host, port) = if let Some(bracketed) = authority.strip_prefix('[') {
            // IPv6 literal: [::1]:1883
            let (host, tail) = bracketed
                .split_once(']')
                .ok_or(BrokerAddressError::MissingHost)?;
            (host, tail.strip_prefix(':'))
        } else {
            match authority.rsplit_once(':') {
                Some((host, port)) => (host, Some(port)),
                None => (authority, None),
            }
        };

        if host.is_empty() {
            return Err(BrokerAddressError::MissingHost);
        }

        let port = match port {
            Some(p) => p
                .parse::<u16>()
                .ok()
                .filter(|p| *p != 0)
                .ok_or_else(|| BrokerAddressError::InvalidPort(p.to_string()))?,
            None => DEFAULT_MQTT_PORT,
        };

        Ok(Self {
            host: host.to_string(),
            port,
        })
    }
}

impl fmt::Display for BrokerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "mqtt://[{}]:{}", self.host, self.port)
        } else {
            write!(f, "mqtt://{}:{}", self.host, self.port)
        }
    }
}

/// Map a numeric QoS level; anything above 2 is clamped to exactly-once
pub fn qos_level(level: u8) -> QoS {
    match level {
        0 => QoS::AtMostOnce,
        1 => QoS::AtLeastOnce,
        _ => QoS::ExactlyOnce,
    }
}

/// Build the client/event-loop pair for the configured broker
///
/// Nothing touches the network until the event loop is polled.
pub fn connect(config: &MqttConfig) -> Result<(AsyncClient, EventLoop), ConfigError> {
    let broker = config.broker()?;
    let client_id = config.resolved_client_id();

    let mut options = MqttOptions::new(client_id.clone(), broker.host.clone(), broker.port);
    options.set_keep_alive(Duration::from_secs(config.keep_alive_secs.max(1)));
    options.set_clean_session(true);

    tracing::info!(broker = %broker, client_id = %client_id, "MQTT client configured");
    Ok(AsyncClient::new(options, REQUEST_CHANNEL_CAPACITY))
}
