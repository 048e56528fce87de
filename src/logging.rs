//! Logging setup
//!
//! `RUST_LOG` takes precedence; otherwise the configured level applies to
//! this crate and HTTP tracing stays at info.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    /// Unknown values fall back to pretty
    pub fn from_config(format: &str) -> Self {
        if format.trim().eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        }
    }
}

/// Filter used when `RUST_LOG` is not set
pub fn default_filter(level: &str) -> String {
    format!("sensor_bridge={},tower_http=info", level.trim().to_lowercase())
}

/// Install the global subscriber
///
/// Calling it twice is harmless; the second call is ignored.
pub fn init(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter(&config.level)))
        .unwrap_or_else(|_| EnvFilter::new("sensor_bridge=info"));

    let registry = tracing_subscriber::registry().with(filter);
    let result = match LogFormat::from_config(&config.format) {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).try_init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).try_init(),
    };

    if result.is_err() {
        tracing::debug!("Global tracing subscriber already installed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format() {
        assert_eq!(LogFormat::from_config("json"), LogFormat::Json);
        assert_eq!(LogFormat::from_config(" JSON "), LogFormat::Json);
        assert_eq!(LogFormat::from_config("pretty"), LogFormat::Pretty);
        assert_eq!(LogFormat::from_config("xml"), LogFormat::Pretty);
    }

    #[test]
    fn test_default_filter() {
        assert_eq!(default_filter("DEBUG"), "sensor_bridge=debug,tower_http=info");
    }

    #[test]
    fn test_init_twice() {
        let config = LoggingConfig::default();
        init(&config);
        init(&config);
    }
}
