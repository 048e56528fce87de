//! Sensor Readings
//!
//! Canonical reading shape and the decoder that produces it from raw broker
//! payloads.
//!
//! - **types**: `Reading` and `Unit`
//! - **normalize**: JSON payload → `Reading` with field fallbacks
//! - **error**: Decode errors
//!
//! # Example
//!
//! ```rust
//! use sensor_bridge::reading::{normalize, Unit};
//!
//! let reading = normalize(br#"{"temp": 21.5, "hum": 48}"#).unwrap();
//! assert_eq!(reading.temperature, 21.5);
//! assert_eq!(reading.humidity, 48.0);
//! assert_eq!(reading.unit, Unit::Celsius);
//! assert!(!reading.simulation);
//! ```

pub mod error;
pub mod normalize;
pub mod types;

pub use error::{DecodeError, DecodeResult};
pub use normalize::normalize;
pub use types::{Reading, Unit};
