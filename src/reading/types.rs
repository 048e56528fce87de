//! Core reading types
//!
//! A `Reading` is created per inbound broker message, never mutated after
//! normalization, and dropped once it has been broadcast.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Temperature unit reported by the sensor
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum Unit {
    #[default]
    #[serde(rename = "C")]
    Celsius,
    #[serde(rename = "F")]
    Fahrenheit,
}

impl Unit {
    /// Parse a unit label, accepting `C`/`F` in any case with surrounding
    /// whitespace. Returns `None` for anything else.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "C" | "c" => Some(Unit::Celsius),
            "F" | "f" => Some(Unit::Fahrenheit),
            _ => None,
        }
    }

    /// Single-letter wire label
    pub fn label(&self) -> &'static str {
        match self {
            Unit::Celsius => "C",
            Unit::Fahrenheit => "F",
        }
    }

    /// Human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Unit::Celsius => "Celsius",
            Unit::Fahrenheit => "Fahrenheit",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "°{}", self.label())
    }
}

/// A normalized sensor reading
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Reading {
    /// Temperature in `unit`
    pub temperature: f64,
    /// Relative humidity in percent
    pub humidity: f64,
    /// Unit of `temperature`
    pub unit: Unit,
    /// True when the value came from a simulator rather than real hardware
    pub simulation: bool,
}

impl Reading {
    /// Create a reading from hardware (simulation = false)
    pub fn new(temperature: f64, humidity: f64, unit: Unit) -> Self {
        Self {
            temperature,
            humidity,
            unit,
            simulation: false,
        }
    }

    /// Builder method: mark as simulated
    pub fn simulated(mut self) -> Self {
        self.simulation = true;
        self
    }
}

impl Default for Reading {
    fn default() -> Self {
        Self::new(0.0, 0.0, Unit::Celsius)
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.1} {} / {:.1} %",
            self.temperature, self.unit, self.humidity
        )?;
        if self.simulation {
            write!(f, " (simulated)")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_labels() {
        assert_eq!(Unit::from_label("C"), Some(Unit::Celsius));
        assert_eq!(Unit::from_label(" f "), Some(Unit::Fahrenheit));
        assert_eq!(Unit::from_label("K"), None);
        assert_eq!(Unit::from_label(""), None);
        assert_eq!(Unit::default(), Unit::Celsius);
    }

    #[test]
    fn test_reading_serializes_to_wire_shape() {
        let reading = Reading::new(22.5, 41.0, Unit::Fahrenheit);
        let json = serde_json::to_string(&reading).unwrap();
        assert_eq!(
            json,
            r#"{"temperature":22.5,"humidity":41.0,"unit":"F","simulation":false}"#
        );
    }

    #[test]
    fn test_reading_display() {
        let reading = Reading::new(21.04, 55.0, Unit::Celsius).simulated();
        assert_eq!(reading.to_string(), "21.0 °C / 55.0 % (simulated)");
    }
}
