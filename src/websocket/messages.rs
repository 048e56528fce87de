//! WebSocket Message Types
//!
//! Defines all message types for WebSocket communication between
//! viewers (dashboards) and the bridge.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::reading::{Reading, Unit};

/// Welcome text sent once to every client right after it registers
pub const WELCOME_MESSAGE: &str = "Connected to MQTT bridge";

/// Messages sent from server to client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Envelope {
    /// Connection established
    Connection {
        /// Fixed welcome text
        message: String,
    },
    /// A new reading arrived from the broker
    SensorData {
        /// The normalized reading
        data: Reading,
    },
}

impl Envelope {
    /// The welcome envelope
    pub fn connection() -> Self {
        Envelope::Connection {
            message: WELCOME_MESSAGE.to_string(),
        }
    }

    /// Wrap a reading
    pub fn sensor_data(reading: Reading) -> Self {
        Envelope::SensorData { data: reading }
    }

    /// Serialize to a single-line JSON frame
    pub fn to_frame(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Messages sent from client to server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Control request for an actuator or config layer
    Command(Command),
}

/// Body of a `command` envelope
///
/// Only `unit` is understood by the bridge; every other field is kept
/// untouched for whoever consumes the command.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Command {
    /// Requested display unit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<Unit>,
    /// Any other fields sent by the client
    #[serde(flatten)]
    pub params: Map<String, Value>,
}

impl Command {
    /// A unit-change command
    pub fn set_unit(unit: Unit) -> Self {
        Self {
            unit: Some(unit),
            params: Map::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_envelope_shape() {
        let json = Envelope::connection().to_frame().unwrap();
        assert_eq!(
            json,
            r#"{"type":"connection","message":"Connected to MQTT bridge"}"#
        );
    }

    #[test]
    fn test_sensor_data_envelope_shape() {
        let reading = Reading::new(21.5, 40.0, Unit::Celsius);
        let json = Envelope::sensor_data(reading).to_frame().unwrap();
        assert_eq!(
            json,
            r#"{"type":"sensor_data","data":{"temperature":21.5,"humidity":40.0,"unit":"C","simulation":false}}"#
        );
        assert!(!json.contains('\n'));
    }

    #[test]
    fn test_envelope_deserialize() {
        let json = r#"{"type":"sensor_data","data":{"temperature":30,"humidity":70,"unit":"F","simulation":true}}"#;
        let envelope: Envelope = serde_json::from_str(json).unwrap();
        match envelope {
            Envelope::SensorData { data } => {
                assert_eq!(data.temperature, 30.0);
                assert_eq!(data.unit, Unit::Fahrenheit);
                assert!(data.simulation);
            }
            _ => panic!("Expected SensorData"),
        }
    }

    #[test]
    fn test_client_message_deserialize_command() {
        let json = r#"{"type": "command", "unit": "F"}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        let ClientMessage::Command(command) = msg;
        assert_eq!(command.unit, Some(Unit::Fahrenheit));
        assert!(command.params.is_empty());
    }

    #[test]
    fn test_client_command_keeps_extra_fields() {
        let json = r#"{"type": "command", "led": "red", "blink": 3}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        let ClientMessage::Command(command) = msg;
        assert_eq!(command.unit, None);
        assert_eq!(command.params.get("led"), Some(&Value::from("red")));
        assert_eq!(command.params.get("blink"), Some(&Value::from(3)));
    }

    #[test]
    fn test_client_message_rejects_unknown_type() {
        let json = r#"{"type": "subscribe", "topics": []}"#;
        assert!(serde_json::from_str::<ClientMessage>(json).is_err());

        assert!(serde_json::from_str::<ClientMessage>("hello").is_err());
    }

    #[test]
    fn test_command_serialize() {
        let msg = ClientMessage::Command(Command::set_unit(Unit::Celsius));
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"type":"command","unit":"C"}"#);
    }
}
