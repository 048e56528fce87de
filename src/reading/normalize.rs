//! Payload Normalizer
//!
//! Turns a raw broker payload into a fully populated `Reading`.
//!
//! Sensors in the field publish slightly different shapes, so each field
//! has a fallback chain:
//!
//! | Field         | Keys tried                 | Default |
//! |---------------|----------------------------|---------|
//! | `temperature` | `temperature`, `temp`      | `0`     |
//! | `humidity`    | `humidity`, `hum`          | `0`     |
//! | `unit`        | `unit`                     | `C`     |
//! | `simulation`  | `simulation`               | `false` |

use serde_json::{Map, Value};

use super::error::{DecodeError, DecodeResult};
use super::types::{Reading, Unit};

/// Decode a raw payload into a `Reading`
///
/// Fails only when the payload is not well-formed JSON or is not a JSON
/// object. Missing or unusable fields fall back to their defaults.
pub fn normalize(raw: &[u8]) -> DecodeResult<Reading> {
    let value: Value = serde_json::from_slice(raw)?;

    let fields = match &value {
        Value::Object(map) => map,
        other => return Err(DecodeError::NotAnObject(json_kind(other))),
    };

    Ok(Reading {
        temperature: first_number(fields, &["temperature", "temp"]).unwrap_or(0.0),
        humidity: first_number(fields, &["humidity", "hum"]).unwrap_or(0.0),
        unit: fields
            .get("unit")
            .and_then(Value::as_str)
            .and_then(Unit::from_label)
            .unwrap_or_default(),
        simulation: fields.get("simulation").map(as_flag).unwrap_or(false),
    })
}

/// First key in `keys` holding a usable number
fn first_number(fields: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|key| fields.get(*key).and_then(as_number))
}

/// Finite numbers and numeric strings count; everything else is unusable
fn as_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}

/// Explicit booleans are kept as-is; `0`/`1` and `"true"`/`"false"` are
/// accepted from firmware that cannot emit JSON booleans.
fn as_flag(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => s.trim().eq_ignore_ascii_case("true"),
        _ => false,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
