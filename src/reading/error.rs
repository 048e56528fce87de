//! Reading decode errors

use thiserror::Error;

/// Errors raised while decoding a broker payload into a `Reading`
#[derive(Error, Debug)]
pub enum DecodeError {
    /// Payload is not well-formed JSON (truncated, invalid UTF-8, ...)
    #[error("Malformed payload: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Payload is valid JSON but not an object
    #[error("Payload is a JSON {0}, expected an object")]
    NotAnObject(&'static str),
}

/// Result type alias for decode operations
pub type DecodeResult<T> = Result<T, DecodeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DecodeError::NotAnObject("array");
        assert_eq!(err.to_string(), "Payload is a JSON array, expected an object");
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{\"temp\":").unwrap_err();
        let err: DecodeError = json_err.into();
        assert!(matches!(err, DecodeError::Malformed(_)));
    }
}
