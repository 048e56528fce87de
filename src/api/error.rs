//! API Error Types

use thiserror::Error;

/// Errors that stop the HTTP server
#[derive(Error, Debug)]
pub enum ApiError {
    /// Listener could not be bound; the only fatal startup error
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// IO error while serving
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_error_display() {
        let err = ApiError::Bind {
            addr: "0.0.0.0:3001".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::AddrInUse, "address in use"),
        };
        assert_eq!(err.to_string(), "Failed to bind 0.0.0.0:3001: address in use");
    }
}
