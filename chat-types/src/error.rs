//! Error types for simple-chat wire handling.

use thiserror::Error;

/// Errors raised while encoding or decoding wire frames.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// JSON serialization failed
    #[error("serialization failed: {0}")]
    Serialization(#[source] serde_json::Error),

    /// JSON deserialization failed
    #[error("deserialization failed: {0}")]
    Deserialization(#[source] serde_json::Error),

    /// Request channel name not recognised
    #[error("unknown channel: {0}")]
    UnknownChannel(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ProtocolError::UnknownChannel("typing".into());
        assert_eq!(err.to_string(), "unknown channel: typing");
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ProtocolError>();
    }
}
