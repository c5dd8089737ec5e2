//! MQTT link error types.

use thiserror::Error;

/// Errors that can occur on a broker link.
#[derive(Debug, Error)]
pub enum MqttError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("publish error: {0}")]
    Publish(String),

    #[error("disconnect error: {0}")]
    Disconnect(String),

    #[error("invalid connection options: {0}")]
    InvalidOptions(String),

    #[error("link already closed")]
    Closed,
}

impl MqttError {
    /// The underlying message without the category prefix.
    pub fn detail(&self) -> &str {
        match self {
            Self::Connection(d)
            | Self::Publish(d)
            | Self::Disconnect(d)
            | Self::InvalidOptions(d) => d,
            Self::Closed => "link already closed",
        }
    }
}

/// Convenience alias for MQTT results.
pub type MqttResult<T> = Result<T, MqttError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_strips_prefix() {
        let err = MqttError::Connection("connection refused".into());
        assert_eq!(err.to_string(), "connection error: connection refused");
        assert_eq!(err.detail(), "connection refused");
        assert_eq!(MqttError::Closed.detail(), "link already closed");
    }
}
