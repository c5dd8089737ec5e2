//! Error taxonomy for a publish step invocation.
//!
//! The `Display` output of [`StepError`] is the human-readable failure reason
//! handed back to the caller.

use thiserror::Error;

/// Invalid or missing caller input, detected before any network activity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Missing required inputs: host, port, protocol, topic, and message are required")]
    MissingInputs,

    #[error("Protocol must be either 'tcp' or 'ws'")]
    InvalidProtocol,

    #[error("Port must be an integer between 1 and 65535, got '{0}'")]
    InvalidPort(String),
}

/// Every way a publish step can fail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StepError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("MQTT connection timeout after {secs} seconds")]
    Timeout { secs: u64 },

    #[error("Failed to publish message: {0}")]
    Publish(String),

    #[error("Automation error: {0}")]
    Unknown(String),
}
