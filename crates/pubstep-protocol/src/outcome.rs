use serde::{Deserialize, Serialize};

use crate::error::StepError;

/// Terminal value of one publish step invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Success { message: String },
    Failure { reason: String },
}

impl Outcome {
    /// Success confirmation for a message acknowledged on `topic`.
    pub fn published(topic: &str) -> Self {
        Self::Success {
            message: format!("Message published successfully to topic: {topic}"),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Success message or failure reason.
    pub fn message(&self) -> &str {
        match self {
            Self::Success { message } => message,
            Self::Failure { reason } => reason,
        }
    }
}

impl From<StepError> for Outcome {
    fn from(err: StepError) -> Self {
        Self::Failure {
            reason: err.to_string(),
        }
    }
}

/// Output record returned to the calling pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepOutput {
    pub success: bool,
    /// Success confirmation or human-readable failure reason.
    pub message: String,
}

impl From<Outcome> for StepOutput {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Success { message } => Self {
                success: true,
                message,
            },
            Outcome::Failure { reason } => Self {
                success: false,
                message: reason,
            },
        }
    }
}
