//! Raw caller input and the builder that turns it into a validated
//! [`ConnectionConfig`] + [`PublishRequest`] pair.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::connection::{ConnectionConfig, PublishRequest, Transport};
use crate::error::ValidationError;

/// Broker port as supplied by the caller: either a JSON number or a string.
///
/// Numbers keep their JSON form so that whole-valued floats such as `1883.0`
/// are accepted like integers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PortValue {
    Number(serde_json::Number),
    Text(String),
}

impl PortValue {
    /// `0` and `""` count as "not provided".
    fn is_blank(&self) -> bool {
        match self {
            Self::Number(n) => n.as_f64() == Some(0.0),
            Self::Text(s) => s.is_empty(),
        }
    }

    fn to_port(&self) -> Result<u16, ValidationError> {
        let parsed = match self {
            Self::Number(n) => n
                .as_u64()
                .or_else(|| whole_number(n.as_f64()?))
                .and_then(|p| u16::try_from(p).ok()),
            Self::Text(s) => s.parse::<u16>().ok(),
        };
        parsed
            .filter(|p| *p != 0)
            .ok_or_else(|| ValidationError::InvalidPort(self.to_string()))
    }
}

fn whole_number(value: f64) -> Option<u64> {
    (value >= 0.0 && value.fract() == 0.0).then_some(value as u64)
}

impl fmt::Display for PortValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<u16> for PortValue {
    fn from(port: u16) -> Self {
        Self::Number(port.into())
    }
}

/// Input record supplied by the calling pipeline.
///
/// Every field is optional here so that a missing field surfaces as a
/// [`ValidationError`] rather than a decode failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepInput {
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<PortValue>,
    /// `"tcp"` or `"ws"`.
    #[serde(default)]
    pub protocol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
    /// Message body to publish.
    #[serde(default)]
    pub message: Option<String>,
}

impl StepInput {
    /// Decode an input record from JSON.
    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }

    /// Validate and normalize into connection + publish parameters.
    ///
    /// Pure: performs no I/O. Missing-field checks run before the protocol
    /// check, which runs before the port range check.
    pub fn validate(&self) -> Result<(ConnectionConfig, PublishRequest), ValidationError> {
        let (Some(host), Some(port), Some(protocol), Some(topic), Some(message)) = (
            present(&self.host),
            self.port.as_ref().filter(|p| !p.is_blank()),
            present(&self.protocol),
            present(&self.topic),
            present(&self.message),
        ) else {
            return Err(ValidationError::MissingInputs);
        };

        let transport: Transport = protocol.parse()?;
        let port = port.to_port()?;

        let config = ConnectionConfig {
            host: host.to_string(),
            port,
            transport,
            username: present(&self.username).map(str::to_string),
            password: present(&self.password).map(str::to_string),
        };
        Ok((config, PublishRequest::new(topic, message)))
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
