use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Byte-stream mechanism carrying the MQTT frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transport {
    /// Raw TCP socket (`tcp://`).
    #[serde(rename = "tcp")]
    Tcp,
    /// WebSocket (`ws://`).
    #[serde(rename = "ws")]
    Websocket,
}

impl Transport {
    /// URL scheme used when addressing the broker.
    pub fn scheme(self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
            Self::Websocket => "ws",
        }
    }
}

impl FromStr for Transport {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tcp" => Ok(Self::Tcp),
            "ws" => Ok(Self::Websocket),
            _ => Err(ValidationError::InvalidProtocol),
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.scheme())
    }
}

/// Validated broker connection parameters. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionConfig {
    /// Broker hostname or IP address.
    pub host: String,
    /// Broker port (never 0).
    pub port: u16,
    /// Transport used to reach the broker.
    pub transport: Transport,
    /// Optional username passed through to the broker.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Optional password passed through to the broker.
    #[serde(skip_serializing)]
    pub password: Option<String>,
}

impl ConnectionConfig {
    /// Broker address in `transport://host:port` form.
    pub fn url(&self) -> String {
        format!("{}://{}:{}", self.transport, self.host, self.port)
    }
}

/// Delivery guarantee requested for the publish. Only "at least once" is offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryQos {
    #[default]
    AtLeastOnce,
}

/// The single message to publish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishRequest {
    /// Target topic (never empty).
    pub topic: String,
    /// Message body, sent as UTF-8 bytes.
    pub payload: String,
    pub qos: DeliveryQos,
}

impl PublishRequest {
    pub fn new(topic: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
            qos: DeliveryQos::AtLeastOnce,
        }
    }
}
