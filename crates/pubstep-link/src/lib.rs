//! Broker link for the one-shot MQTT publish step.
//!
//! Provides the transport connector the publish orchestrator drives:
//! - `Connector` / `Link` traits (mockable in tests)
//! - `MqttConnector` backed by `rumqttc`, over TCP or WebSocket
//! - `LinkEvent` classification of raw `rumqttc` events
//! - `MockConnector` for testing without a broker

pub mod config;
pub mod error;
pub mod events;
pub mod link;
pub mod mock;
pub mod transport;

// Re-exports for convenience.
pub use config::LinkSettings;
pub use error::{MqttError, MqttResult};
pub use events::{LinkEvent, classify};
pub use link::{Connector, Link, MqttConnector, MqttLink, new_client_id, wire_qos};
pub use mock::{MockConnector, MockEvent, MockLink, MockRecorder, PublishedMessage};
