//! Broker link: one owned MQTT connection per publish invocation.
//!
//! Wraps `rumqttc::AsyncClient` + `EventLoop` behind the [`Link`] trait so
//! the orchestrator can be driven by a mock in tests.

use async_trait::async_trait;
use rumqttc::{AsyncClient, EventLoop, NetworkOptions, QoS};
use uuid::Uuid;

use pubstep_protocol::{ConnectionConfig, DeliveryQos};

use crate::config::LinkSettings;
use crate::error::{MqttError, MqttResult};
use crate::events::{self, LinkEvent};
use crate::transport;

// ── Traits ────────────────────────────────────────────────────

/// A live (or connecting) broker connection, exclusively owned by one
/// invocation.
#[async_trait]
pub trait Link: Send {
    /// Client identifier presented to the broker.
    fn client_id(&self) -> &str;

    /// Drive the connection until the next relevant event.
    ///
    /// Must be cancel-safe: dropping the future loses no state the
    /// orchestrator depends on. A closed link yields [`LinkEvent::Closed`].
    async fn next_event(&mut self) -> LinkEvent;

    /// Issue a publish. Completion is reported through [`Link::next_event`].
    async fn publish(&mut self, topic: &str, payload: &[u8], qos: QoS) -> MqttResult<()>;

    /// Request a graceful disconnect, reported as [`LinkEvent::Closed`].
    async fn disconnect(&mut self) -> MqttResult<()>;

    /// Release the network resource immediately. Idempotent, never fails.
    fn close(&mut self);

    fn is_closed(&self) -> bool;
}

/// Factory for links. Constructing a link performs no network I/O.
pub trait Connector: Send + Sync {
    type Link: Link;

    fn open(&self, config: &ConnectionConfig) -> MqttResult<Self::Link>;
}

/// Fresh client id, unique per call.
pub fn new_client_id(prefix: &str) -> String {
    format!("{prefix}_{}", Uuid::now_v7().simple())
}

/// Wire QoS for a requested delivery guarantee.
pub fn wire_qos(qos: DeliveryQos) -> QoS {
    match qos {
        DeliveryQos::AtLeastOnce => QoS::AtLeastOnce,
    }
}

// ── MqttConnector ─────────────────────────────────────────────

/// Connector backed by `rumqttc`.
#[derive(Debug, Clone, Default)]
pub struct MqttConnector {
    settings: LinkSettings,
}

impl MqttConnector {
    pub fn new(settings: LinkSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &LinkSettings {
        &self.settings
    }
}

impl Connector for MqttConnector {
    type Link = MqttLink;

    fn open(&self, config: &ConnectionConfig) -> MqttResult<MqttLink> {
        let client_id = new_client_id(&self.settings.client_id_prefix);
        let options = transport::build_options(config, &self.settings, &client_id)?;

        let (client, mut eventloop) = AsyncClient::new(options, self.settings.request_capacity);
        let mut network_options = NetworkOptions::new();
        network_options.set_connection_timeout(self.settings.connect_timeout_secs);
        eventloop.set_network_options(network_options);

        tracing::debug!(client_id = %client_id, url = %config.url(), "link opened");

        Ok(MqttLink {
            client,
            eventloop: Some(eventloop),
            client_id,
            inflight: None,
        })
    }
}

// ── MqttLink ──────────────────────────────────────────────────

/// `rumqttc` connection. The event loop owns the socket; dropping it
/// releases the connection.
pub struct MqttLink {
    client: AsyncClient,
    eventloop: Option<EventLoop>,
    client_id: String,
    inflight: Option<u16>,
}

#[async_trait]
impl Link for MqttLink {
    fn client_id(&self) -> &str {
        &self.client_id
    }

    async fn next_event(&mut self) -> LinkEvent {
        loop {
            let Some(eventloop) = self.eventloop.as_mut() else {
                return LinkEvent::Closed;
            };

            match eventloop.poll().await {
                Ok(event) => {
                    tracing::trace!(client_id = %self.client_id, ?event, "mqtt event");
                    if let Some(link_event) = events::classify(&event, &mut self.inflight) {
                        if matches!(link_event, LinkEvent::Closed) {
                            self.close();
                        }
                        return link_event;
                    }
                }
                Err(e) => return LinkEvent::Error(events::connection_error(e)),
            }
        }
    }

    async fn publish(&mut self, topic: &str, payload: &[u8], qos: QoS) -> MqttResult<()> {
        if self.is_closed() {
            return Err(MqttError::Closed);
        }
        self.client
            .publish(topic, qos, false, payload.to_vec())
            .await
            .map_err(|e| MqttError::Publish(e.to_string()))
    }

    async fn disconnect(&mut self) -> MqttResult<()> {
        if self.is_closed() {
            return Err(MqttError::Closed);
        }
        self.client
            .disconnect()
            .await
            .map_err(|e| MqttError::Disconnect(e.to_string()))
    }

    fn close(&mut self) {
        if self.eventloop.take().is_some() {
            tracing::debug!(client_id = %self.client_id, "link released");
        }
    }

    fn is_closed(&self) -> bool {
        self.eventloop.is_none()
    }
}

impl Drop for MqttLink {
    fn drop(&mut self) {
        self.close();
    }
}
