//! Mock broker link for testing without a real broker.
//!
//! A [`MockConnector`] hands out [`MockLink`]s that replay a scripted event
//! sequence and record every call into a shared [`MockRecorder`] for
//! assertion in tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rumqttc::QoS;

use pubstep_protocol::ConnectionConfig;

use crate::error::{MqttError, MqttResult};
use crate::events::LinkEvent;
use crate::link::{Connector, Link, new_client_id};

/// A scripted event. Cloneable so one script can drive many links.
#[derive(Debug, Clone)]
pub enum MockEvent {
    Connected,
    PublishAcked,
    Closed,
    Error(String),
}

impl MockEvent {
    fn into_link_event(self) -> LinkEvent {
        match self {
            Self::Connected => LinkEvent::Connected,
            Self::PublishAcked => LinkEvent::PublishAcked,
            Self::Closed => LinkEvent::Closed,
            Self::Error(detail) => LinkEvent::Error(MqttError::Connection(detail)),
        }
    }
}

/// A recorded publish call.
#[derive(Debug, Clone)]
pub struct PublishedMessage {
    pub client_id: String,
    pub topic: String,
    pub payload: Vec<u8>,
    pub qos: QoS,
}

#[derive(Debug, Default)]
struct Recorded {
    opened: Vec<ConnectionConfig>,
    client_ids: Vec<String>,
    published: Vec<PublishedMessage>,
    disconnects: usize,
    close_calls: usize,
    releases: usize,
}

/// Shared record of everything the links of one connector did.
#[derive(Debug, Default)]
pub struct MockRecorder {
    inner: Mutex<Recorded>,
}

impl MockRecorder {
    /// Configs passed to `open`, including failed opens.
    pub fn opened(&self) -> Vec<ConnectionConfig> {
        self.inner.lock().unwrap().opened.clone()
    }

    pub fn open_count(&self) -> usize {
        self.inner.lock().unwrap().opened.len()
    }

    pub fn client_ids(&self) -> Vec<String> {
        self.inner.lock().unwrap().client_ids.clone()
    }

    pub fn published(&self) -> Vec<PublishedMessage> {
        self.inner.lock().unwrap().published.clone()
    }

    pub fn disconnects(&self) -> usize {
        self.inner.lock().unwrap().disconnects
    }

    /// Every `close()` call, including no-op repeats and the one from drop.
    pub fn close_calls(&self) -> usize {
        self.inner.lock().unwrap().close_calls
    }

    /// Number of times a link actually released its connection.
    pub fn releases(&self) -> usize {
        self.inner.lock().unwrap().releases
    }
}

/// Mock implementation of the [`Connector`] trait.
///
/// An empty script models a silent broker: `next_event` never resolves.
#[derive(Debug, Clone, Default)]
pub struct MockConnector {
    script: VecDeque<(Duration, MockEvent)>,
    publish_error: Option<String>,
    open_error: Option<String>,
    recorder: Arc<MockRecorder>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// A broker that accepts the session and acknowledges the publish.
    pub fn acking() -> Self {
        Self::new()
            .with_event(MockEvent::Connected)
            .with_event(MockEvent::PublishAcked)
    }

    /// Append an event delivered immediately when polled.
    pub fn with_event(self, event: MockEvent) -> Self {
        self.with_delayed_event(Duration::ZERO, event)
    }

    /// Append an event delivered once a poll has waited `delay` for it.
    pub fn with_delayed_event(mut self, delay: Duration, event: MockEvent) -> Self {
        self.script.push_back((delay, event));
        self
    }

    /// Make every `publish` call fail with `detail`.
    pub fn with_publish_error(mut self, detail: impl Into<String>) -> Self {
        self.publish_error = Some(detail.into());
        self
    }

    /// Make every `open` call fail with `detail`.
    pub fn with_open_error(mut self, detail: impl Into<String>) -> Self {
        self.open_error = Some(detail.into());
        self
    }

    pub fn recorder(&self) -> Arc<MockRecorder> {
        Arc::clone(&self.recorder)
    }
}

impl Connector for MockConnector {
    type Link = MockLink;

    fn open(&self, config: &ConnectionConfig) -> MqttResult<MockLink> {
        self.recorder
            .inner
            .lock()
            .unwrap()
            .opened
            .push(config.clone());

        if let Some(detail) = &self.open_error {
            return Err(MqttError::InvalidOptions(detail.clone()));
        }

        let client_id = new_client_id("mock");
        self.recorder
            .inner
            .lock()
            .unwrap()
            .client_ids
            .push(client_id.clone());

        Ok(MockLink {
            client_id,
            script: self.script.clone(),
            publish_error: self.publish_error.clone(),
            closed: false,
            recorder: Arc::clone(&self.recorder),
        })
    }
}

/// Link handed out by [`MockConnector`].
pub struct MockLink {
    client_id: String,
    script: VecDeque<(Duration, MockEvent)>,
    publish_error: Option<String>,
    closed: bool,
    recorder: Arc<MockRecorder>,
}

#[async_trait]
impl Link for MockLink {
    fn client_id(&self) -> &str {
        &self.client_id
    }

    async fn next_event(&mut self) -> LinkEvent {
        if self.closed {
            return LinkEvent::Closed;
        }
        let Some((delay, _)) = self.script.front() else {
            return std::future::pending().await;
        };
        tokio::time::sleep(*delay).await;

        // Pop only after the delay so a cancelled poll keeps the event.
        let Some((_, event)) = self.script.pop_front() else {
            return std::future::pending().await;
        };
        if matches!(event, MockEvent::Closed) {
            self.close();
        }
        event.into_link_event()
    }

    async fn publish(&mut self, topic: &str, payload: &[u8], qos: QoS) -> MqttResult<()> {
        if self.closed {
            return Err(MqttError::Closed);
        }
        if let Some(detail) = &self.publish_error {
            return Err(MqttError::Publish(detail.clone()));
        }
        self.recorder
            .inner
            .lock()
            .unwrap()
            .published
            .push(PublishedMessage {
                client_id: self.client_id.clone(),
                topic: topic.to_string(),
                payload: payload.to_vec(),
                qos,
            });
        Ok(())
    }

    async fn disconnect(&mut self) -> MqttResult<()> {
        if self.closed {
            return Err(MqttError::Closed);
        }
        self.recorder.inner.lock().unwrap().disconnects += 1;
        self.script.push_front((Duration::ZERO, MockEvent::Closed));
        Ok(())
    }

    fn close(&mut self) {
        let mut recorded = self.recorder.inner.lock().unwrap();
        recorded.close_calls += 1;
        if !self.closed {
            self.closed = true;
            recorded.releases += 1;
        }
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Drop for MockLink {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pubstep_protocol::Transport;

    fn config() -> ConnectionConfig {
        ConnectionConfig {
            host: "broker.local".into(),
            port: 1883,
            transport: Transport::Tcp,
            username: None,
            password: None,
        }
    }

    #[tokio::test]
    async fn replays_script_in_order() {
        let connector = MockConnector::acking();
        let mut link = connector.open(&config()).unwrap();

        assert!(matches!(link.next_event().await, LinkEvent::Connected));
        link.publish("sensors/temp", b"21.5", QoS::AtLeastOnce)
            .await
            .unwrap();
        assert!(matches!(link.next_event().await, LinkEvent::PublishAcked));

        let published = connector.recorder().published();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].topic, "sensors/temp");
        assert_eq!(published[0].payload, b"21.5");
    }

    #[tokio::test]
    async fn disconnect_yields_closed_and_releases() {
        let connector = MockConnector::new().with_event(MockEvent::Connected);
        let recorder = connector.recorder();
        let mut link = connector.open(&config()).unwrap();

        assert!(matches!(link.next_event().await, LinkEvent::Connected));
        link.disconnect().await.unwrap();
        assert!(matches!(link.next_event().await, LinkEvent::Closed));
        assert!(link.is_closed());
        assert_eq!(recorder.disconnects(), 1);
        assert_eq!(recorder.releases(), 1);
    }

    #[tokio::test]
    async fn close_releases_once() {
        let connector = MockConnector::new();
        let recorder = connector.recorder();
        let mut link = connector.open(&config()).unwrap();
        link.close();
        link.close();
        drop(link);

        assert_eq!(recorder.close_calls(), 3);
        assert_eq!(recorder.releases(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn delayed_event_waits() {
        let connector = MockConnector::new()
            .with_delayed_event(Duration::from_secs(5), MockEvent::Connected);
        let mut link = connector.open(&config()).unwrap();

        let start = tokio::time::Instant::now();
        assert!(matches!(link.next_event().await, LinkEvent::Connected));
        assert!(start.elapsed() >= Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_poll_keeps_event() {
        let connector = MockConnector::new()
            .with_delayed_event(Duration::from_secs(5), MockEvent::Connected);
        let mut link = connector.open(&config()).unwrap();

        let early = tokio::time::timeout(Duration::from_secs(1), link.next_event()).await;
        assert!(early.is_err());
        assert!(matches!(link.next_event().await, LinkEvent::Connected));
    }

    #[tokio::test]
    async fn open_error_recorded() {
        let connector = MockConnector::new().with_open_error("bad options");
        let err = connector.open(&config()).err().expect("should fail");
        assert!(matches!(err, MqttError::InvalidOptions(_)));
        assert_eq!(connector.recorder().open_count(), 1);
        assert!(connector.recorder().client_ids().is_empty());
    }

    #[tokio::test]
    async fn publish_error_injected() {
        let connector = MockConnector::acking().with_publish_error("queue full");
        let mut link = connector.open(&config()).unwrap();
        let err = link
            .publish("t", b"m", QoS::AtLeastOnce)
            .await
            .err()
            .expect("should fail");
        assert_eq!(err.detail(), "queue full");
        assert!(connector.recorder().published().is_empty());
    }
}
