//! Classification of raw `rumqttc` events into link events.
//!
//! The orchestrator only cares about four things: the broker accepted the
//! session, the publish was acknowledged, the link closed, or something
//! failed. Everything else (pings, outgoing bookkeeping) is dropped here.

use rumqttc::{ConnectReturnCode, ConnectionError, Event, Outgoing, Packet};

use crate::error::MqttError;

/// Network-level notification surfaced by a live link.
#[derive(Debug)]
pub enum LinkEvent {
    /// Broker accepted the session (successful CONNACK).
    Connected,
    /// Broker acknowledged the in-flight QoS 1 publish.
    PublishAcked,
    /// Graceful disconnect completed; the link is released.
    Closed,
    /// Transport or protocol failure.
    Error(MqttError),
}

/// Classify a raw event, tracking the packet id of the in-flight publish.
///
/// Only a PUBACK for the packet id recorded by the outgoing PUBLISH counts
/// as an acknowledgement.
pub fn classify(event: &Event, inflight: &mut Option<u16>) -> Option<LinkEvent> {
    match event {
        Event::Incoming(Packet::ConnAck(ack)) if ack.code == ConnectReturnCode::Success => {
            Some(LinkEvent::Connected)
        }
        Event::Incoming(Packet::ConnAck(ack)) => Some(LinkEvent::Error(MqttError::Connection(
            format!("broker refused connection: {:?}", ack.code),
        ))),
        Event::Outgoing(Outgoing::Publish(pkid)) => {
            *inflight = Some(*pkid);
            None
        }
        Event::Incoming(Packet::PubAck(ack)) if *inflight == Some(ack.pkid) => {
            *inflight = None;
            Some(LinkEvent::PublishAcked)
        }
        Event::Incoming(Packet::Disconnect) => Some(LinkEvent::Error(MqttError::Connection(
            "broker closed the connection".to_string(),
        ))),
        Event::Outgoing(Outgoing::Disconnect) => Some(LinkEvent::Closed),
        _ => None,
    }
}

/// Map an event loop failure to a link error.
pub fn connection_error(err: ConnectionError) -> MqttError {
    match err {
        ConnectionError::ConnectionRefused(code) => {
            MqttError::Connection(format!("broker refused connection: {code:?}"))
        }
        other => MqttError::Connection(other.to_string()),
    }
}
