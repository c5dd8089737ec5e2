//! Shared test harness for E2E integration tests.
//!
//! Ways to drive the full flow:
//! - `TestHarness` runs the real `Publisher` against a scripted `MockConnector`.
//! - `FakeBroker` is a loopback MQTT 3.1.1 server for the real `rumqttc` link.
//! - `RejectingWsServer` refuses WebSocket upgrades, for the `ws` transport.

#![allow(dead_code)]

use std::sync::Arc;

use serde_json::{Value, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use pubstep_link::{MockConnector, MockRecorder};
use pubstep_protocol::StepOutput;
use pubstep_runner::{Publisher, RunnerConfig};

/// Publisher wired to a mock connector, with its shared recorder.
pub struct TestHarness {
    pub publisher: Publisher<MockConnector>,
    /// Everything the mock links did.
    pub recorder: Arc<MockRecorder>,
}

impl TestHarness {
    /// Harness with the default 30 second deadline.
    pub fn new(connector: MockConnector) -> Self {
        Self::with_config(connector, RunnerConfig::default())
    }

    pub fn with_config(connector: MockConnector, config: RunnerConfig) -> Self {
        let recorder = connector.recorder();
        Self {
            publisher: Publisher::new(connector, config),
            recorder,
        }
    }

    /// Run a raw JSON input record through the full step.
    pub async fn run(&self, input: &Value) -> StepOutput {
        self.publisher.run_json(&input.to_string()).await
    }
}

/// The canonical valid input record.
pub fn sample_input() -> Value {
    json!({
        "host": "broker.local",
        "port": 1883,
        "protocol": "tcp",
        "topic": "sensors/temp",
        "message": "21.5",
    })
}

/// Input record pointing at a loopback port.
pub fn loopback_input(port: u16) -> Value {
    let mut input = sample_input();
    input["host"] = json!("127.0.0.1");
    input["port"] = json!(port);
    input
}

// ── Fake broker ───────────────────────────────────────────────

/// How the fake broker answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrokerMode {
    /// Accept the session and acknowledge QoS 1 publishes.
    Ack,
    /// Accept the session but never acknowledge publishes.
    NoPubAck,
    /// Refuse the session with return code 5 (not authorized).
    Refuse,
    /// Accept the TCP connection and never answer.
    Silent,
}

/// What the fake broker observed on its single connection.
#[derive(Debug, Clone, Default)]
pub struct BrokerLog {
    pub client_id: Option<String>,
    pub username: Option<String>,
    pub clean_session: bool,
    /// `(topic, qos, payload)` per PUBLISH.
    pub published: Vec<(String, u8, Vec<u8>)>,
    pub disconnected: bool,
}

/// Loopback MQTT 3.1.1 server accepting exactly one connection.
pub struct FakeBroker {
    pub port: u16,
    handle: JoinHandle<BrokerLog>,
}

impl FakeBroker {
    pub async fn start(mode: BrokerMode) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            serve(&mut socket, mode).await
        });
        Self { port, handle }
    }

    /// Wait for the client to go away and return what was observed.
    pub async fn finish(self) -> BrokerLog {
        self.handle.await.unwrap()
    }
}

/// A loopback port with nothing listening on it.
pub async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

/// HTTP endpoint that answers any WebSocket upgrade with `404` and hangs up.
pub struct RejectingWsServer {
    pub port: u16,
    handle: JoinHandle<String>,
}

impl RejectingWsServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let head = read_http_head(&mut socket).await;
            let _ = socket
                .write_all(b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\n\r\n")
                .await;
            head
        });
        Self { port, handle }
    }

    /// The request head the client sent (request line plus headers).
    pub async fn request_head(self) -> String {
        self.handle.await.unwrap()
    }
}

async fn read_http_head(socket: &mut TcpStream) -> String {
    let mut head = Vec::new();
    while !head.ends_with(b"\r\n\r\n") {
        match socket.read_u8().await {
            Ok(byte) => head.push(byte),
            Err(_) => break,
        }
    }
    String::from_utf8_lossy(&head).into_owned()
}

async fn serve(socket: &mut TcpStream, mode: BrokerMode) -> BrokerLog {
    let mut log = BrokerLog::default();

    while let Some((header, body)) = read_packet(socket).await {
        match header >> 4 {
            // CONNECT
            1 => {
                parse_connect(&body, &mut log);
                let code = match mode {
                    BrokerMode::Silent => continue,
                    BrokerMode::Refuse => 0x05,
                    BrokerMode::Ack | BrokerMode::NoPubAck => 0x00,
                };
                if socket.write_all(&[0x20, 0x02, 0x00, code]).await.is_err() {
                    break;
                }
            }
            // PUBLISH
            3 => {
                let qos = (header >> 1) & 0x03;
                let topic_len = u16::from_be_bytes([body[0], body[1]]) as usize;
                let topic = String::from_utf8_lossy(&body[2..2 + topic_len]).into_owned();
                let mut rest = &body[2 + topic_len..];
                let pkid = if qos > 0 {
                    let pkid = [rest[0], rest[1]];
                    rest = &rest[2..];
                    Some(pkid)
                } else {
                    None
                };
                log.published.push((topic, qos, rest.to_vec()));

                if let (BrokerMode::Ack, Some([hi, lo])) = (mode, pkid) {
                    if socket.write_all(&[0x40, 0x02, hi, lo]).await.is_err() {
                        break;
                    }
                }
            }
            // PINGREQ
            12 => {
                if socket.write_all(&[0xD0, 0x00]).await.is_err() {
                    break;
                }
            }
            // DISCONNECT
            14 => {
                log.disconnected = true;
                break;
            }
            _ => {}
        }
    }

    log
}

async fn read_packet(socket: &mut TcpStream) -> Option<(u8, Vec<u8>)> {
    let header = socket.read_u8().await.ok()?;

    let mut len = 0usize;
    let mut shift = 0;
    loop {
        let byte = socket.read_u8().await.ok()?;
        len |= usize::from(byte & 0x7F) << shift;
        if byte & 0x80 == 0 {
            break;
        }
        shift += 7;
    }

    let mut body = vec![0u8; len];
    socket.read_exact(&mut body).await.ok()?;
    Some((header, body))
}

fn parse_connect(body: &[u8], log: &mut BrokerLog) {
    let mut cursor = body;
    let _protocol_name = take_string(&mut cursor);
    let _level = cursor[0];
    let flags = cursor[1];
    cursor = &cursor[4..]; // level, flags, keep-alive

    log.clean_session = flags & 0x02 != 0;
    log.client_id = Some(take_string(&mut cursor));
    if flags & 0x04 != 0 {
        let _will_topic = take_string(&mut cursor);
        let _will_payload = take_string(&mut cursor);
    }
    if flags & 0x80 != 0 {
        log.username = Some(take_string(&mut cursor));
    }
}

fn take_string(cursor: &mut &[u8]) -> String {
    let len = u16::from_be_bytes([cursor[0], cursor[1]]) as usize;
    let value = String::from_utf8_lossy(&cursor[2..2 + len]).into_owned();
    *cursor = &cursor[2 + len..];
    value
}
