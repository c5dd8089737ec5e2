use serde::Deserialize;

/// Per-link MQTT tuning, loadable from the `[link]` table of the runner config.
#[derive(Debug, Clone, Deserialize)]
pub struct LinkSettings {
    /// Prefix of the generated client id (`{prefix}_{uuid}`).
    #[serde(default = "default_client_id_prefix")]
    pub client_id_prefix: String,
    /// Keep-alive interval in seconds.
    #[serde(default = "default_keepalive")]
    pub keepalive_secs: u16,
    /// TCP/WebSocket connect timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Max incoming and outgoing MQTT packet size in bytes.
    #[serde(default = "default_max_packet_size")]
    pub max_packet_size: usize,
    /// HTTP path used for the WebSocket upgrade.
    #[serde(default = "default_ws_path")]
    pub ws_path: String,
    /// Capacity of the client request channel.
    #[serde(default = "default_request_capacity")]
    pub request_capacity: usize,
}

impl Default for LinkSettings {
    fn default() -> Self {
        Self {
            client_id_prefix: default_client_id_prefix(),
            keepalive_secs: default_keepalive(),
            connect_timeout_secs: default_connect_timeout(),
            max_packet_size: default_max_packet_size(),
            ws_path: default_ws_path(),
            request_capacity: default_request_capacity(),
        }
    }
}

fn default_client_id_prefix() -> String {
    "pubstep".to_string()
}

fn default_keepalive() -> u16 {
    60
}

fn default_connect_timeout() -> u64 {
    30
}

fn default_max_packet_size() -> usize {
    256 * 1024
}

fn default_ws_path() -> String {
    "/mqtt".to_string()
}

fn default_request_capacity() -> usize {
    10
}
