//! Transport selection for broker links.
//!
//! Maps a validated [`ConnectionConfig`] onto `rumqttc` options: broker
//! address, TCP or WebSocket transport, credentials, and session settings.

use std::time::Duration;

use rumqttc::MqttOptions;

use pubstep_protocol::{ConnectionConfig, Transport};

use crate::config::LinkSettings;
use crate::error::{MqttError, MqttResult};

/// Broker address handed to `rumqttc`.
///
/// TCP takes the bare host. WebSocket takes the full upgrade URL
/// (`ws://host:port/path`), which `rumqttc` parses itself.
pub fn broker_address(config: &ConnectionConfig, settings: &LinkSettings) -> String {
    match config.transport {
        Transport::Tcp => config.host.clone(),
        Transport::Websocket => {
            let path = settings.ws_path.trim_start_matches('/');
            format!("{}/{path}", config.url())
        }
    }
}

/// The `rumqttc` transport for a validated transport kind.
pub fn rumqttc_transport(transport: Transport) -> rumqttc::Transport {
    match transport {
        Transport::Tcp => rumqttc::Transport::Tcp,
        Transport::Websocket => rumqttc::Transport::Ws,
    }
}

/// Build MQTT options for a single clean-session publish link.
pub fn build_options(
    config: &ConnectionConfig,
    settings: &LinkSettings,
    client_id: &str,
) -> MqttResult<MqttOptions> {
    // rumqttc panics on these; reject them as invalid options instead.
    if client_id.is_empty() || client_id.starts_with(' ') {
        return Err(MqttError::InvalidOptions(format!(
            "invalid client id '{client_id}'"
        )));
    }

    let mut options = MqttOptions::new(client_id, broker_address(config, settings), config.port);
    options.set_transport(rumqttc_transport(config.transport));
    options.set_clean_session(true);
    options.set_keep_alive(Duration::from_secs(settings.keepalive_secs.into()));
    options.set_max_packet_size(settings.max_packet_size, settings.max_packet_size);

    match (&config.username, &config.password) {
        (Some(username), password) => {
            options.set_credentials(username, password.as_deref().unwrap_or_default());
        }
        (None, Some(_)) => {
            tracing::warn!(
                client_id,
                "password supplied without username, connecting without credentials"
            );
        }
        (None, None) => {}
    }

    Ok(options)
}
