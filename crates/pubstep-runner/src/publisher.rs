//! Publish orchestrator.
//!
//! Opens one link per invocation, races the deadline against link events,
//! and feeds everything through [`PublishMachine`]. The machine's single
//! `Resolve` effect is the only place an outcome leaves this module.

use std::collections::VecDeque;

use tokio::time::{Instant, sleep_until, timeout_at};

use pubstep_link::{Connector, Link, LinkSettings, MqttConnector, wire_qos};
use pubstep_protocol::{
    ConnectionConfig, Outcome, PublishRequest, StepError, StepInput, StepOutput,
};

use crate::config::RunnerConfig;
use crate::machine::{Effect, PublishMachine, Trigger};

/// Runs publish step invocations against links from connector `C`.
///
/// Holds no per-invocation state, so one publisher can serve any number of
/// concurrent invocations.
pub struct Publisher<C> {
    connector: C,
    config: RunnerConfig,
}

impl Publisher<MqttConnector> {
    /// Publisher backed by a real `rumqttc` connector.
    pub fn from_config(config: RunnerConfig) -> Self {
        let settings: LinkSettings = config.link.clone();
        Self::new(MqttConnector::new(settings), config)
    }
}

impl<C: Connector> Publisher<C> {
    pub fn new(connector: C, config: RunnerConfig) -> Self {
        Self { connector, config }
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Decode a raw JSON input record and run it.
    pub async fn run_json(&self, raw: &str) -> StepOutput {
        match StepInput::from_json(raw) {
            Ok(input) => self.run(&input).await,
            Err(e) => {
                tracing::warn!(error = %e, "undecodable step input");
                Outcome::from(StepError::Unknown(e.to_string())).into()
            }
        }
    }

    /// Validate the input record and publish. Never fails: every error is
    /// folded into the returned output record.
    pub async fn run(&self, input: &StepInput) -> StepOutput {
        match input.validate() {
            Ok((config, request)) => self.publish(&config, &request).await.into(),
            Err(e) => {
                tracing::warn!(error = %e, "rejected step input");
                Outcome::from(StepError::from(e)).into()
            }
        }
    }

    /// Connect, publish `request` once, and tear down.
    ///
    /// Resolves exactly once, no later than the configured deadline, and
    /// always releases the link before returning.
    pub async fn publish(&self, config: &ConnectionConfig, request: &PublishRequest) -> Outcome {
        let url = config.url();
        let mut link = match self.connector.open(config) {
            Ok(link) => link,
            Err(e) => {
                tracing::error!(url = %url, error = %e, "failed to open link");
                return StepError::Connection(e.detail().to_string()).into();
            }
        };
        let expires = Instant::now() + self.config.deadline();
        let client_id = link.client_id().to_string();

        tracing::info!(
            client_id = %client_id,
            url = %url,
            topic = %request.topic,
            deadline_secs = self.config.deadline().as_secs(),
            "connecting to MQTT broker"
        );

        let mut machine = PublishMachine::new(&request.topic, self.config.deadline());
        let deadline = sleep_until(expires);
        tokio::pin!(deadline);

        let mut pending = VecDeque::from([Trigger::Start]);
        loop {
            while let Some(trigger) = pending.pop_front() {
                for effect in machine.advance(trigger) {
                    match effect {
                        Effect::Publish => {
                            tracing::info!(client_id = %client_id, url = %url, "connected to MQTT broker");
                            let publish = link.publish(
                                &request.topic,
                                request.payload.as_bytes(),
                                wire_qos(request.qos),
                            );
                            match timeout_at(expires, publish).await {
                                Ok(Ok(())) => {}
                                Ok(Err(e)) => {
                                    pending.push_back(Trigger::PublishFailed(e.detail().to_string()))
                                }
                                Err(_) => pending.push_back(Trigger::DeadlineElapsed),
                            }
                        }
                        Effect::Disconnect => {
                            tracing::info!(
                                client_id = %client_id,
                                topic = %request.topic,
                                "published message to topic"
                            );
                            match timeout_at(expires, link.disconnect()).await {
                                Ok(Ok(())) => {}
                                Ok(Err(e)) => {
                                    pending.push_back(Trigger::TransportError(e.detail().to_string()))
                                }
                                Err(_) => pending.push_back(Trigger::DeadlineElapsed),
                            }
                        }
                        Effect::ForceClose => link.close(),
                        Effect::Resolve(outcome) => {
                            if outcome.is_success() {
                                tracing::info!(client_id = %client_id, "{}", outcome.message());
                            } else {
                                tracing::warn!(
                                    client_id = %client_id,
                                    phase = ?machine.phase(),
                                    reason = %outcome.message(),
                                    "publish step failed"
                                );
                            }
                            return outcome;
                        }
                    }
                }
            }

            let trigger = tokio::select! {
                biased;
                () = &mut deadline => Trigger::DeadlineElapsed,
                event = link.next_event() => Trigger::from(event),
            };
            tracing::trace!(client_id = %client_id, ?trigger, "link trigger");
            pending.push_back(trigger);
        }
    }
}

/// Run one invocation with a real `rumqttc` connector and default settings.
pub async fn run(input: &StepInput) -> StepOutput {
    Publisher::from_config(RunnerConfig::default())
        .run(input)
        .await
}
