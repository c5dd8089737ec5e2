//! Publish state machine.
//!
//! Pure transition logic for one invocation:
//!
//! ```text
//! Idle → Connecting → Publishing → Closing → Done(success)
//!            │             │           │
//!            └─────────────┴───────────┴──→ Done(failure)
//! ```
//!
//! The driver in [`crate::publisher`] feeds [`Trigger`]s in and executes the
//! returned [`Effect`]s. `Done` is terminal: once reached, every trigger is
//! discarded and `Resolve` can never be emitted a second time.

use std::time::Duration;

use pubstep_link::LinkEvent;
use pubstep_protocol::{Outcome, StepError};

/// Where the invocation currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Connecting,
    Publishing,
    Closing,
    Done { success: bool },
}

/// Something that happened: a link event, the deadline, or a failed action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    Start,
    Connected,
    PublishAcked,
    PublishFailed(String),
    Closed,
    DeadlineElapsed,
    TransportError(String),
}

impl From<LinkEvent> for Trigger {
    fn from(event: LinkEvent) -> Self {
        match event {
            LinkEvent::Connected => Self::Connected,
            LinkEvent::PublishAcked => Self::PublishAcked,
            LinkEvent::Closed => Self::Closed,
            LinkEvent::Error(e) => Self::TransportError(e.detail().to_string()),
        }
    }
}

/// Action the driver must carry out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Issue the QoS 1 publish.
    Publish,
    /// Request a graceful disconnect.
    Disconnect,
    /// Release the link now. Safe to repeat.
    ForceClose,
    /// Hand the outcome to the caller. Emitted at most once.
    Resolve(Outcome),
}

/// State machine for a single connect → publish → close sequence.
#[derive(Debug)]
pub struct PublishMachine {
    phase: Phase,
    topic: String,
    deadline: Duration,
}

impl PublishMachine {
    pub fn new(topic: impl Into<String>, deadline: Duration) -> Self {
        Self {
            phase: Phase::Idle,
            topic: topic.into(),
            deadline,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_done(&self) -> bool {
        matches!(self.phase, Phase::Done { .. })
    }

    /// Apply a trigger and return the effects to execute, in order.
    pub fn advance(&mut self, trigger: Trigger) -> Vec<Effect> {
        match (self.phase, trigger) {
            (Phase::Done { .. }, trigger) => {
                tracing::debug!(?trigger, "discarding event after resolution");
                Vec::new()
            }
            (Phase::Idle, Trigger::Start) => {
                self.phase = Phase::Connecting;
                Vec::new()
            }
            (Phase::Idle, trigger) => {
                tracing::debug!(?trigger, "ignoring event before start");
                Vec::new()
            }
            (_, Trigger::DeadlineElapsed) => self.fail(StepError::Timeout {
                secs: self.deadline.as_secs(),
            }),
            (_, Trigger::TransportError(detail)) => self.fail(StepError::Connection(detail)),
            (Phase::Connecting, Trigger::Connected) => {
                self.phase = Phase::Publishing;
                vec![Effect::Publish]
            }
            (Phase::Publishing, Trigger::PublishAcked) => {
                self.phase = Phase::Closing;
                vec![Effect::Disconnect]
            }
            (Phase::Publishing, Trigger::PublishFailed(detail)) => {
                self.fail(StepError::Publish(detail))
            }
            (Phase::Closing, Trigger::Closed) => {
                self.phase = Phase::Done { success: true };
                vec![
                    Effect::ForceClose,
                    Effect::Resolve(Outcome::published(&self.topic)),
                ]
            }
            (Phase::Connecting | Phase::Publishing, Trigger::Closed) => self.fail(
                StepError::Connection("connection closed before publish completed".to_string()),
            ),
            (phase, trigger) => {
                tracing::debug!(?phase, ?trigger, "ignoring event");
                Vec::new()
            }
        }
    }

    fn fail(&mut self, err: StepError) -> Vec<Effect> {
        self.phase = Phase::Done { success: false };
        vec![Effect::ForceClose, Effect::Resolve(Outcome::from(err))]
    }
}
