//! One-shot MQTT publish step: library crate.
//!
//! Exposes the state machine, the deadline-racing `Publisher`, and runner
//! configuration so external crates (e.g. `pubstep-e2e-tests`) can drive
//! invocations against mock or real connectors.

pub mod config;
pub mod machine;
pub mod publisher;

pub use config::{MAX_DEADLINE_SECS, RunnerConfig};
pub use machine::{Effect, Phase, PublishMachine, Trigger};
pub use publisher::{Publisher, run};
