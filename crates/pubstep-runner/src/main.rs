//! pubstep: publish one MQTT message and report the outcome.
//!
//! Reads one JSON input record from stdin and writes one JSON output record
//! to stdout. Logs go to stderr. An optional first argument names a TOML
//! runner config.

use tokio::io::AsyncReadExt;
use tracing_subscriber::EnvFilter;

use pubstep_runner::{Publisher, RunnerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "pubstep starting");

    // ── Load config ─────────────────────────────────────────────
    let config = match std::env::args().nth(1) {
        Some(path) => {
            let config = RunnerConfig::from_file(&path)?;
            tracing::info!(path = %path, deadline_secs = config.deadline_secs, "config loaded");
            config
        }
        None => RunnerConfig::default(),
    };

    // ── Read input record ───────────────────────────────────────
    let mut raw = String::new();
    tokio::io::stdin().read_to_string(&mut raw).await?;

    // ── Publish ─────────────────────────────────────────────────
    let publisher = Publisher::from_config(config);
    let output = publisher.run_json(&raw).await;

    println!("{}", serde_json::to_string(&output)?);
    Ok(())
}
