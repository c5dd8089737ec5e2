//! Runner configuration, loadable from TOML.

use std::time::Duration;

use pubstep_link::LinkSettings;
use serde::Deserialize;

/// Upper bound accepted for `deadline_secs` (one hour).
pub const MAX_DEADLINE_SECS: u64 = 3600;

/// Top-level configuration for the publish step.
#[derive(Debug, Clone, Deserialize)]
pub struct RunnerConfig {
    /// Deadline for the whole connect → publish → close sequence, measured
    /// from link open. Defaults to 30 seconds.
    #[serde(default = "default_deadline_secs")]
    pub deadline_secs: u64,
    /// MQTT link settings.
    #[serde(default)]
    pub link: LinkSettings,
}

fn default_deadline_secs() -> u64 {
    30
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            deadline_secs: default_deadline_secs(),
            link: LinkSettings::default(),
        }
    }
}

impl RunnerConfig {
    /// Load config from a TOML file path.
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate config from TOML text.
    pub fn from_toml(contents: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make every invocation fail or overflow the
    /// timer.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.deadline_secs == 0 {
            anyhow::bail!("deadline_secs must be greater than 0");
        }

        if self.deadline_secs > MAX_DEADLINE_SECS {
            anyhow::bail!(
                "deadline_secs must be at most {MAX_DEADLINE_SECS}, got {}",
                self.deadline_secs
            );
        }

        Ok(())
    }

    /// Invocation deadline, capped at [`MAX_DEADLINE_SECS`] for configs
    /// built in code without [`RunnerConfig::validate`].
    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.deadline_secs.min(MAX_DEADLINE_SECS))
    }
}
