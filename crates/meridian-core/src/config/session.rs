//! Session management configuration.

use serde::{Deserialize, Serialize};

/// Session management configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Absolute session lifetime in hours, applied at creation time.
    #[serde(default = "default_absolute_timeout")]
    pub absolute_timeout_hours: u64,
    /// Idle timeout in minutes before a session is considered inactive.
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_minutes: u64,
    /// Interval for the expired-session sweep in minutes.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_minutes: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            absolute_timeout_hours: default_absolute_timeout(),
            idle_timeout_minutes: default_idle_timeout(),
            sweep_interval_minutes: default_sweep_interval(),
        }
    }
}

fn default_absolute_timeout() -> u64 {
    24
}

fn default_idle_timeout() -> u64 {
    30
}

fn default_sweep_interval() -> u64 {
    15
}
