//! Typed client settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::defaults::{LOG_LEVEL, POLL_INTERVAL_MS, SESSION_LIFETIME_SECS};

/// Complete client configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Authentication session timing.
    pub session: SessionSettings,
    /// Logging output.
    pub logging: LogSettings,
}

/// Timing of the authentication handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Interval between status checks, in milliseconds.
    pub poll_interval_ms: u64,
    /// Maximum lifetime of one attempt, in seconds.
    pub max_lifetime_secs: u64,
}

impl SessionSettings {
    /// Interval between status checks.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Maximum lifetime of one attempt.
    #[must_use]
    pub const fn max_lifetime(&self) -> Duration {
        Duration::from_secs(self.max_lifetime_secs)
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: POLL_INTERVAL_MS,
            max_lifetime_secs: SESSION_LIFETIME_SECS,
        }
    }
}

/// Logging output selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Level filter (`info`, `debug`, ...).
    pub level: String,
    /// `json` or `pretty`; inferred from the build when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: LOG_LEVEL.to_string(),
            format: None,
        }
    }
}
