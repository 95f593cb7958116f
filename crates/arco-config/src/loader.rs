//! Configuration sources: environment variables and JSON documents.
//!
//! # Design
//! - Start from defaults, overlay whatever the source provides, then validate once.
//! - Environment access goes through a lookup closure so tests never touch the
//!   process environment.

use tracing::debug;

use crate::defaults::{
    ENV_LOG_FORMAT, ENV_LOG_LEVEL, ENV_POLL_INTERVAL_MS, ENV_SESSION_LIFETIME_SECS,
};
use crate::error::{ConfigError, ConfigResult};
use crate::model::ClientConfig;
use crate::validate::validate;

impl ClientConfig {
    /// Load configuration from `ARCO_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error when a variable cannot be parsed or the resulting
    /// configuration violates an invariant.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns an error when a variable cannot be parsed or the resulting
    /// configuration violates an invariant.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(value) = lookup(ENV_POLL_INTERVAL_MS) {
            config.session.poll_interval_ms =
                parse_u64(&value, "session.poll_interval_ms")?;
        }
        if let Some(value) = lookup(ENV_SESSION_LIFETIME_SECS) {
            config.session.max_lifetime_secs =
                parse_u64(&value, "session.max_lifetime_secs")?;
        }
        if let Some(value) = lookup(ENV_LOG_LEVEL) {
            config.logging.level = value.trim().to_string();
        }
        if let Some(value) = lookup(ENV_LOG_FORMAT) {
            config.logging.format = Some(value.trim().to_ascii_lowercase());
        }
        validate(&config)?;
        debug!(
            poll_interval_ms = config.session.poll_interval_ms,
            max_lifetime_secs = config.session.max_lifetime_secs,
            "client configuration loaded from environment"
        );
        Ok(config)
    }

    /// Decode a JSON document; missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error when the document is malformed or violates an invariant.
    pub fn from_json_str(document: &str) -> ConfigResult<Self> {
        let config: Self =
            serde_json::from_str(document).map_err(|source| ConfigError::Parse { source })?;
        validate(&config)?;
        Ok(config)
    }
}

fn parse_u64(value: &str, field: &'static str) -> ConfigResult<u64> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|_| ConfigError::InvalidField {
            field,
            reason: "must be an unsigned integer",
            value: Some(value.to_string()),
        })
}
