//! Validation helpers for client settings.

use crate::error::{ConfigError, ConfigResult};
use crate::model::{ClientConfig, LogSettings, SessionSettings};

/// Known log format selectors.
const LOG_FORMATS: [&str; 2] = ["json", "pretty"];

/// Check every invariant of a loaded configuration.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidField`] for the first violated invariant.
pub fn validate(config: &ClientConfig) -> ConfigResult<()> {
    validate_session(&config.session)?;
    validate_logging(&config.logging)
}

fn validate_session(session: &SessionSettings) -> ConfigResult<()> {
    if session.poll_interval_ms == 0 {
        return Err(ConfigError::InvalidField {
            field: "session.poll_interval_ms",
            reason: "must be positive",
            value: Some(session.poll_interval_ms.to_string()),
        });
    }
    if session.max_lifetime() <= session.poll_interval() {
        return Err(ConfigError::InvalidField {
            field: "session.max_lifetime_secs",
            reason: "must exceed the poll interval",
            value: Some(session.max_lifetime_secs.to_string()),
        });
    }
    Ok(())
}

fn validate_logging(logging: &LogSettings) -> ConfigResult<()> {
    if logging.level.trim().is_empty() {
        return Err(ConfigError::InvalidField {
            field: "logging.level",
            reason: "must not be empty",
            value: None,
        });
    }
    if let Some(format) = logging.format.as_deref()
        && !LOG_FORMATS.contains(&format)
    {
        return Err(ConfigError::InvalidField {
            field: "logging.format",
            reason: "must be json or pretty",
            value: Some(format.to_string()),
        });
    }
    Ok(())
}
