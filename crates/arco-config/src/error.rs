//! Error types for configuration loading.

use thiserror::Error;

/// Primary error type for configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Field contained an invalid value.
    #[error("invalid configuration field")]
    InvalidField {
        /// Dotted path of the field that failed validation.
        field: &'static str,
        /// Machine-readable reason for the failure.
        reason: &'static str,
        /// Offending value when available.
        value: Option<String>,
    },
    /// JSON configuration document could not be decoded.
    #[error("failed to parse configuration document")]
    Parse {
        /// Underlying serde error.
        #[source]
        source: serde_json::Error,
    },
}

/// Result alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn messages_stay_constant_and_sources_are_kept() {
        let invalid = ConfigError::InvalidField {
            field: "session.poll_interval_ms",
            reason: "must be positive",
            value: Some("0".into()),
        };
        assert_eq!(invalid.to_string(), "invalid configuration field");
        assert!(invalid.source().is_none());

        let Err(source) = serde_json::from_str::<serde_json::Value>("{") else {
            panic!("expected invalid json");
        };
        let parse = ConfigError::Parse { source };
        assert_eq!(parse.to_string(), "failed to parse configuration document");
        assert!(parse.source().is_some());
    }
}
