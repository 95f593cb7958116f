//! Default values for client settings.
//!
//! # Design
//! - Keep timing defaults explicit; they mirror the backend's session lifetime.

/// Interval between two status checks of a pending session.
pub const POLL_INTERVAL_MS: u64 = 2_000;
/// Upper bound on how long one authentication attempt may stay pending.
pub const SESSION_LIFETIME_SECS: u64 = 10 * 60;
/// Log level used when neither configuration nor `RUST_LOG` provide one.
pub const LOG_LEVEL: &str = "info";

/// Environment variable overriding the poll interval, in milliseconds.
pub const ENV_POLL_INTERVAL_MS: &str = "ARCO_POLL_INTERVAL_MS";
/// Environment variable overriding the session lifetime, in seconds.
pub const ENV_SESSION_LIFETIME_SECS: &str = "ARCO_SESSION_LIFETIME_SECS";
/// Environment variable overriding the log level.
pub const ENV_LOG_LEVEL: &str = "ARCO_LOG_LEVEL";
/// Environment variable selecting the log format (`json` or `pretty`).
pub const ENV_LOG_FORMAT: &str = "ARCO_LOG_FORMAT";
