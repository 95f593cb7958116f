//! # Design
//!
//! - One error enum per concern: handshake, tokens, slice reconciliation, bootstrap.
//! - Keep error messages constant while carrying context fields for debugging.
//! - Preserve transport errors as sources; `user_message` maps them to toast text.

use std::time::Duration;

use arco_api_models::SessionKind;
use arco_gateway::RpcError;
use thiserror::Error;

/// Result alias for handshake operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Failure of a magic-link authentication attempt.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The backend refused or failed to start the attempt.
    #[error("failed to start authentication session")]
    Start {
        /// Flow that was requested.
        kind: SessionKind,
        /// Source transport error.
        source: RpcError,
    },
    /// The backend answered without a session identifier.
    #[error("backend issued no session identifier")]
    MissingSessionId {
        /// Flow that was requested.
        kind: SessionKind,
    },
    /// The backend reported the session expired.
    #[error("authentication session expired")]
    Expired {
        /// Session identifier.
        session_id: String,
    },
    /// The attempt was cancelled locally or superseded by a newer one.
    #[error("authentication session cancelled")]
    Cancelled {
        /// Session identifier.
        session_id: String,
    },
    /// The backend reported the session as cancelled.
    #[error("authentication session cancelled by backend")]
    Revoked {
        /// Session identifier.
        session_id: String,
    },
    /// No terminal status arrived within the attempt's lifetime.
    #[error("authentication session timed out")]
    TimedOut {
        /// Session identifier.
        session_id: String,
        /// Lifetime that elapsed.
        lifetime: Duration,
    },
    /// The session is unknown, already finished, or already cancelled.
    #[error("authentication session is not active")]
    NotActive {
        /// Session identifier.
        session_id: String,
    },
    /// Someone is already waiting on this session.
    #[error("authentication session is already being awaited")]
    AlreadyAwaited {
        /// Session identifier.
        session_id: String,
    },
    /// The backend failed to finalise an authenticated session.
    #[error("failed to complete authentication")]
    Complete {
        /// Session identifier.
        session_id: String,
        /// Source transport error.
        source: RpcError,
    },
}

impl SessionError {
    /// Whether the attempt reached a terminal failure (expired, cancelled, timed out).
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Expired { .. }
                | Self::Cancelled { .. }
                | Self::Revoked { .. }
                | Self::TimedOut { .. }
        )
    }

    /// Whether the user (or a superseding attempt) cancelled the session.
    #[must_use]
    pub const fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// Message suitable for a toast.
    ///
    /// Rate limiting, expiry, cancellation and other failures each get their
    /// own text; callers that initiated a cancellation themselves can check
    /// [`Self::is_cancellation`] and skip the toast.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        match self {
            Self::Cancelled { .. } => "Sign-in was cancelled.",
            Self::Revoked { .. } => {
                "The sign-in request was cancelled. Please request a new link."
            }
            Self::Expired { .. } | Self::TimedOut { .. } => {
                "The sign-in link expired. Please request a new one."
            }
            Self::Start { source, .. } | Self::Complete { source, .. } => source.user_message(),
            Self::MissingSessionId { .. }
            | Self::NotActive { .. }
            | Self::AlreadyAwaited { .. } => "Something went wrong. Please try again.",
        }
    }
}

/// Result alias for token operations.
pub type TokenResult<T> = Result<T, TokenError>;

/// Failure of a token refresh.
#[derive(Debug, Error)]
pub enum TokenError {
    /// No refresh token is held; the user must sign in.
    #[error("no refresh token held")]
    NoRefreshToken,
    /// The backend rejected the refresh; the client signed out.
    #[error("token refresh failed")]
    Refresh {
        /// Source transport error.
        source: RpcError,
    },
}

/// Result alias for slice reconciliation.
pub type SliceResult<T> = Result<T, SliceError>;

/// Failure to mirror backend state.
#[derive(Debug, Error)]
pub enum SliceError {
    /// A fetch during reconciliation failed.
    #[error("state reconciliation failed")]
    Reconcile {
        /// Slice name.
        slice: &'static str,
        /// Source transport error.
        source: RpcError,
    },
    /// A slice-specific action failed.
    #[error("slice action failed")]
    Action {
        /// Slice name.
        slice: &'static str,
        /// Operation identifier.
        operation: &'static str,
        /// Source transport error.
        source: RpcError,
    },
}

/// Result alias for bootstrap operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Failure while wiring the client core.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Configuration could not be loaded.
    #[error("configuration operation failed")]
    Config {
        /// Operation identifier.
        operation: &'static str,
        /// Source configuration error.
        source: arco_config::ConfigError,
    },
    /// Logging could not be installed.
    #[error("telemetry operation failed")]
    Telemetry {
        /// Operation identifier.
        operation: &'static str,
        /// Source telemetry error.
        source: arco_telemetry::TelemetryError,
    },
}

impl ClientError {
    pub(crate) const fn config(
        operation: &'static str,
        source: arco_config::ConfigError,
    ) -> Self {
        Self::Config { operation, source }
    }

    pub(crate) const fn telemetry(
        operation: &'static str,
        source: arco_telemetry::TelemetryError,
    ) -> Self {
        Self::Telemetry { operation, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    fn rate_limited() -> RpcError {
        RpcError::RateLimited {
            operation: "start_login",
            retry_after: None,
        }
    }

    #[test]
    fn local_and_backend_cancellations_are_told_apart() {
        let local = SessionError::Cancelled {
            session_id: "s1".into(),
        };
        let revoked = SessionError::Revoked {
            session_id: "s1".into(),
        };
        assert!(local.is_terminal() && revoked.is_terminal());
        assert!(local.is_cancellation());
        assert!(!revoked.is_cancellation());
        assert_ne!(local.user_message(), revoked.user_message());
    }

    #[test]
    fn each_failure_category_gets_its_own_message() {
        let expired = SessionError::TimedOut {
            session_id: "s1".into(),
            lifetime: Duration::from_secs(600),
        };
        let limited = SessionError::Start {
            kind: SessionKind::Login,
            source: rate_limited(),
        };
        let generic = SessionError::MissingSessionId {
            kind: SessionKind::Register,
        };
        let cancelled = SessionError::Revoked {
            session_id: "s1".into(),
        };

        let messages = [
            expired.user_message(),
            limited.user_message(),
            generic.user_message(),
            cancelled.user_message(),
        ];
        for (index, message) in messages.iter().enumerate() {
            assert!(!message.is_empty());
            assert!(
                messages[index + 1..].iter().all(|other| other != message),
                "{message:?} is shared"
            );
        }
        assert!(!limited.is_terminal());
    }

    #[test]
    fn sources_are_preserved() {
        let err = TokenError::Refresh {
            source: rate_limited(),
        };
        let source = err.source().expect("source");
        assert_eq!(source.to_string(), "backend rate limit exceeded");

        let slice = SliceError::Reconcile {
            slice: "settings",
            source: rate_limited(),
        };
        assert_eq!(slice.to_string(), "state reconciliation failed");
        assert!(slice.source().is_some());
    }

    #[test]
    fn client_error_helpers_build_variants() {
        let config = ClientError::config(
            "load",
            arco_config::ConfigError::InvalidField {
                field: "session.poll_interval_ms",
                reason: "must be positive",
                value: None,
            },
        );
        assert!(matches!(config, ClientError::Config { operation: "load", .. }));
    }
}
