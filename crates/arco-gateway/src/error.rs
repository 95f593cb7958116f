//! Transport error taxonomy for backend calls.

use std::time::Duration;

use thiserror::Error;

/// Failure of a single backend call. The call had no effect the caller can
/// observe.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RpcError {
    /// The backend could not be reached or did not answer.
    #[error("backend unavailable")]
    Unavailable {
        /// Operation identifier.
        operation: &'static str,
        /// Transport detail for logs.
        detail: String,
    },
    /// The backend (or the service behind it) is throttling this client.
    #[error("backend rate limit exceeded")]
    RateLimited {
        /// Operation identifier.
        operation: &'static str,
        /// Suggested wait before retrying, when known.
        retry_after: Option<Duration>,
    },
    /// The call requires credentials the backend did not accept.
    #[error("backend rejected credentials")]
    Unauthenticated {
        /// Operation identifier.
        operation: &'static str,
    },
    /// The backend refused the request.
    #[error("backend rejected request")]
    Rejected {
        /// Operation identifier.
        operation: &'static str,
        /// Backend-provided reason.
        message: String,
    },
}

impl RpcError {
    /// Operation that failed.
    #[must_use]
    pub const fn operation(&self) -> &'static str {
        match self {
            Self::Unavailable { operation, .. }
            | Self::RateLimited { operation, .. }
            | Self::Unauthenticated { operation }
            | Self::Rejected { operation, .. } => operation,
        }
    }

    /// Whether retrying the same call later may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable { .. } | Self::RateLimited { .. })
    }

    /// Message suitable for a toast.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        match self {
            Self::RateLimited { .. } => "Too many attempts. Please wait a moment and try again.",
            Self::Unauthenticated { .. } => "Your session is no longer valid. Please sign in again.",
            Self::Unavailable { .. } | Self::Rejected { .. } => {
                "Something went wrong. Please try again."
            }
        }
    }
}

/// Result alias for backend calls.
pub type RpcResult<T> = Result<T, RpcError>;
