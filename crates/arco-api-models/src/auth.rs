//! Authentication handshake DTOs.

use std::fmt::{self, Debug, Display, Formatter};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which magic-link flow a session belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionKind {
    /// Account creation.
    Register,
    /// Sign-in to an existing account.
    Login,
}

impl SessionKind {
    /// Stable label used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Register => "register",
            Self::Login => "login",
        }
    }
}

impl Display for SessionKind {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Backend response to a register/login request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStart {
    /// Identifier of the pending session; empty when the backend did not issue one.
    pub session_id: String,
    /// When the backend will consider the session expired.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    /// Human-readable message ("check your inbox").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Account the session authenticated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Backend user identifier.
    pub id: String,
    /// Account email address.
    pub email: String,
}

/// Access/refresh token pair issued on authentication or refresh.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    /// Short-lived bearer token.
    pub access_token: String,
    /// Long-lived token used to obtain a new pair.
    pub refresh_token: String,
}

impl TokenPair {
    /// Build a pair from its two halves.
    #[must_use]
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }
}

impl Debug for TokenPair {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("TokenPair")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

/// One observation of a pending session's status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum AuthStatusSnapshot {
    /// The magic link has not been used yet.
    Pending,
    /// The link was used; tokens were issued.
    Authenticated {
        /// Account that signed in.
        user: User,
        /// Freshly issued tokens.
        tokens: TokenPair,
    },
    /// The session outlived its backend expiry.
    Expired,
    /// The session was cancelled on the backend.
    Cancelled,
}

impl AuthStatusSnapshot {
    /// Whether polling should stop after observing this snapshot.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Stable label used in logs.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Authenticated { .. } => "authenticated",
            Self::Expired => "expired",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Backend view of whether this installation is signed in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthState {
    /// Whether a valid session is held by the backend.
    pub is_authenticated: bool,
}
