//! Sample DTOs and clock helpers.

use std::time::Duration;

use arco_api_models::{AuthStatusSnapshot, BackupId, SessionStart, TokenPair, User};
use arco_gateway::RpcError;

/// Email used by scripted handshakes.
pub const SAMPLE_EMAIL: &str = "ada@example.com";

/// A signed-in account.
#[must_use]
pub fn sample_user() -> User {
    User {
        id: "user-1".into(),
        email: SAMPLE_EMAIL.into(),
    }
}

/// A token pair tagged with `generation` so tests can tell pairs apart.
#[must_use]
pub fn sample_tokens(generation: u32) -> TokenPair {
    TokenPair::new(
        format!("access-{generation}"),
        format!("refresh-{generation}"),
    )
}

/// An `Authenticated` snapshot for [`sample_user`].
#[must_use]
pub fn authenticated(generation: u32) -> AuthStatusSnapshot {
    AuthStatusSnapshot::Authenticated {
        user: sample_user(),
        tokens: sample_tokens(generation),
    }
}

/// Backend response to a register/login request.
#[must_use]
pub fn session_start(session_id: &str) -> SessionStart {
    SessionStart {
        session_id: session_id.into(),
        expires_at: None,
        message: None,
    }
}

/// Backup job used across slice tests.
#[must_use]
pub const fn sample_backup_id() -> BackupId {
    BackupId::new(1, 2)
}

/// Transport failure for `operation`.
#[must_use]
pub fn unavailable(operation: &'static str) -> RpcError {
    RpcError::Unavailable {
        operation,
        detail: "scripted outage".into(),
    }
}

/// Let spawned tasks run to completion.
///
/// Under a paused clock the runtime only advances time once every runnable
/// task is idle, so a short sleep drains all pending work first.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_generations_are_distinct() {
        assert_ne!(sample_tokens(1), sample_tokens(2));
        assert_eq!(sample_tokens(3).refresh_token, "refresh-3");
    }

    #[test]
    fn authenticated_snapshot_carries_sample_user() {
        match authenticated(1) {
            AuthStatusSnapshot::Authenticated { user, tokens } => {
                assert_eq!(user, sample_user());
                assert_eq!(tokens, sample_tokens(1));
            }
            other => panic!("unexpected snapshot {other:?}"),
        }
    }
}
