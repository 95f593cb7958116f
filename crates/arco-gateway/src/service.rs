//! Backend calls consumed by the client core.

use arco_api_models::{
    AuthState, AuthStatusSnapshot, BackupId, BackupProfileSummary, BackupState, CheckoutResult,
    MountState, Notification, RepoState, RepositorySummary, SessionStart, Settings, Subscription,
    TokenPair, User,
};
use async_trait::async_trait;

use crate::error::RpcResult;

/// Request/response surface of the local backend.
#[async_trait]
pub trait RpcGateway: Send + Sync {
    /// Begin a magic-link registration for `email`.
    async fn start_register(&self, email: &str) -> RpcResult<SessionStart>;

    /// Begin a magic-link login for `email`.
    async fn start_login(&self, email: &str) -> RpcResult<SessionStart>;

    /// Observe the current status of a pending session.
    async fn check_auth_status(&self, session_id: &str) -> RpcResult<AuthStatusSnapshot>;

    /// Tell the backend the client picked up an authenticated session.
    async fn complete_authentication(&self, session_id: &str) -> RpcResult<()>;

    /// Exchange a refresh token for a new pair.
    async fn refresh_token(&self, refresh_token: &str) -> RpcResult<TokenPair>;

    /// Notify the backend that the user signed out.
    async fn logout(&self) -> RpcResult<()>;

    /// Whether the backend holds a valid session.
    async fn get_auth_state(&self) -> RpcResult<AuthState>;

    /// Profile of the signed-in user, if any.
    async fn get_current_user(&self) -> RpcResult<Option<User>>;

    /// Persisted application settings.
    async fn get_settings(&self) -> RpcResult<Settings>;

    /// State of one backup job.
    async fn get_backup_state(&self, backup_id: BackupId) -> RpcResult<BackupState>;

    /// State of one repository.
    async fn get_repo_state(&self, repository_id: i64) -> RpcResult<RepoState>;

    /// Number of archives stored in a repository.
    async fn get_archive_count(&self, repository_id: i64) -> RpcResult<u64>;

    /// Mount state of a repository.
    async fn get_mount_state(&self, repository_id: i64) -> RpcResult<MountState>;

    /// Active cloud subscription, if any.
    async fn get_subscription(&self) -> RpcResult<Option<Subscription>>;

    /// Latest unacknowledged checkout result, if any.
    async fn get_checkout_result(&self) -> RpcResult<Option<CheckoutResult>>;

    /// Acknowledge (and forget) the latest checkout result.
    async fn clear_checkout_result(&self) -> RpcResult<()>;

    /// Outstanding notifications, newest first.
    async fn get_notifications(&self) -> RpcResult<Vec<Notification>>;

    /// Dismiss one notification.
    async fn dismiss_notification(&self, notification_id: i64) -> RpcResult<()>;

    /// All backup profiles.
    async fn get_backup_profiles(&self) -> RpcResult<Vec<BackupProfileSummary>>;

    /// All repositories.
    async fn get_repositories(&self) -> RpcResult<Vec<RepositorySummary>>;
}
