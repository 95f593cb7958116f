//! Scripted backend gateway for client-core tests.
//!
//! Every call is recorded in order. Responses come from a per-endpoint queue
//! and fall back to a sticky default once the queue is drained; a reply can
//! carry a delay so tests can force out-of-order completion under a paused
//! clock.

use std::collections::{HashMap, VecDeque};
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use arco_api_models::{
    AuthState, AuthStatusSnapshot, BackupId, BackupProfileSummary, BackupState, CheckoutResult,
    MountState, Notification, RepoState, RepositorySummary, SessionStart, Settings, Subscription,
    TokenPair, User,
};
use arco_gateway::{RpcError, RpcGateway, RpcResult};
use async_trait::async_trait;
use uuid::Uuid;

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    /// `start_register(email)`.
    StartRegister(String),
    /// `start_login(email)`.
    StartLogin(String),
    /// `check_auth_status(session_id)`.
    CheckAuthStatus(String),
    /// `complete_authentication(session_id)`.
    CompleteAuthentication(String),
    /// `refresh_token(refresh_token)`.
    RefreshToken(String),
    /// `logout()`.
    Logout,
    /// `get_auth_state()`.
    GetAuthState,
    /// `get_current_user()`.
    GetCurrentUser,
    /// `get_settings()`.
    GetSettings,
    /// `get_backup_state(id)`.
    GetBackupState(BackupId),
    /// `get_repo_state(id)`.
    GetRepoState(i64),
    /// `get_archive_count(id)`.
    GetArchiveCount(i64),
    /// `get_mount_state(id)`.
    GetMountState(i64),
    /// `get_subscription()`.
    GetSubscription,
    /// `get_checkout_result()`.
    GetCheckoutResult,
    /// `clear_checkout_result()`.
    ClearCheckoutResult,
    /// `get_notifications()`.
    GetNotifications,
    /// `dismiss_notification(id)`.
    DismissNotification(i64),
    /// `get_backup_profiles()`.
    GetBackupProfiles,
    /// `get_repositories()`.
    GetRepositories,
}

#[derive(Debug, Clone)]
struct Reply<T> {
    result: RpcResult<T>,
    delay: Duration,
}

impl<T> Reply<T> {
    const fn now(result: RpcResult<T>) -> Self {
        Self {
            result,
            delay: Duration::ZERO,
        }
    }

    async fn resolve(self) -> RpcResult<T> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.result
    }
}

#[derive(Debug)]
struct Responses<T> {
    queued: VecDeque<Reply<T>>,
    fallback: Reply<T>,
}

impl<T: Clone> Responses<T> {
    const fn new(fallback: RpcResult<T>) -> Self {
        Self {
            queued: VecDeque::new(),
            fallback: Reply::now(fallback),
        }
    }

    fn next(&mut self) -> Reply<T> {
        self.queued
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

impl<T: Clone + Default> Default for Responses<T> {
    fn default() -> Self {
        Self::new(Ok(T::default()))
    }
}

fn keyed<K, T>(map: &mut HashMap<K, Responses<T>>, key: K) -> Reply<T>
where
    K: Eq + Hash,
    T: Clone + Default,
{
    map.entry(key).or_default().next()
}

#[derive(Debug)]
struct Script {
    calls: Vec<Call>,
    session_starts: VecDeque<Reply<SessionStart>>,
    auth_status: Responses<AuthStatusSnapshot>,
    complete: Responses<()>,
    refresh: Responses<TokenPair>,
    logout: Responses<()>,
    auth_state: Responses<AuthState>,
    current_user: Responses<Option<User>>,
    settings: Responses<Settings>,
    backup_states: HashMap<BackupId, Responses<BackupState>>,
    repo_states: HashMap<i64, Responses<RepoState>>,
    archive_counts: HashMap<i64, Responses<u64>>,
    mount_states: HashMap<i64, Responses<MountState>>,
    subscription: Responses<Option<Subscription>>,
    checkout: Responses<Option<CheckoutResult>>,
    clear_checkout: Responses<()>,
    notifications: Responses<Vec<Notification>>,
    dismiss: Responses<()>,
    profiles: Responses<Vec<BackupProfileSummary>>,
    repositories: Responses<Vec<RepositorySummary>>,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            calls: Vec::new(),
            session_starts: VecDeque::new(),
            auth_status: Responses::new(Ok(AuthStatusSnapshot::Pending)),
            complete: Responses::default(),
            refresh: Responses::new(Err(RpcError::Unauthenticated {
                operation: "refresh_token",
            })),
            logout: Responses::default(),
            auth_state: Responses::default(),
            current_user: Responses::default(),
            settings: Responses::default(),
            backup_states: HashMap::new(),
            repo_states: HashMap::new(),
            archive_counts: HashMap::new(),
            mount_states: HashMap::new(),
            subscription: Responses::default(),
            checkout: Responses::default(),
            clear_checkout: Responses::default(),
            notifications: Responses::default(),
            dismiss: Responses::default(),
            profiles: Responses::default(),
            repositories: Responses::default(),
        }
    }
}

/// In-memory [`RpcGateway`] whose answers are scripted by the test.
///
/// Defaults: session starts get a fresh UUID, status checks answer
/// `Pending`, refreshes are rejected, and every read returns the DTO's
/// default value.
#[derive(Debug, Default)]
pub struct ScriptedGateway {
    script: Mutex<Script>,
}

impl ScriptedGateway {
    /// Gateway with default answers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Calls observed so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    /// Number of recorded calls matching `predicate`.
    #[must_use]
    pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.lock().calls.iter().filter(|call| predicate(call)).count()
    }

    /// Forget recorded calls; scripted answers are kept.
    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Answer the next register/login request with `result`.
    pub fn queue_session_start(&self, result: RpcResult<SessionStart>) {
        self.lock().session_starts.push_back(Reply::now(result));
    }

    /// Answer the next status check with `result`.
    pub fn queue_auth_status(&self, result: RpcResult<AuthStatusSnapshot>) {
        self.queue_auth_status_after(result, Duration::ZERO);
    }

    /// Answer the next status check with `result` after `delay`.
    pub fn queue_auth_status_after(&self, result: RpcResult<AuthStatusSnapshot>, delay: Duration) {
        self.lock()
            .auth_status
            .queued
            .push_back(Reply { result, delay });
    }

    /// Answer status checks with `result` once the queue is drained.
    pub fn set_auth_status(&self, result: RpcResult<AuthStatusSnapshot>) {
        self.lock().auth_status.fallback = Reply::now(result);
    }

    /// Answer `complete_authentication` with `result`.
    pub fn set_complete(&self, result: RpcResult<()>) {
        self.lock().complete.fallback = Reply::now(result);
    }

    /// Answer the next refresh with `result` after `delay`.
    pub fn queue_refresh_after(&self, result: RpcResult<TokenPair>, delay: Duration) {
        self.lock().refresh.queued.push_back(Reply { result, delay });
    }

    /// Answer refreshes with `result` once the queue is drained.
    pub fn set_refresh(&self, result: RpcResult<TokenPair>) {
        self.lock().refresh.fallback = Reply::now(result);
    }

    /// Answer `logout` with `result`.
    pub fn set_logout(&self, result: RpcResult<()>) {
        self.lock().logout.fallback = Reply::now(result);
    }

    /// Answer `get_auth_state` with `result`.
    pub fn set_auth_state(&self, result: RpcResult<AuthState>) {
        self.lock().auth_state.fallback = Reply::now(result);
    }

    /// Answer `get_current_user` with `result`.
    pub fn set_current_user(&self, result: RpcResult<Option<User>>) {
        self.lock().current_user.fallback = Reply::now(result);
    }

    /// Answer `get_settings` with `result`.
    pub fn set_settings(&self, result: RpcResult<Settings>) {
        self.lock().settings.fallback = Reply::now(result);
    }

    /// Answer `get_backup_state(id)` with `result`.
    pub fn set_backup_state(&self, id: BackupId, result: RpcResult<BackupState>) {
        self.lock().backup_states.entry(id).or_default().fallback = Reply::now(result);
    }

    /// Answer the next `get_repo_state(id)` with `result` after `delay`.
    pub fn queue_repo_state_after(&self, id: i64, result: RpcResult<RepoState>, delay: Duration) {
        self.lock()
            .repo_states
            .entry(id)
            .or_default()
            .queued
            .push_back(Reply { result, delay });
    }

    /// Answer `get_repo_state(id)` with `result`.
    pub fn set_repo_state(&self, id: i64, result: RpcResult<RepoState>) {
        self.lock().repo_states.entry(id).or_default().fallback = Reply::now(result);
    }

    /// Answer `get_archive_count(id)` with `result`.
    pub fn set_archive_count(&self, id: i64, result: RpcResult<u64>) {
        self.lock().archive_counts.entry(id).or_default().fallback = Reply::now(result);
    }

    /// Answer `get_mount_state(id)` with `result`.
    pub fn set_mount_state(&self, id: i64, result: RpcResult<MountState>) {
        self.lock().mount_states.entry(id).or_default().fallback = Reply::now(result);
    }

    /// Answer `get_subscription` with `result`.
    pub fn set_subscription(&self, result: RpcResult<Option<Subscription>>) {
        self.lock().subscription.fallback = Reply::now(result);
    }

    /// Answer `get_checkout_result` with `result`.
    pub fn set_checkout_result(&self, result: RpcResult<Option<CheckoutResult>>) {
        self.lock().checkout.fallback = Reply::now(result);
    }

    /// Answer `clear_checkout_result` with `result`.
    pub fn set_clear_checkout(&self, result: RpcResult<()>) {
        self.lock().clear_checkout.fallback = Reply::now(result);
    }

    /// Answer `get_notifications` with `result`.
    pub fn set_notifications(&self, result: RpcResult<Vec<Notification>>) {
        self.lock().notifications.fallback = Reply::now(result);
    }

    /// Answer `dismiss_notification` with `result`.
    pub fn set_dismiss(&self, result: RpcResult<()>) {
        self.lock().dismiss.fallback = Reply::now(result);
    }

    /// Answer `get_backup_profiles` with `result`.
    pub fn set_backup_profiles(&self, result: RpcResult<Vec<BackupProfileSummary>>) {
        self.lock().profiles.fallback = Reply::now(result);
    }

    /// Answer `get_repositories` with `result`.
    pub fn set_repositories(&self, result: RpcResult<Vec<RepositorySummary>>) {
        self.lock().repositories.fallback = Reply::now(result);
    }

    fn record<T>(&self, call: Call, pick: impl FnOnce(&mut Script) -> Reply<T>) -> Reply<T> {
        let mut script = self.lock();
        script.calls.push(call);
        pick(&mut *script)
    }

    fn session_start(script: &mut Script) -> Reply<SessionStart> {
        script.session_starts.pop_front().unwrap_or_else(|| {
            Reply::now(Ok(SessionStart {
                session_id: Uuid::new_v4().to_string(),
                expires_at: None,
                message: None,
            }))
        })
    }
}

#[async_trait]
impl RpcGateway for ScriptedGateway {
    async fn start_register(&self, email: &str) -> RpcResult<SessionStart> {
        self.record(Call::StartRegister(email.to_string()), Self::session_start)
            .resolve()
            .await
    }

    async fn start_login(&self, email: &str) -> RpcResult<SessionStart> {
        self.record(Call::StartLogin(email.to_string()), Self::session_start)
            .resolve()
            .await
    }

    async fn check_auth_status(&self, session_id: &str) -> RpcResult<AuthStatusSnapshot> {
        self.record(Call::CheckAuthStatus(session_id.to_string()), |script| {
            script.auth_status.next()
        })
        .resolve()
        .await
    }

    async fn complete_authentication(&self, session_id: &str) -> RpcResult<()> {
        self.record(
            Call::CompleteAuthentication(session_id.to_string()),
            |script| script.complete.next(),
        )
        .resolve()
        .await
    }

    async fn refresh_token(&self, refresh_token: &str) -> RpcResult<TokenPair> {
        self.record(Call::RefreshToken(refresh_token.to_string()), |script| {
            script.refresh.next()
        })
        .resolve()
        .await
    }

    async fn logout(&self) -> RpcResult<()> {
        self.record(Call::Logout, |script| script.logout.next())
            .resolve()
            .await
    }

    async fn get_auth_state(&self) -> RpcResult<AuthState> {
        self.record(Call::GetAuthState, |script| script.auth_state.next())
            .resolve()
            .await
    }

    async fn get_current_user(&self) -> RpcResult<Option<User>> {
        self.record(Call::GetCurrentUser, |script| script.current_user.next())
            .resolve()
            .await
    }

    async fn get_settings(&self) -> RpcResult<Settings> {
        self.record(Call::GetSettings, |script| script.settings.next())
            .resolve()
            .await
    }

    async fn get_backup_state(&self, backup_id: BackupId) -> RpcResult<BackupState> {
        self.record(Call::GetBackupState(backup_id), |script| {
            keyed(&mut script.backup_states, backup_id)
        })
        .resolve()
        .await
    }

    async fn get_repo_state(&self, repository_id: i64) -> RpcResult<RepoState> {
        self.record(Call::GetRepoState(repository_id), |script| {
            keyed(&mut script.repo_states, repository_id)
        })
        .resolve()
        .await
    }

    async fn get_archive_count(&self, repository_id: i64) -> RpcResult<u64> {
        self.record(Call::GetArchiveCount(repository_id), |script| {
            keyed(&mut script.archive_counts, repository_id)
        })
        .resolve()
        .await
    }

    async fn get_mount_state(&self, repository_id: i64) -> RpcResult<MountState> {
        self.record(Call::GetMountState(repository_id), |script| {
            keyed(&mut script.mount_states, repository_id)
        })
        .resolve()
        .await
    }

    async fn get_subscription(&self) -> RpcResult<Option<Subscription>> {
        self.record(Call::GetSubscription, |script| script.subscription.next())
            .resolve()
            .await
    }

    async fn get_checkout_result(&self) -> RpcResult<Option<CheckoutResult>> {
        self.record(Call::GetCheckoutResult, |script| script.checkout.next())
            .resolve()
            .await
    }

    async fn clear_checkout_result(&self) -> RpcResult<()> {
        self.record(Call::ClearCheckoutResult, |script| {
            script.clear_checkout.next()
        })
        .resolve()
        .await
    }

    async fn get_notifications(&self) -> RpcResult<Vec<Notification>> {
        self.record(Call::GetNotifications, |script| script.notifications.next())
            .resolve()
            .await
    }

    async fn dismiss_notification(&self, notification_id: i64) -> RpcResult<()> {
        self.record(Call::DismissNotification(notification_id), |script| {
            script.dismiss.next()
        })
        .resolve()
        .await
    }

    async fn get_backup_profiles(&self) -> RpcResult<Vec<BackupProfileSummary>> {
        self.record(Call::GetBackupProfiles, |script| script.profiles.next())
            .resolve()
            .await
    }

    async fn get_repositories(&self) -> RpcResult<Vec<RepositorySummary>> {
        self.record(Call::GetRepositories, |script| script.repositories.next())
            .resolve()
            .await
    }
}
