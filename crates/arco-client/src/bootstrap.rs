//! # Design
//!
//! - Wire every global slice and the auth session against one gateway and one
//!   event channel; per-entity slices are built on demand by the views.
//! - The auth slice and the token manager share one cell, so a completed
//!   handshake and a backend `authStateChanged` land in the same view. A
//!   backend sign-out also drops the held token pair.
//! - `shutdown` releases every listener and cancels any attempt in flight; it
//!   is idempotent.

use std::sync::Arc;

use arco_api_models::BackupId;
use arco_config::ClientConfig;
use arco_events::EventChannel;
use arco_gateway::RpcGateway;
use arco_telemetry::{GlobalContextGuard, LogFormat, LoggingConfig, build_sha, init_logging};
use tracing::info;

use crate::error::{ClientError, ClientResult};
use crate::session::{AuthSession, PollerConfig};
use crate::sync::StateCell;
use crate::slices::{
    AuthReconciler, AuthSlice, BackupReconciler, BackupSlice, MountReconciler, MountSlice,
    NotificationReconciler, NotificationSlice, ProfilesReconciler, ProfilesSlice,
    RepositoriesReconciler, RepositoriesSlice, RepositoryReconciler, RepositorySlice,
    SettingsReconciler, SettingsSlice, SubscriptionReconciler, SubscriptionSlice,
};

/// Install the global tracing subscriber described by `config`.
///
/// # Errors
///
/// Returns an error if a subscriber is already installed.
pub fn init_telemetry(config: &ClientConfig) -> ClientResult<GlobalContextGuard> {
    let logging = LoggingConfig {
        level: &config.logging.level,
        format: LogFormat::from_setting(config.logging.format.as_deref()),
        build_sha: build_sha(),
    };
    init_logging(&logging).map_err(|err| ClientError::telemetry("telemetry.init", err))?;
    Ok(GlobalContextGuard::new("client"))
}

/// Session-wide client state: the auth session plus every global slice.
pub struct ClientCore {
    gateway: Arc<dyn RpcGateway>,
    channel: Arc<dyn EventChannel>,
    session: AuthSession,
    auth: AuthSlice,
    settings: SettingsSlice,
    subscription: SubscriptionSlice,
    notifications: NotificationSlice,
    profiles: ProfilesSlice,
    repositories: RepositoriesSlice,
}

impl std::fmt::Debug for ClientCore {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("ClientCore")
            .field("session", &self.session)
            .field("listeners", &self.live_listeners())
            .finish_non_exhaustive()
    }
}

impl ClientCore {
    /// Wire the core; nothing is fetched or subscribed until [`Self::start`].
    #[must_use]
    pub fn new(
        config: &ClientConfig,
        gateway: Arc<dyn RpcGateway>,
        channel: Arc<dyn EventChannel>,
    ) -> Self {
        let view = StateCell::default();
        let session = AuthSession::new(
            Arc::clone(&gateway),
            PollerConfig::from(&config.session),
            view.clone(),
        );
        let auth = AuthSlice::with_cell(
            AuthReconciler::with_tokens(session.tokens().clone()),
            Arc::clone(&gateway),
            Arc::clone(&channel),
            view,
        );
        Self {
            settings: SettingsSlice::new(
                SettingsReconciler,
                Arc::clone(&gateway),
                Arc::clone(&channel),
            ),
            subscription: SubscriptionSlice::new(
                SubscriptionReconciler,
                Arc::clone(&gateway),
                Arc::clone(&channel),
            ),
            notifications: NotificationSlice::new(
                NotificationReconciler,
                Arc::clone(&gateway),
                Arc::clone(&channel),
            ),
            profiles: ProfilesSlice::new(
                ProfilesReconciler,
                Arc::clone(&gateway),
                Arc::clone(&channel),
            ),
            repositories: RepositoriesSlice::new(
                RepositoriesReconciler,
                Arc::clone(&gateway),
                Arc::clone(&channel),
            ),
            auth,
            session,
            gateway,
            channel,
        }
    }

    /// Wire the core with configuration read from `ARCO_*` variables.
    ///
    /// # Errors
    ///
    /// Returns an error when the environment holds invalid configuration.
    pub fn from_env(
        gateway: Arc<dyn RpcGateway>,
        channel: Arc<dyn EventChannel>,
    ) -> ClientResult<Self> {
        let config =
            ClientConfig::from_env().map_err(|err| ClientError::config("config.from_env", err))?;
        Ok(Self::new(&config, gateway, channel))
    }

    /// Fetch every global slice and start listening.
    pub async fn start(&self) {
        info!("client core starting");
        tokio::join!(
            self.auth.start(),
            self.settings.start(),
            self.subscription.start(),
            self.notifications.start(),
            self.profiles.start(),
            self.repositories.start(),
        );
        info!(listeners = self.live_listeners(), "client core ready");
    }

    /// Release every listener and cancel any authentication attempt.
    pub fn shutdown(&self) {
        let cancelled = self.session.poller().cancel_all();
        self.auth.teardown();
        self.settings.teardown();
        self.subscription.teardown();
        self.notifications.teardown();
        self.profiles.teardown();
        self.repositories.teardown();
        info!(cancelled, "client core shut down");
    }

    /// Listeners held by the global slices.
    #[must_use]
    pub fn live_listeners(&self) -> usize {
        [
            self.auth.registry(),
            self.settings.registry(),
            self.subscription.registry(),
            self.notifications.registry(),
            self.profiles.registry(),
            self.repositories.registry(),
        ]
        .iter()
        .map(|registry| registry.live_listeners())
        .sum()
    }

    /// Started slice for one backup job.
    pub async fn backup_slice(&self, backup_id: BackupId) -> BackupSlice {
        let slice = BackupSlice::new(
            BackupReconciler::new(backup_id),
            Arc::clone(&self.gateway),
            Arc::clone(&self.channel),
        );
        slice.start().await;
        slice
    }

    /// Started slice for one repository.
    pub async fn repository_slice(&self, repository_id: i64) -> RepositorySlice {
        let slice = RepositorySlice::new(
            RepositoryReconciler::new(repository_id),
            Arc::clone(&self.gateway),
            Arc::clone(&self.channel),
        );
        slice.start().await;
        slice
    }

    /// Started slice for one repository's mount state.
    pub async fn mount_slice(&self, repository_id: i64) -> MountSlice {
        let slice = MountSlice::new(
            MountReconciler::new(repository_id),
            Arc::clone(&self.gateway),
            Arc::clone(&self.channel),
        );
        slice.start().await;
        slice
    }

    /// Authentication entry point.
    #[must_use]
    pub const fn session(&self) -> &AuthSession {
        &self.session
    }

    /// Signed-in state.
    #[must_use]
    pub const fn auth(&self) -> &AuthSlice {
        &self.auth
    }

    /// Application settings.
    #[must_use]
    pub const fn settings(&self) -> &SettingsSlice {
        &self.settings
    }

    /// Cloud subscription and checkout outcome.
    #[must_use]
    pub const fn subscription(&self) -> &SubscriptionSlice {
        &self.subscription
    }

    /// Outstanding notifications.
    #[must_use]
    pub const fn notifications(&self) -> &NotificationSlice {
        &self.notifications
    }

    /// Backup profile list.
    #[must_use]
    pub const fn profiles(&self) -> &ProfilesSlice {
        &self.profiles
    }

    /// Repository list.
    #[must_use]
    pub const fn repositories(&self) -> &RepositoriesSlice {
        &self.repositories
    }
}
