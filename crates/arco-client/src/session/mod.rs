//! Magic-link authentication: start, poll, complete, refresh, sign out.
//!
//! Layout: `poller.rs` (attempt table + poll loop), `tokens.rs` (credential
//! storage and refresh). [`AuthSession`] ties them together for the UI.

pub mod poller;
pub mod tokens;

use std::sync::Arc;

use arco_api_models::{SessionKind, User};
use arco_gateway::RpcGateway;
use tokio::sync::watch;
use tracing::info;

pub use poller::{Authenticated, PollerConfig, Session, SessionPoller, StatusObserver};
pub use tokens::TokenManager;

use crate::error::{SessionError, SessionResult, TokenResult};
use crate::slices::AuthView;
use crate::sync::StateCell;

/// Clears the loading flag however the start call ends.
struct LoadingGuard<'a>(&'a StateCell<bool>);

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        let _ = self.0.replace(false);
    }
}

/// Authentication entry point used by the UI.
pub struct AuthSession {
    gateway: Arc<dyn RpcGateway>,
    poller: SessionPoller,
    tokens: TokenManager,
    loading: StateCell<bool>,
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("AuthSession")
            .field("poller", &self.poller)
            .field("tokens", &self.tokens)
            .field("loading", &self.is_loading())
            .finish_non_exhaustive()
    }
}

impl AuthSession {
    /// Session publishing the signed-in state into `auth`.
    #[must_use]
    pub fn new(
        gateway: Arc<dyn RpcGateway>,
        config: PollerConfig,
        auth: StateCell<AuthView>,
    ) -> Self {
        Self {
            poller: SessionPoller::new(Arc::clone(&gateway), config),
            tokens: TokenManager::new(Arc::clone(&gateway), auth),
            gateway,
            loading: StateCell::new(false),
        }
    }

    /// Send a registration magic link to `email`.
    ///
    /// # Errors
    ///
    /// See [`SessionPoller::start_attempt`].
    pub async fn start_register(&self, email: &str) -> SessionResult<Session> {
        self.start(SessionKind::Register, email).await
    }

    /// Send a login magic link to `email`.
    ///
    /// # Errors
    ///
    /// See [`SessionPoller::start_attempt`].
    pub async fn start_login(&self, email: &str) -> SessionResult<Session> {
        self.start(SessionKind::Login, email).await
    }

    async fn start(&self, kind: SessionKind, email: &str) -> SessionResult<Session> {
        let _ = self.loading.replace(true);
        let _loading = LoadingGuard(&self.loading);
        self.poller.start_attempt(kind, email).await
    }

    /// Wait for `session` to be authenticated, then finalise it with the
    /// backend and install the issued tokens.
    ///
    /// # Errors
    ///
    /// Terminal poll outcomes are returned as-is (see
    /// [`SessionPoller::await_completion`]); a failed finalisation yields
    /// [`SessionError::Complete`] and leaves the client signed out.
    pub async fn await_completion(
        &self,
        session: &Session,
        on_update: Option<StatusObserver<'_>>,
    ) -> SessionResult<User> {
        let Authenticated {
            session,
            user,
            tokens,
        } = self.poller.await_completion(session, on_update).await?;
        self.gateway
            .complete_authentication(&session.id)
            .await
            .map_err(|source| SessionError::Complete {
                session_id: session.id.clone(),
                source,
            })?;
        self.tokens.install(user.clone(), tokens);
        info!(session_id = %session.id, kind = %session.kind, "signed in");
        Ok(user)
    }

    /// Start a login and wait for it to complete.
    ///
    /// # Errors
    ///
    /// Any error of [`Self::start_login`] or [`Self::await_completion`].
    pub async fn login(
        &self,
        email: &str,
        on_update: Option<StatusObserver<'_>>,
    ) -> SessionResult<User> {
        let session = self.start_login(email).await?;
        self.await_completion(&session, on_update).await
    }

    /// Stop `session`. Returns whether it was live.
    pub fn cancel(&self, session: &Session) -> bool {
        self.poller.cancel(session)
    }

    /// Stop whichever attempt is in flight.
    pub fn cancel_current(&self) -> bool {
        self.poller
            .current()
            .is_some_and(|session| self.poller.cancel(&session))
    }

    /// Exchange the refresh token for a new pair.
    ///
    /// # Errors
    ///
    /// See [`TokenManager::refresh`].
    pub async fn refresh(&self) -> TokenResult<()> {
        self.tokens.refresh().await
    }

    /// Cancel any attempt in flight and sign out.
    pub async fn logout(&self) {
        let _ = self.cancel_current();
        self.tokens.logout().await;
    }

    /// Whether a start call is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading.get()
    }

    /// Observe the loading flag.
    #[must_use]
    pub fn loading(&self) -> watch::Receiver<bool> {
        self.loading.subscribe()
    }

    /// Whether someone is signed in.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.tokens.is_authenticated()
    }

    /// Attempt in flight, if any.
    #[must_use]
    pub fn current_session(&self) -> Option<Session> {
        self.poller.current()
    }

    /// Attempt table and poll loop.
    #[must_use]
    pub const fn poller(&self) -> &SessionPoller {
        &self.poller
    }

    /// Credential storage.
    #[must_use]
    pub const fn tokens(&self) -> &TokenManager {
        &self.tokens
    }
}
