//! Credential storage, refresh and sign-out.
//!
//! # Design
//! - Tokens live in one [`StateCell`], so both halves of a pair are replaced
//!   in a single write and readers never see a mixed pair.
//! - Refresh writes are ticketed: a refresh that lost a race against a
//!   sign-in or sign-out is discarded instead of resurrecting stale tokens.
//! - Sign-out clears local state before telling the backend; the backend call
//!   can fail without leaving the client half signed in.
//! - The auth slice reports backend sign-outs through
//!   [`TokenManager::on_signed_out`], so a signed-out view never coexists
//!   with a held token pair.

use std::sync::Arc;

use arco_api_models::{TokenPair, User};
use arco_gateway::RpcGateway;
use tracing::{debug, info, warn};

use crate::error::{TokenError, TokenResult};
use crate::slices::AuthView;
use crate::sync::{CommitOutcome, StateCell};

/// Holds the signed-in user's tokens and keeps the auth view in step.
///
/// Clones share the same credentials.
#[derive(Clone)]
pub struct TokenManager {
    gateway: Arc<dyn RpcGateway>,
    tokens: StateCell<Option<TokenPair>>,
    auth: StateCell<AuthView>,
}

impl std::fmt::Debug for TokenManager {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("TokenManager")
            .field("has_tokens", &self.tokens.get().is_some())
            .field("is_authenticated", &self.is_authenticated())
            .finish_non_exhaustive()
    }
}

impl TokenManager {
    /// Manager publishing the signed-in state into `auth`.
    #[must_use]
    pub fn new(gateway: Arc<dyn RpcGateway>, auth: StateCell<AuthView>) -> Self {
        Self {
            gateway,
            tokens: StateCell::new(None),
            auth,
        }
    }

    /// Store credentials from a successful handshake.
    pub fn install(&self, user: User, tokens: TokenPair) {
        let _ = self.tokens.replace(Some(tokens));
        let _ = self.auth.replace(AuthView::signed_in(user));
        info!("credentials installed");
    }

    /// Exchange the refresh token for a new pair.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::NoRefreshToken`] without contacting the backend
    /// when signed out, and [`TokenError::Refresh`] when the backend rejects
    /// the exchange; in that case the client is signed out.
    pub async fn refresh(&self) -> TokenResult<()> {
        let Some(current) = self.tokens.get() else {
            debug!("refresh skipped: no credentials held");
            return Err(TokenError::NoRefreshToken);
        };
        let ticket = self.tokens.begin();
        match self.gateway.refresh_token(&current.refresh_token).await {
            Ok(pair) => {
                if self.tokens.commit(ticket, Some(pair)) == CommitOutcome::Superseded {
                    debug!("refreshed tokens discarded: credentials changed meanwhile");
                } else {
                    info!("access token refreshed");
                }
                Ok(())
            }
            Err(source) => {
                if self.tokens.commit(ticket, None) == CommitOutcome::Superseded {
                    debug!("refresh failure ignored: credentials changed meanwhile");
                } else {
                    let _ = self.auth.replace(AuthView::default());
                    warn!(
                        operation = source.operation(),
                        error = %source,
                        "token refresh failed; signed out"
                    );
                }
                Err(TokenError::Refresh { source })
            }
        }
    }

    /// Sign out locally, then notify the backend.
    ///
    /// Local state is cleared even when the backend call fails; the failure is
    /// only logged.
    pub async fn logout(&self) {
        self.clear();
        if let Err(err) = self.gateway.logout().await {
            warn!(
                operation = err.operation(),
                error = %err,
                "backend logout notification failed; local credentials already cleared"
            );
        } else {
            info!("signed out");
        }
    }

    /// Drop the token pair after the auth view went signed out elsewhere
    /// (backend push or failed auth fetch). Returns whether a pair was held.
    pub fn on_signed_out(&self) -> bool {
        if self.tokens.get().is_none() {
            return false;
        }
        let _ = self.tokens.replace(None);
        info!("signed out by backend; credentials dropped");
        true
    }

    /// Drop credentials without contacting the backend.
    pub fn clear(&self) {
        let _ = self.tokens.replace(None);
        let _ = self.auth.replace(AuthView::default());
    }

    /// Current token pair.
    #[must_use]
    pub fn tokens(&self) -> Option<TokenPair> {
        self.tokens.get()
    }

    /// Current access token.
    #[must_use]
    pub fn access_token(&self) -> Option<String> {
        self.tokens.get().map(|pair| pair.access_token)
    }

    /// Whether the auth view reports a signed-in user.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.auth.get().is_authenticated
    }

    /// Observe token changes (for transports attaching bearer headers).
    #[must_use]
    pub fn subscribe(&self) -> tokio::sync::watch::Receiver<Option<TokenPair>> {
        self.tokens.subscribe()
    }
}
