//! Mirror of the backend's signed-in state.

use arco_api_models::User;
use arco_events::{EventKind, EventName};
use arco_gateway::{RpcGateway, RpcResult};
use async_trait::async_trait;

use crate::session::TokenManager;
use crate::sync::{FailurePolicy, Reconciler, StateSlice};

/// Whether someone is signed in, and who.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthView {
    /// A valid session is held.
    pub is_authenticated: bool,
    /// Signed-in account; `None` when signed out or not yet loaded.
    pub user: Option<User>,
}

impl AuthView {
    /// View of a signed-in `user`.
    #[must_use]
    pub const fn signed_in(user: User) -> Self {
        Self {
            is_authenticated: true,
            user: Some(user),
        }
    }
}

/// Fetches auth state, and the profile when signed in.
///
/// A failed fetch shows "signed out": treating stale credentials as valid is
/// worse than asking the user to sign in again. When bound to a
/// [`TokenManager`], every committed signed-out view also drops the token
/// pair.
#[derive(Debug, Clone, Default)]
pub struct AuthReconciler {
    tokens: Option<TokenManager>,
}

impl AuthReconciler {
    /// Reconciler that drops `tokens` whenever the view goes signed out.
    #[must_use]
    pub const fn with_tokens(tokens: TokenManager) -> Self {
        Self {
            tokens: Some(tokens),
        }
    }
}

#[async_trait]
impl Reconciler for AuthReconciler {
    type State = AuthView;

    fn name(&self) -> &'static str {
        "auth"
    }

    fn events(&self) -> Vec<EventName> {
        vec![EventKind::AuthStateChanged.into()]
    }

    fn failure_policy(&self) -> FailurePolicy {
        FailurePolicy::ResetToDefault
    }

    async fn fetch(&self, gateway: &dyn RpcGateway) -> RpcResult<AuthView> {
        if !gateway.get_auth_state().await?.is_authenticated {
            return Ok(AuthView::default());
        }
        let user = gateway.get_current_user().await?;
        Ok(AuthView {
            is_authenticated: true,
            user,
        })
    }

    fn committed(&self, state: &AuthView) {
        if state.is_authenticated {
            return;
        }
        if let Some(tokens) = &self.tokens {
            let _ = tokens.on_signed_out();
        }
    }
}

/// Slice mirroring [`AuthView`].
pub type AuthSlice = StateSlice<AuthReconciler>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use arco_api_models::AuthState;
    use arco_events::EventBus;

    use crate::sync::StateCell;
    use arco_test_support::fixtures::{sample_tokens, sample_user, settle, unavailable};
    use arco_test_support::mocks::{Call, ScriptedGateway};

    #[tokio::test]
    async fn signed_out_backend_skips_the_profile_fetch() {
        let gateway = Arc::new(ScriptedGateway::new());
        let slice = AuthSlice::new(AuthReconciler::default(), gateway.clone(), Arc::new(EventBus::new()));

        slice.reconcile().await.expect("reconcile");

        assert_eq!(slice.state(), AuthView::default());
        assert_eq!(gateway.calls(), vec![Call::GetAuthState]);
    }

    #[tokio::test(start_paused = true)]
    async fn auth_events_load_the_signed_in_user() {
        let gateway = Arc::new(ScriptedGateway::new());
        let bus = EventBus::new();
        let slice = AuthSlice::new(AuthReconciler::default(), gateway.clone(), Arc::new(bus.clone()));
        slice.start().await;

        gateway.set_auth_state(Ok(AuthState {
            is_authenticated: true,
        }));
        gateway.set_current_user(Ok(Some(sample_user())));
        bus.emit(EventKind::AuthStateChanged);
        settle().await;

        assert_eq!(slice.state(), AuthView::signed_in(sample_user()));
    }

    #[tokio::test]
    async fn fetch_failure_shows_signed_out() {
        let gateway = Arc::new(ScriptedGateway::new());
        gateway.set_auth_state(Ok(AuthState {
            is_authenticated: true,
        }));
        gateway.set_current_user(Ok(Some(sample_user())));
        let slice = AuthSlice::new(AuthReconciler::default(), gateway.clone(), Arc::new(EventBus::new()));
        slice.reconcile().await.expect("signed in");
        assert!(slice.state().is_authenticated);

        gateway.set_current_user(Err(unavailable("get_current_user")));
        assert!(slice.reconcile().await.is_err());
        assert_eq!(slice.state(), AuthView::default());
    }

    #[tokio::test]
    async fn signed_out_view_drops_bound_tokens() {
        let gateway = Arc::new(ScriptedGateway::new());
        gateway.set_auth_state(Ok(AuthState {
            is_authenticated: true,
        }));
        gateway.set_current_user(Ok(Some(sample_user())));
        let view = StateCell::default();
        let tokens = TokenManager::new(gateway.clone(), view.clone());
        let slice = AuthSlice::with_cell(
            AuthReconciler::with_tokens(tokens.clone()),
            gateway.clone(),
            Arc::new(EventBus::new()),
            view,
        );
        tokens.install(sample_user(), sample_tokens(1));

        slice.reconcile().await.expect("still signed in");
        assert_eq!(tokens.tokens(), Some(sample_tokens(1)));

        gateway.set_auth_state(Err(unavailable("get_auth_state")));
        assert!(slice.reconcile().await.is_err());
        assert!(!tokens.is_authenticated());
        assert_eq!(tokens.tokens(), None);
    }
}
