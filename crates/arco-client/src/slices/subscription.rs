//! Mirror of the cloud subscription and the pending checkout outcome.

use arco_api_models::{CheckoutResult, Subscription};
use arco_events::{EventKind, EventName};
use arco_gateway::{RpcGateway, RpcResult};
use async_trait::async_trait;
use tracing::info;

use crate::error::{SliceError, SliceResult};
use crate::sync::{Reconciler, StateSlice};

/// Subscription plus the latest unacknowledged checkout result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionView {
    /// Active subscription, if any.
    pub subscription: Option<Subscription>,
    /// Checkout outcome waiting to be shown.
    pub checkout: Option<CheckoutResult>,
}

impl SubscriptionView {
    /// Toast text for a failed or timed-out checkout.
    #[must_use]
    pub fn checkout_message(&self) -> Option<String> {
        self.checkout.as_ref().and_then(CheckoutResult::user_message)
    }
}

/// Refetches on `subscriptionAdded`, `subscriptionCancelled` and
/// `checkoutStateChanged`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubscriptionReconciler;

#[async_trait]
impl Reconciler for SubscriptionReconciler {
    type State = SubscriptionView;

    fn name(&self) -> &'static str {
        "subscription"
    }

    fn events(&self) -> Vec<EventName> {
        [
            EventKind::SubscriptionAdded,
            EventKind::SubscriptionCancelled,
            EventKind::CheckoutStateChanged,
        ]
        .into_iter()
        .map(EventName::from)
        .collect()
    }

    async fn fetch(&self, gateway: &dyn RpcGateway) -> RpcResult<SubscriptionView> {
        let subscription = gateway.get_subscription().await?;
        let checkout = gateway.get_checkout_result().await?;
        Ok(SubscriptionView {
            subscription,
            checkout,
        })
    }
}

/// Slice mirroring [`SubscriptionView`].
pub type SubscriptionSlice = StateSlice<SubscriptionReconciler>;

impl StateSlice<SubscriptionReconciler> {
    /// Mark the pending checkout result as seen and refresh the view.
    ///
    /// # Errors
    ///
    /// Returns an error when the backend refuses the acknowledgement or the
    /// follow-up fetch fails.
    pub async fn acknowledge_checkout(&self) -> SliceResult<()> {
        if self.state().checkout.is_none() {
            return Ok(());
        }
        self.gateway()
            .clear_checkout_result()
            .await
            .map_err(|source| SliceError::Action {
                slice: "subscription",
                operation: "clear_checkout_result",
                source,
            })?;
        info!("checkout result acknowledged");
        self.reconcile().await
    }
}
