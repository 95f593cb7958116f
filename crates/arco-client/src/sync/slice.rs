//! Generic event-driven mirror of backend state.
//!
//! # Design
//! - A [`Reconciler`] says what to fetch and which events invalidate it; the
//!   [`StateSlice`] owns the cell, the listeners and the refetch loop.
//! - Events carry no payload: every trigger re-fetches the full state.
//! - Handlers hold a weak reference, so late events after drop are ignored.
//! - Fetch failures never reach the event channel; they are logged and the
//!   cell follows the reconciler's [`FailurePolicy`].

use std::fmt::Debug;
use std::sync::{Arc, Weak};

use arco_events::{EventChannel, EventEnvelope, EventHandler, EventName};
use arco_gateway::{RpcGateway, RpcResult};
use async_trait::async_trait;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::error::{SliceError, SliceResult};
use crate::sync::cell::{CommitOutcome, StateCell};
use crate::sync::registry::{Lifecycle, ListenerBinding, SubscriptionRegistry};

/// What a slice shows after a failed fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Fall back to the state's default (used where stale data is unsafe).
    ResetToDefault,
    /// Keep showing the last successfully fetched state.
    KeepLastKnown,
}

/// Domain half of a slice: the fetch and its triggering events.
#[async_trait]
pub trait Reconciler: Send + Sync + 'static {
    /// Mirrored value.
    type State: Clone + Default + PartialEq + Debug + Send + Sync + 'static;

    /// Stable name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Events that invalidate the mirrored value.
    fn events(&self) -> Vec<EventName>;

    /// Behaviour on fetch failure.
    fn failure_policy(&self) -> FailurePolicy {
        FailurePolicy::KeepLastKnown
    }

    /// Fetch the authoritative value.
    async fn fetch(&self, gateway: &dyn RpcGateway) -> RpcResult<Self::State>;

    /// Called after `state` was committed to the cell, whether fetched or
    /// reset by the failure policy. Not called for superseded results.
    fn committed(&self, _state: &Self::State) {}
}

struct SliceCore<R: Reconciler> {
    reconciler: R,
    gateway: Arc<dyn RpcGateway>,
    cell: StateCell<R::State>,
}

impl<R: Reconciler> SliceCore<R> {
    async fn reconcile(&self) -> SliceResult<()> {
        let slice = self.reconciler.name();
        let ticket = self.cell.begin();
        match self.reconciler.fetch(self.gateway.as_ref()).await {
            Ok(state) => {
                let outcome = self.cell.commit(ticket, state.clone());
                if outcome == CommitOutcome::Superseded {
                    debug!(slice, "discarded result of an overtaken reconciliation");
                } else {
                    debug!(slice, ?outcome, "state reconciled");
                    self.reconciler.committed(&state);
                }
                Ok(())
            }
            Err(source) => {
                let policy = self.reconciler.failure_policy();
                if policy == FailurePolicy::ResetToDefault {
                    let reset = R::State::default();
                    if self.cell.commit(ticket, reset.clone()) != CommitOutcome::Superseded {
                        self.reconciler.committed(&reset);
                    }
                }
                warn!(
                    slice,
                    operation = source.operation(),
                    error = %source,
                    ?policy,
                    "state reconciliation failed"
                );
                Err(SliceError::Reconcile { slice, source })
            }
        }
    }

    fn handler(core: Weak<Self>) -> EventHandler {
        Arc::new(move |envelope: &EventEnvelope| {
            let Some(core) = core.upgrade() else {
                return;
            };
            let Ok(runtime) = Handle::try_current() else {
                warn!(
                    slice = core.reconciler.name(),
                    event = %envelope.name,
                    "event delivered outside a runtime; reconciliation skipped"
                );
                return;
            };
            let event = envelope.name.clone();
            drop(runtime.spawn(async move {
                debug!(slice = core.reconciler.name(), %event, "event triggered reconciliation");
                let _ = core.reconcile().await;
            }));
        })
    }
}

/// Local mirror of one piece of backend state, refreshed on events.
pub struct StateSlice<R: Reconciler> {
    core: Arc<SliceCore<R>>,
    registry: SubscriptionRegistry,
}

impl<R: Reconciler> Debug for StateSlice<R> {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("StateSlice")
            .field("name", &self.core.reconciler.name())
            .field("state", &self.core.cell.get())
            .field("registry", &self.registry)
            .finish()
    }
}

impl<R: Reconciler> StateSlice<R> {
    /// Slice starting from the default state.
    #[must_use]
    pub fn new(
        reconciler: R,
        gateway: Arc<dyn RpcGateway>,
        channel: Arc<dyn EventChannel>,
    ) -> Self {
        Self::with_cell(reconciler, gateway, channel, StateCell::default())
    }

    /// Slice publishing into an existing cell shared with other writers.
    #[must_use]
    pub fn with_cell(
        reconciler: R,
        gateway: Arc<dyn RpcGateway>,
        channel: Arc<dyn EventChannel>,
        cell: StateCell<R::State>,
    ) -> Self {
        let name = reconciler.name();
        let events = reconciler.events();
        let core = Arc::new(SliceCore {
            reconciler,
            gateway,
            cell,
        });
        let bindings = events
            .into_iter()
            .map(|event| ListenerBinding {
                event,
                handler: SliceCore::handler(Arc::downgrade(&core)),
            })
            .collect();
        Self {
            core,
            registry: SubscriptionRegistry::new(name, channel, bindings),
        }
    }

    /// Fetch once, then start listening.
    ///
    /// A failed initial fetch is logged and handled by the failure policy;
    /// listeners are subscribed either way so the next event can recover.
    pub async fn start(&self) {
        let _ = self.reconcile().await;
        self.registry.setup();
    }

    /// Fetch the authoritative value now.
    ///
    /// # Errors
    ///
    /// Returns an error when the fetch failed; the cell already reflects the
    /// failure policy.
    pub async fn reconcile(&self) -> SliceResult<()> {
        self.core.reconcile().await
    }

    /// Release all listeners. Idempotent; also happens on drop.
    pub fn teardown(&self) {
        self.registry.teardown();
    }

    /// Snapshot of the mirrored value.
    #[must_use]
    pub fn state(&self) -> R::State {
        self.core.cell.get()
    }

    /// Observe the mirrored value.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<R::State> {
        self.core.cell.subscribe()
    }

    /// Cell the slice publishes into.
    #[must_use]
    pub fn cell(&self) -> &StateCell<R::State> {
        &self.core.cell
    }

    /// Domain half of the slice.
    #[must_use]
    pub fn reconciler(&self) -> &R {
        &self.core.reconciler
    }

    /// Listener registry.
    #[must_use]
    pub const fn registry(&self) -> &SubscriptionRegistry {
        &self.registry
    }

    /// Whether listeners are live.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.registry.lifecycle() == Lifecycle::Active
    }

    pub(crate) fn gateway(&self) -> &dyn RpcGateway {
        self.core.gateway.as_ref()
    }
}
