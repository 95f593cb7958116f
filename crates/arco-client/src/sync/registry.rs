//! Listener bookkeeping for one slice.
//!
//! # Design
//! - Bindings are declared once; `setup` always releases what it holds before
//!   subscribing again, so repeated setups never stack duplicate listeners.
//! - `teardown` is idempotent and also runs on drop.
//! - The registry lock is held across subscribe/release so concurrent setups
//!   cannot interleave.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use arco_events::{EventChannel, EventHandler, EventName, ListenerHandle};
use tracing::debug;

/// Where a registry is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Constructed; nothing subscribed yet.
    Uninitialized,
    /// Every binding has exactly one live listener.
    Active,
    /// All listeners released.
    TornDown,
}

/// An event a slice reacts to, paired with its handler.
#[derive(Clone)]
pub struct ListenerBinding {
    /// Event to listen for.
    pub event: EventName,
    /// Callback run on every emission.
    pub handler: EventHandler,
}

impl std::fmt::Debug for ListenerBinding {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("ListenerBinding")
            .field("event", &self.event)
            .finish_non_exhaustive()
    }
}

struct RegistryState {
    lifecycle: Lifecycle,
    handles: Vec<ListenerHandle>,
}

/// Owns the live listeners of one slice.
pub struct SubscriptionRegistry {
    owner: &'static str,
    channel: Arc<dyn EventChannel>,
    bindings: Vec<ListenerBinding>,
    state: Mutex<RegistryState>,
}

impl std::fmt::Debug for SubscriptionRegistry {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("SubscriptionRegistry")
            .field("owner", &self.owner)
            .field("bindings", &self.bindings)
            .field("lifecycle", &self.lifecycle())
            .finish_non_exhaustive()
    }
}

impl SubscriptionRegistry {
    /// Registry for `owner` that will subscribe `bindings` on `channel`.
    #[must_use]
    pub fn new(
        owner: &'static str,
        channel: Arc<dyn EventChannel>,
        bindings: Vec<ListenerBinding>,
    ) -> Self {
        Self {
            owner,
            channel,
            bindings,
            state: Mutex::new(RegistryState {
                lifecycle: Lifecycle::Uninitialized,
                handles: Vec::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Release any held listeners, then subscribe every binding once.
    pub fn setup(&self) {
        let mut state = self.lock();
        let stale = state.handles.len();
        for handle in state.handles.drain(..) {
            handle.release();
        }
        state.handles = self
            .bindings
            .iter()
            .map(|binding| {
                self.channel
                    .on(&binding.event, Arc::clone(&binding.handler))
            })
            .collect();
        state.lifecycle = Lifecycle::Active;
        debug!(
            slice = self.owner,
            listeners = state.handles.len(),
            released = stale,
            "listeners subscribed"
        );
    }

    /// Release every listener. Safe to call repeatedly.
    pub fn teardown(&self) {
        let mut state = self.lock();
        if state.lifecycle != Lifecycle::Active {
            return;
        }
        let released = state.handles.len();
        for handle in state.handles.drain(..) {
            handle.release();
        }
        state.lifecycle = Lifecycle::TornDown;
        debug!(slice = self.owner, released, "listeners released");
    }

    /// Current lifecycle phase.
    #[must_use]
    pub fn lifecycle(&self) -> Lifecycle {
        self.lock().lifecycle
    }

    /// Number of listeners currently held.
    #[must_use]
    pub fn live_listeners(&self) -> usize {
        self.lock().handles.len()
    }

    /// Events this registry subscribes to.
    pub fn events(&self) -> impl Iterator<Item = &EventName> {
        self.bindings.iter().map(|binding| &binding.event)
    }
}

impl Drop for SubscriptionRegistry {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use arco_events::{EventBus, EventEnvelope, EventKind};

    fn counting_binding(event: EventName, hits: &Arc<AtomicUsize>) -> ListenerBinding {
        let hits = Arc::clone(hits);
        ListenerBinding {
            event,
            handler: Arc::new(move |_: &EventEnvelope| {
                hits.fetch_add(1, Ordering::SeqCst);
            }),
        }
    }

    #[test]
    fn repeated_setup_keeps_one_listener_per_binding() {
        let bus = EventBus::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let registry = SubscriptionRegistry::new(
            "settings",
            Arc::new(bus.clone()),
            vec![counting_binding(
                EventName::from(EventKind::SettingsChanged),
                &hits,
            )],
        );

        for _ in 0..5 {
            registry.setup();
        }
        assert_eq!(registry.live_listeners(), 1);
        assert_eq!(bus.total_listeners(), 1);

        bus.emit(EventKind::SettingsChanged);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn teardown_is_idempotent_and_silences_events() {
        let bus = EventBus::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let registry = SubscriptionRegistry::new(
            "repository",
            Arc::new(bus.clone()),
            vec![
                counting_binding(EventName::repo_state_changed(42), &hits),
                counting_binding(EventName::archives_changed(42), &hits),
            ],
        );
        assert_eq!(registry.lifecycle(), Lifecycle::Uninitialized);

        registry.setup();
        assert_eq!(registry.lifecycle(), Lifecycle::Active);
        assert_eq!(bus.total_listeners(), 2);

        registry.teardown();
        registry.teardown();
        assert_eq!(registry.lifecycle(), Lifecycle::TornDown);
        assert_eq!(registry.live_listeners(), 0);
        assert_eq!(bus.total_listeners(), 0);

        bus.emit(EventName::repo_state_changed(42));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn teardown_before_setup_is_a_no_op() {
        let bus = EventBus::new();
        let registry = SubscriptionRegistry::new("auth", Arc::new(bus), Vec::new());
        registry.teardown();
        assert_eq!(registry.lifecycle(), Lifecycle::Uninitialized);
    }

    #[test]
    fn setup_after_teardown_reactivates() {
        let bus = EventBus::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let registry = SubscriptionRegistry::new(
            "notifications",
            Arc::new(bus.clone()),
            vec![counting_binding(
                EventName::from(EventKind::NotificationCreated),
                &hits,
            )],
        );
        registry.setup();
        registry.teardown();
        registry.setup();
        assert_eq!(registry.lifecycle(), Lifecycle::Active);

        bus.emit(EventKind::NotificationCreated);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn dropping_the_registry_releases_listeners() {
        let bus = EventBus::new();
        let hits = Arc::new(AtomicUsize::new(0));
        {
            let registry = SubscriptionRegistry::new(
                "mount",
                Arc::new(bus.clone()),
                vec![counting_binding(EventName::mount_state_changed(3), &hits)],
            );
            registry.setup();
            assert_eq!(bus.total_listeners(), 1);
        }
        assert_eq!(bus.total_listeners(), 0);
    }
}
