//! In-process event bus.
//!
//! Listeners are kept per exact name and invoked synchronously on `emit`. A
//! `tokio::broadcast` tap mirrors every emission for observers that want the
//! whole stream (diagnostics, tests); when the tap overflows the oldest
//! envelopes are dropped.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use chrono::Utc;
use tokio::sync::broadcast::{self, Sender};
use tokio_stream::wrappers::BroadcastStream;
use tracing::trace;

use crate::channel::{EventChannel, EventEnvelope, EventHandler, EventId, ListenerHandle};
use crate::names::EventName;

/// Default capacity of the broadcast tap.
const DEFAULT_TAP_CAPACITY: usize = 256;

/// Stream of every envelope emitted on the bus.
pub type EventStream = BroadcastStream<EventEnvelope>;

type ListenerId = u64;

struct Listener {
    id: ListenerId,
    handler: EventHandler,
}

struct BusInner {
    listeners: Mutex<HashMap<EventName, Vec<Listener>>>,
    next_listener: AtomicU64,
    next_event: AtomicU64,
    tap: Sender<EventEnvelope>,
}

impl BusInner {
    fn lock_listeners(&self) -> MutexGuard<'_, HashMap<EventName, Vec<Listener>>> {
        self.listeners
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn remove(&self, name: &EventName, id: ListenerId) {
        let mut listeners = self.lock_listeners();
        if let Some(entries) = listeners.get_mut(name) {
            entries.retain(|listener| listener.id != id);
            if entries.is_empty() {
                listeners.remove(name);
            }
        }
    }
}

/// Shared bus; clones refer to the same listener table.
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

impl EventBus {
    /// Construct a bus whose broadcast tap buffers `tap_capacity` envelopes.
    ///
    /// # Panics
    ///
    /// Panics if `tap_capacity` is zero.
    #[must_use]
    pub fn with_capacity(tap_capacity: usize) -> Self {
        assert!(tap_capacity > 0, "event bus capacity must be positive");
        let (tap, _) = broadcast::channel(tap_capacity);
        Self {
            inner: Arc::new(BusInner {
                listeners: Mutex::new(HashMap::new()),
                next_listener: AtomicU64::new(1),
                next_event: AtomicU64::new(1),
                tap,
            }),
        }
    }

    /// Construct a bus with the default tap capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_TAP_CAPACITY)
    }

    /// Emit `name`, invoking every listener registered for exactly that name.
    ///
    /// Handlers run outside the listener lock, so a handler may subscribe or
    /// release listeners without deadlocking.
    pub fn emit(&self, name: impl Into<EventName>) -> EventId {
        let name = name.into();
        let id = self.inner.next_event.fetch_add(1, Ordering::Relaxed);
        let envelope = EventEnvelope {
            id,
            name,
            timestamp: Utc::now(),
        };

        let handlers: Vec<EventHandler> = self
            .inner
            .lock_listeners()
            .get(&envelope.name)
            .map(|entries| entries.iter().map(|l| Arc::clone(&l.handler)).collect())
            .unwrap_or_default();

        trace!(
            event = %envelope.name,
            event_id = id,
            listeners = handlers.len(),
            "dispatching event"
        );
        for handler in &handlers {
            handler(&envelope);
        }
        let _ = self.inner.tap.send(envelope);
        id
    }

    /// Number of live listeners for `name`.
    #[must_use]
    pub fn listener_count(&self, name: &EventName) -> usize {
        self.inner.lock_listeners().get(name).map_or(0, Vec::len)
    }

    /// Number of live listeners across all names.
    #[must_use]
    pub fn total_listeners(&self) -> usize {
        self.inner.lock_listeners().values().map(Vec::len).sum()
    }

    /// Observe every envelope emitted from now on.
    #[must_use]
    pub fn tap(&self) -> EventStream {
        BroadcastStream::new(self.inner.tap.subscribe())
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventChannel for EventBus {
    fn on(&self, name: &EventName, handler: EventHandler) -> ListenerHandle {
        let id = self.inner.next_listener.fetch_add(1, Ordering::Relaxed);
        self.inner
            .lock_listeners()
            .entry(name.clone())
            .or_default()
            .push(Listener { id, handler });

        let weak: Weak<BusInner> = Arc::downgrade(&self.inner);
        let key = name.clone();
        ListenerHandle::new(name.clone(), move || {
            if let Some(inner) = weak.upgrade() {
                inner.remove(&key, id);
            }
        })
    }
}
