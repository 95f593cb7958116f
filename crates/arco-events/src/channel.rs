//! Listener handles and the channel abstraction consumed by the client core.

use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::names::EventName;

/// Identifier assigned to each emitted event.
pub type EventId = u64;

/// Metadata wrapper delivered to listeners. Events carry no payload; the
/// envelope only says which name fired and when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Sequential identifier assigned by the channel.
    pub id: EventId,
    /// Name that fired.
    pub name: EventName,
    /// Emission timestamp.
    pub timestamp: DateTime<Utc>,
}

/// Callback invoked synchronously for every matching emission.
///
/// Handlers must not block; anything async is spawned by the handler itself.
pub type EventHandler = Arc<dyn Fn(&EventEnvelope) + Send + Sync>;

/// Publish/subscribe transport keyed by exact event name.
pub trait EventChannel: Send + Sync {
    /// Register `handler` for `name`. The listener stays live until the
    /// returned handle is released or dropped.
    fn on(&self, name: &EventName, handler: EventHandler) -> ListenerHandle;
}

/// Unsubscribe capability for one registered listener.
///
/// The release closure runs exactly once: on [`ListenerHandle::release`] or,
/// if that never happens, when the handle is dropped.
pub struct ListenerHandle {
    name: EventName,
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl ListenerHandle {
    /// Wrap a release closure for the listener registered under `name`.
    #[must_use]
    pub fn new(name: EventName, release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            name,
            release: Some(Box::new(release)),
        }
    }

    /// Event name the listener was registered for.
    #[must_use]
    pub const fn event(&self) -> &EventName {
        &self.name
    }

    /// Unsubscribe now.
    pub fn release(mut self) {
        self.run_release();
    }

    fn run_release(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.run_release();
    }
}

impl Debug for ListenerHandle {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ListenerHandle")
            .field("name", &self.name)
            .field("live", &self.release.is_some())
            .finish()
    }
}
