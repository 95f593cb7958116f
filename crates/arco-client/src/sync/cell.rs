//! Observable value with start-ordered writes.
//!
//! # Design
//! - Backed by a `watch` channel so any number of observers see the latest value.
//! - Writers take a ticket before their fetch and commit after; a commit whose
//!   ticket was overtaken by a later `begin` is dropped, so the newest
//!   reconciliation to *start* wins regardless of completion order.
//! - Equal values are not re-broadcast.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;

/// Handle proving a write started at a given point in the cell's history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct WriteTicket(u64);

/// Outcome of [`StateCell::commit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The value changed and observers were notified.
    Applied,
    /// The value equalled the current one; nothing was broadcast.
    Unchanged,
    /// A newer write started after this ticket; the value was discarded.
    Superseded,
}

/// Shared, observable mirror of one value.
#[derive(Debug)]
pub struct StateCell<T> {
    inner: Arc<CellInner<T>>,
}

#[derive(Debug)]
struct CellInner<T> {
    sender: watch::Sender<T>,
    started: AtomicU64,
}

impl<T> Clone for StateCell<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Default> Default for StateCell<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> StateCell<T> {
    /// Cell holding `initial`.
    #[must_use]
    pub fn new(initial: T) -> Self {
        let (sender, _) = watch::channel(initial);
        Self {
            inner: Arc::new(CellInner {
                sender,
                started: AtomicU64::new(0),
            }),
        }
    }

    /// Observe subsequent changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.inner.sender.subscribe()
    }

    /// Reserve the right to write; later tickets overrule earlier ones.
    #[must_use]
    pub fn begin(&self) -> WriteTicket {
        WriteTicket(self.inner.started.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn is_latest(&self, ticket: WriteTicket) -> bool {
        self.inner.started.load(Ordering::SeqCst) == ticket.0
    }
}

impl<T: Clone + PartialEq> StateCell<T> {
    /// Snapshot of the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.inner.sender.borrow().clone()
    }

    /// Publish `value` unless a newer write has started since `ticket`.
    pub fn commit(&self, ticket: WriteTicket, value: T) -> CommitOutcome {
        let mut outcome = CommitOutcome::Superseded;
        self.inner.sender.send_if_modified(|current| {
            if !self.is_latest(ticket) {
                return false;
            }
            if *current == value {
                outcome = CommitOutcome::Unchanged;
                return false;
            }
            *current = value;
            outcome = CommitOutcome::Applied;
            true
        });
        outcome
    }

    /// Publish `value` immediately, overruling every write in flight.
    pub fn replace(&self, value: T) -> CommitOutcome {
        let ticket = self.begin();
        self.commit(ticket, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_start_wins_regardless_of_completion_order() {
        let cell = StateCell::new(0_u32);
        let first = cell.begin();
        let second = cell.begin();

        assert_eq!(cell.commit(second, 2), CommitOutcome::Applied);
        assert_eq!(cell.commit(first, 1), CommitOutcome::Superseded);
        assert_eq!(cell.get(), 2);
    }

    #[test]
    fn replace_overrules_writes_in_flight() {
        let cell = StateCell::new(String::from("initial"));
        let pending = cell.begin();
        assert_eq!(cell.replace("signed out".into()), CommitOutcome::Applied);
        assert_eq!(cell.commit(pending, "stale".into()), CommitOutcome::Superseded);
        assert_eq!(cell.get(), "signed out");
    }

    #[tokio::test]
    async fn observers_see_changes_but_not_repeats() {
        let cell = StateCell::new(1_u8);
        let mut observer = cell.subscribe();

        assert_eq!(cell.replace(1), CommitOutcome::Unchanged);
        assert!(!observer.has_changed().expect("sender alive"));

        assert_eq!(cell.replace(5), CommitOutcome::Applied);
        observer.changed().await.expect("change notified");
        assert_eq!(*observer.borrow_and_update(), 5);
    }

    #[test]
    fn clones_share_one_value() {
        let cell = StateCell::<Vec<u8>>::default();
        let clone = cell.clone();
        clone.replace(vec![1, 2]);
        assert_eq!(cell.get(), vec![1, 2]);
    }
}
