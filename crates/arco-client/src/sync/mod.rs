//! Reactive state primitives shared by every slice.
//!
//! Layout: `cell.rs` (observable value with start-ordered writes),
//! `registry.rs` (listener lifecycle), `slice.rs` (reconciler trait and the
//! generic slice that ties a cell to its events).

pub mod cell;
pub mod registry;
pub mod slice;

pub use cell::{CommitOutcome, StateCell, WriteTicket};
pub use registry::{Lifecycle, ListenerBinding, SubscriptionRegistry};
pub use slice::{FailurePolicy, Reconciler, StateSlice};
