#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Client core of the Arco desktop backup manager.
//!
//! Two concerns live here:
//! - the magic-link authentication handshake (start, poll, cancel, token
//!   refresh, logout) with strict release of timers and pending requests;
//! - local mirrors ("slices") of backend-authoritative state, each re-fetched
//!   in full whenever the backend emits one of the events it subscribes to.
//!
//! Layout: `sync/` (state cells, listener registries, the generic slice),
//! `slices/` (one reconciler per domain), `session/` (poller, tokens, the
//! auth facade), `bootstrap.rs` (wiring and shutdown), `error.rs`.

pub mod bootstrap;
pub mod error;
pub mod session;
pub mod slices;
pub mod sync;

pub use bootstrap::{ClientCore, init_telemetry};
pub use error::{
    ClientError, ClientResult, SessionError, SessionResult, SliceError, SliceResult, TokenError,
    TokenResult,
};
pub use session::{AuthSession, Authenticated, PollerConfig, Session, SessionPoller, TokenManager};
pub use sync::{
    CommitOutcome, FailurePolicy, Lifecycle, ListenerBinding, Reconciler, StateCell, StateSlice,
    SubscriptionRegistry, WriteTicket,
};
