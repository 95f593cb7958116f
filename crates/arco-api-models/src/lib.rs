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
    clippy::cargo,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
//! Shared DTOs exchanged between the Arco client core and the local backend.
//!
//! Field names serialize in camelCase to match what the backend bindings
//! produce, so the same values can cross any request/response transport.

pub mod auth;
pub mod catalog;
pub mod state;

pub use auth::{AuthState, AuthStatusSnapshot, SessionKind, SessionStart, TokenPair, User};
pub use catalog::{
    BackupProfileSummary, CheckoutResult, CheckoutStatus, Notification, NotificationLevel,
    RepositorySummary, Settings, Subscription, Theme,
};
pub use state::{
    BackupButtonStatus, BackupId, BackupProgress, BackupState, BackupStatus, MountState,
    RepoState, RepoStatus,
};
