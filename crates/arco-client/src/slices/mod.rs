//! Domain reconcilers and the slices built from them.
//!
//! Global slices (auth, settings, subscription, notifications, catalogs) live
//! for the whole session; per-entity slices (backup, repository, mount) are
//! created on demand and torn down when their view goes away.

pub mod auth;
pub mod backup;
pub mod catalog;
pub mod mount;
pub mod notification;
pub mod repository;
pub mod settings;
pub mod subscription;

pub use auth::{AuthReconciler, AuthSlice, AuthView};
pub use backup::{BackupReconciler, BackupSlice};
pub use catalog::{ProfilesReconciler, ProfilesSlice, RepositoriesReconciler, RepositoriesSlice};
pub use mount::{MountReconciler, MountSlice};
pub use notification::{NotificationReconciler, NotificationSlice};
pub use repository::{RepositoryReconciler, RepositorySlice, RepositoryView};
pub use settings::{SettingsReconciler, SettingsSlice};
pub use subscription::{SubscriptionReconciler, SubscriptionSlice, SubscriptionView};
