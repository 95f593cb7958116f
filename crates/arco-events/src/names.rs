//! Event kinds and deterministic event-name construction.
//!
//! # Design
//! - Kinds serialize to the camelCase strings the backend emits.
//! - Composite names are `kind:suffix`; the suffix is built from ids only, so two
//!   producers always agree on the exact string for the same target.

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

/// Separator between an event kind and its identifier suffix.
const COMPOSITE_SEPARATOR: char = ':';

/// Every event kind the backend can announce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventKind {
    /// Authentication state changed (signed in, signed out, token revoked).
    AuthStateChanged,
    /// Persisted application settings changed.
    SettingsChanged,
    /// A backup job changed state; composite per profile/repository pair.
    BackupStateChanged,
    /// A repository changed state; composite per repository.
    RepoStateChanged,
    /// The archive list of a repository changed; composite per repository.
    ArchivesChanged,
    /// A repository or archive was mounted or unmounted; composite per repository.
    MountStateChanged,
    /// A cloud subscription became active.
    SubscriptionAdded,
    /// A cloud subscription was cancelled.
    SubscriptionCancelled,
    /// A checkout session finished, failed or timed out.
    CheckoutStateChanged,
    /// A notification was created.
    NotificationCreated,
    /// A notification was dismissed.
    NotificationDismissed,
    /// A backup profile was created.
    BackupProfileCreated,
    /// A backup profile was updated.
    BackupProfileUpdated,
    /// A backup profile was deleted.
    BackupProfileDeleted,
    /// A repository was created.
    RepositoryCreated,
    /// A repository was updated.
    RepositoryUpdated,
    /// A repository was deleted.
    RepositoryDeleted,
}

impl EventKind {
    /// All kinds, in declaration order.
    pub const ALL: [Self; 17] = [
        Self::AuthStateChanged,
        Self::SettingsChanged,
        Self::BackupStateChanged,
        Self::RepoStateChanged,
        Self::ArchivesChanged,
        Self::MountStateChanged,
        Self::SubscriptionAdded,
        Self::SubscriptionCancelled,
        Self::CheckoutStateChanged,
        Self::NotificationCreated,
        Self::NotificationDismissed,
        Self::BackupProfileCreated,
        Self::BackupProfileUpdated,
        Self::BackupProfileDeleted,
        Self::RepositoryCreated,
        Self::RepositoryUpdated,
        Self::RepositoryDeleted,
    ];

    /// Wire string for the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AuthStateChanged => "authStateChanged",
            Self::SettingsChanged => "settingsChanged",
            Self::BackupStateChanged => "backupStateChanged",
            Self::RepoStateChanged => "repoStateChanged",
            Self::ArchivesChanged => "archivesChanged",
            Self::MountStateChanged => "mountStateChanged",
            Self::SubscriptionAdded => "subscriptionAdded",
            Self::SubscriptionCancelled => "subscriptionCancelled",
            Self::CheckoutStateChanged => "checkoutStateChanged",
            Self::NotificationCreated => "notificationCreated",
            Self::NotificationDismissed => "notificationDismissed",
            Self::BackupProfileCreated => "backupProfileCreated",
            Self::BackupProfileUpdated => "backupProfileUpdated",
            Self::BackupProfileDeleted => "backupProfileDeleted",
            Self::RepositoryCreated => "repositoryCreated",
            Self::RepositoryUpdated => "repositoryUpdated",
            Self::RepositoryDeleted => "repositoryDeleted",
        }
    }

    /// Look a kind up by its wire string.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == value)
    }
}

impl Display for EventKind {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Fully qualified event name used for subscription matching.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventName(String);

impl EventName {
    /// Composite name `kind:suffix`.
    #[must_use]
    pub fn composite(kind: EventKind, suffix: impl Display) -> Self {
        Self(format!("{}{COMPOSITE_SEPARATOR}{suffix}", kind.as_str()))
    }

    /// Name announcing a backup job change for a profile/repository pair.
    #[must_use]
    pub fn backup_state_changed(backup_profile_id: i64, repository_id: i64) -> Self {
        Self::composite(
            EventKind::BackupStateChanged,
            format_args!("{backup_profile_id}-{repository_id}"),
        )
    }

    /// Name announcing a repository status change.
    #[must_use]
    pub fn repo_state_changed(repository_id: i64) -> Self {
        Self::composite(EventKind::RepoStateChanged, repository_id)
    }

    /// Name announcing a change to a repository's archive list.
    #[must_use]
    pub fn archives_changed(repository_id: i64) -> Self {
        Self::composite(EventKind::ArchivesChanged, repository_id)
    }

    /// Name announcing a mount or unmount within a repository.
    #[must_use]
    pub fn mount_state_changed(repository_id: i64) -> Self {
        Self::composite(EventKind::MountStateChanged, repository_id)
    }

    /// Raw string form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Kind prefix, when the name starts with a known kind.
    #[must_use]
    pub fn kind(&self) -> Option<EventKind> {
        let prefix = self
            .0
            .split_once(COMPOSITE_SEPARATOR)
            .map_or(self.0.as_str(), |(prefix, _)| prefix);
        EventKind::parse(prefix)
    }
}

impl From<EventKind> for EventName {
    fn from(kind: EventKind) -> Self {
        Self(kind.as_str().to_string())
    }
}

impl From<&str> for EventName {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for EventName {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Display for EventName {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composite_names_follow_backend_format() {
        assert_eq!(
            EventName::backup_state_changed(3, 7).as_str(),
            "backupStateChanged:3-7"
        );
        assert_eq!(EventName::repo_state_changed(42).as_str(), "repoStateChanged:42");
        assert_eq!(EventName::archives_changed(42).as_str(), "archivesChanged:42");
        assert_eq!(
            EventName::mount_state_changed(9).as_str(),
            "mountStateChanged:9"
        );
    }

    #[test]
    fn kind_prefix_is_recovered_from_names() {
        assert_eq!(
            EventName::repo_state_changed(1).kind(),
            Some(EventKind::RepoStateChanged)
        );
        assert_eq!(
            EventName::from(EventKind::SubscriptionAdded).kind(),
            Some(EventKind::SubscriptionAdded)
        );
        assert_eq!(EventName::from("unknownThing:1").kind(), None);
    }

    #[test]
    fn display_matches_wire_string() {
        assert_eq!(
            EventKind::CheckoutStateChanged.to_string(),
            "checkoutStateChanged"
        );
        assert_eq!(EventKind::parse("notificationCreated"), Some(EventKind::NotificationCreated));
        assert_eq!(EventKind::parse("notificationAvailable"), None);
    }
}
