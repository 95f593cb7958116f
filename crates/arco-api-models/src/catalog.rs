//! Settings, subscription, notification and catalog DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Colour scheme preference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Theme {
    /// Always light.
    Light,
    /// Always dark.
    Dark,
    /// Follow the operating system.
    #[default]
    System,
}

/// Persisted application settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Expose advanced options.
    pub expert_mode: bool,
    /// Colour scheme preference.
    pub theme: Theme,
    /// Disable UI transitions.
    pub disable_transitions: bool,
    /// Disable UI shadows.
    pub disable_shadows: bool,
    /// The macFUSE warning was dismissed.
    pub macfuse_warning_dismissed: bool,
    /// The full-disk-access warning was dismissed.
    pub full_disk_access_warning_dismissed: bool,
}

/// Active cloud subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    /// Subscription identifier.
    pub id: String,
    /// Plan name.
    pub plan: String,
    /// End of the current billing period.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_period_end: Option<DateTime<Utc>>,
    /// Whether the subscription ends at the period end.
    #[serde(default)]
    pub cancel_at_period_end: bool,
}

/// Outcome of a checkout session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CheckoutStatus {
    /// The customer has not finished paying.
    Pending,
    /// Payment succeeded; a `subscriptionAdded` event follows.
    Completed,
    /// Payment failed.
    Failed,
    /// The checkout session timed out.
    Timeout,
}

/// Latest checkout result held by the backend until acknowledged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResult {
    /// Outcome.
    pub status: CheckoutStatus,
    /// Failure detail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl CheckoutResult {
    /// Message to surface, if this outcome needs one. Successful checkouts are
    /// announced by the subscription itself and pending ones stay silent.
    #[must_use]
    pub fn user_message(&self) -> Option<String> {
        match self.status {
            CheckoutStatus::Failed => Some(format!(
                "Checkout failed: {}",
                self.error_message.as_deref().unwrap_or("Please try again.")
            )),
            CheckoutStatus::Timeout => Some("Checkout timed out. Please try again.".to_string()),
            CheckoutStatus::Completed | CheckoutStatus::Pending => None,
        }
    }
}

/// Severity of a notification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NotificationLevel {
    /// Informational.
    #[default]
    Info,
    /// Something needs attention.
    Warning,
    /// Something failed.
    Error,
}

/// Notification raised by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Notification identifier.
    pub id: i64,
    /// Display text.
    pub message: String,
    /// Severity.
    pub level: NotificationLevel,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// Backup profile as listed in the sidebar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupProfileSummary {
    /// Profile identifier.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Repositories the profile backs up into.
    #[serde(default)]
    pub repository_ids: Vec<i64>,
}

/// Repository as listed in the sidebar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositorySummary {
    /// Repository identifier.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Local path or remote URL.
    pub location: String,
}

impl RepositorySummary {
    /// Local repositories live at an absolute path; everything else is remote.
    #[must_use]
    pub fn is_local(&self) -> bool {
        self.location.starts_with('/')
    }
}
