//! Backup, repository and mount status DTOs.

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

/// Identifies one backup job: a profile backing up into a repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupId {
    /// Backup profile identifier.
    pub backup_profile_id: i64,
    /// Repository identifier.
    pub repository_id: i64,
}

impl BackupId {
    /// Pair a profile with a repository.
    #[must_use]
    pub const fn new(backup_profile_id: i64, repository_id: i64) -> Self {
        Self {
            backup_profile_id,
            repository_id,
        }
    }
}

impl Display for BackupId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}-{}", self.backup_profile_id, self.repository_id)
    }
}

/// Lifecycle of a backup job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BackupStatus {
    /// Nothing scheduled or running.
    #[default]
    Idle,
    /// Queued behind another operation on the repository.
    Waiting,
    /// Currently running.
    Running,
    /// Last run finished successfully.
    Completed,
    /// Last run was cancelled.
    Cancelled,
    /// Last run failed.
    Failed,
}

/// File counters reported while a backup runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupProgress {
    /// Files discovered for this run.
    pub total_files: u64,
    /// Files processed so far.
    pub processed_files: u64,
}

impl BackupProgress {
    /// Completion percentage in `0..=100`.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn percent_complete(&self) -> f64 {
        if self.total_files == 0 {
            0.0
        } else {
            (self.processed_files.min(self.total_files) as f64 / self.total_files as f64) * 100.0
        }
    }
}

/// Backend-authoritative state of one backup job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupState {
    /// Current status.
    pub status: BackupStatus,
    /// Progress while running.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<BackupProgress>,
    /// Failure message of the last run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Lifecycle of a repository.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RepoStatus {
    /// Available for new work.
    #[default]
    Idle,
    /// A backup is writing to it.
    BackingUp,
    /// Old archives are being pruned.
    Pruning,
    /// Archives or the repository itself are being deleted.
    Deleting,
    /// Mounted on the local file system.
    Mounted,
    /// Some other maintenance operation is running.
    PerformingOperation,
    /// A stale lock blocks access.
    Locked,
    /// Access failed (bad key, bad passphrase).
    Error,
}

/// Backend-authoritative state of one repository.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoState {
    /// Current status.
    pub status: RepoStatus,
}

/// Whether a repository (or one of its archives) is mounted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MountState {
    /// Mounted right now.
    pub is_mounted: bool,
    /// Mount point, empty when not mounted.
    #[serde(default)]
    pub mount_path: String,
}

/// Action offered by the "run backup" button for one backup job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BackupButtonStatus {
    /// Start a backup.
    RunBackup,
    /// The job is queued.
    Waiting,
    /// The job is running and can be aborted.
    Abort,
    /// The repository is locked or unreachable.
    Locked,
    /// The repository must be unmounted first.
    Unmount,
    /// The repository is busy with something else.
    Busy,
}

impl BackupButtonStatus {
    /// Derive the button action from the job and repository states.
    #[must_use]
    pub const fn derive(backup: &BackupState, repo: &RepoState) -> Self {
        match repo.status {
            RepoStatus::Locked | RepoStatus::Error => Self::Locked,
            RepoStatus::Mounted => Self::Unmount,
            _ => match backup.status {
                BackupStatus::Waiting => Self::Waiting,
                BackupStatus::Running => Self::Abort,
                _ => match repo.status {
                    RepoStatus::Idle => Self::RunBackup,
                    _ => Self::Busy,
                },
            },
        }
    }
}
