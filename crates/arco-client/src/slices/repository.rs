//! Per-repository mirror of status and archive count.

use arco_api_models::{BackupButtonStatus, BackupState, RepoState};
use arco_events::EventName;
use arco_gateway::{RpcGateway, RpcResult};
use async_trait::async_trait;

use crate::sync::{Reconciler, StateSlice};

/// What a repository card shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RepositoryView {
    /// Repository status.
    pub state: RepoState,
    /// Archives stored in the repository.
    pub archive_count: u64,
}

impl RepositoryView {
    /// Button action for a backup job writing into this repository.
    #[must_use]
    pub const fn button_status(&self, backup: &BackupState) -> BackupButtonStatus {
        BackupButtonStatus::derive(backup, &self.state)
    }
}

/// Refetches on `repoStateChanged:{id}` and `archivesChanged:{id}`.
#[derive(Debug, Clone, Copy)]
pub struct RepositoryReconciler {
    repository_id: i64,
}

impl RepositoryReconciler {
    /// Reconciler for `repository_id`.
    #[must_use]
    pub const fn new(repository_id: i64) -> Self {
        Self { repository_id }
    }

    /// Repository this reconciler tracks.
    #[must_use]
    pub const fn repository_id(&self) -> i64 {
        self.repository_id
    }
}

#[async_trait]
impl Reconciler for RepositoryReconciler {
    type State = RepositoryView;

    fn name(&self) -> &'static str {
        "repository"
    }

    fn events(&self) -> Vec<EventName> {
        vec![
            EventName::repo_state_changed(self.repository_id),
            EventName::archives_changed(self.repository_id),
        ]
    }

    async fn fetch(&self, gateway: &dyn RpcGateway) -> RpcResult<RepositoryView> {
        let state = gateway.get_repo_state(self.repository_id).await?;
        let archive_count = gateway.get_archive_count(self.repository_id).await?;
        Ok(RepositoryView {
            state,
            archive_count,
        })
    }
}

/// Slice mirroring one [`RepositoryView`].
pub type RepositorySlice = StateSlice<RepositoryReconciler>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use arco_api_models::{BackupStatus, RepoStatus};
    use arco_events::EventBus;
    use arco_test_support::fixtures::settle;
    use arco_test_support::mocks::{Call, ScriptedGateway};

    #[tokio::test(start_paused = true)]
    async fn archive_events_refresh_the_count() {
        let gateway = Arc::new(ScriptedGateway::new());
        let bus = EventBus::new();
        let slice = RepositorySlice::new(
            RepositoryReconciler::new(42),
            gateway.clone(),
            Arc::new(bus.clone()),
        );
        slice.start().await;
        gateway.clear_calls();

        gateway.set_archive_count(42, Ok(17));
        bus.emit(EventName::archives_changed(42));
        settle().await;

        assert_eq!(slice.state().archive_count, 17);
        assert_eq!(
            gateway.calls(),
            vec![Call::GetRepoState(42), Call::GetArchiveCount(42)]
        );
    }

    #[test]
    fn button_status_uses_the_mirrored_repository_state() {
        let view = RepositoryView {
            state: RepoState {
                status: RepoStatus::Locked,
            },
            archive_count: 3,
        };
        let idle = BackupState {
            status: BackupStatus::Idle,
            ..BackupState::default()
        };
        assert_eq!(view.button_status(&idle), BackupButtonStatus::Locked);
    }
}
