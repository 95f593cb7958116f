//! Mirrors of the profile and repository lists.

use arco_api_models::{BackupProfileSummary, RepositorySummary};
use arco_events::{EventKind, EventName};
use arco_gateway::{RpcGateway, RpcResult};
use async_trait::async_trait;

use crate::sync::{Reconciler, StateSlice};

/// Refetches every backup profile on create/update/delete.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProfilesReconciler;

#[async_trait]
impl Reconciler for ProfilesReconciler {
    type State = Vec<BackupProfileSummary>;

    fn name(&self) -> &'static str {
        "profiles"
    }

    fn events(&self) -> Vec<EventName> {
        [
            EventKind::BackupProfileCreated,
            EventKind::BackupProfileUpdated,
            EventKind::BackupProfileDeleted,
        ]
        .into_iter()
        .map(EventName::from)
        .collect()
    }

    async fn fetch(&self, gateway: &dyn RpcGateway) -> RpcResult<Vec<BackupProfileSummary>> {
        gateway.get_backup_profiles().await
    }
}

/// Refetches every repository on create/update/delete.
#[derive(Debug, Clone, Copy, Default)]
pub struct RepositoriesReconciler;

#[async_trait]
impl Reconciler for RepositoriesReconciler {
    type State = Vec<RepositorySummary>;

    fn name(&self) -> &'static str {
        "repositories"
    }

    fn events(&self) -> Vec<EventName> {
        [
            EventKind::RepositoryCreated,
            EventKind::RepositoryUpdated,
            EventKind::RepositoryDeleted,
        ]
        .into_iter()
        .map(EventName::from)
        .collect()
    }

    async fn fetch(&self, gateway: &dyn RpcGateway) -> RpcResult<Vec<RepositorySummary>> {
        gateway.get_repositories().await
    }
}

/// Slice mirroring the profile list.
pub type ProfilesSlice = StateSlice<ProfilesReconciler>;

/// Slice mirroring the repository list.
pub type RepositoriesSlice = StateSlice<RepositoriesReconciler>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use arco_events::EventBus;
    use arco_test_support::fixtures::settle;
    use arco_test_support::mocks::{Call, ScriptedGateway};

    #[tokio::test(start_paused = true)]
    async fn each_catalog_listens_to_its_own_events() {
        let gateway = Arc::new(ScriptedGateway::new());
        let bus = EventBus::new();
        let profiles = ProfilesSlice::new(ProfilesReconciler, gateway.clone(), Arc::new(bus.clone()));
        let repositories =
            RepositoriesSlice::new(RepositoriesReconciler, gateway.clone(), Arc::new(bus.clone()));
        profiles.start().await;
        repositories.start().await;
        assert_eq!(bus.total_listeners(), 6);
        gateway.clear_calls();

        gateway.set_repositories(Ok(vec![RepositorySummary {
            id: 1,
            name: "nas".into(),
            location: "/mnt/nas/arco".into(),
        }]));
        bus.emit(EventKind::RepositoryCreated);
        settle().await;

        assert_eq!(gateway.calls(), vec![Call::GetRepositories]);
        assert_eq!(repositories.state().len(), 1);
        assert!(profiles.state().is_empty());

        bus.emit(EventKind::BackupProfileDeleted);
        settle().await;
        assert_eq!(
            gateway.count(|call| *call == Call::GetBackupProfiles),
            1
        );
    }
}
