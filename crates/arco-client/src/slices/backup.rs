//! Per-job mirror of backup progress.

use arco_api_models::{BackupId, BackupState};
use arco_events::EventName;
use arco_gateway::{RpcGateway, RpcResult};
use async_trait::async_trait;

use crate::sync::{Reconciler, StateSlice};

/// Fetches the state of one backup job on `backupStateChanged:{profile}-{repository}`.
#[derive(Debug, Clone, Copy)]
pub struct BackupReconciler {
    backup_id: BackupId,
}

impl BackupReconciler {
    /// Reconciler for `backup_id`.
    #[must_use]
    pub const fn new(backup_id: BackupId) -> Self {
        Self { backup_id }
    }

    /// Job this reconciler tracks.
    #[must_use]
    pub const fn backup_id(&self) -> BackupId {
        self.backup_id
    }
}

#[async_trait]
impl Reconciler for BackupReconciler {
    type State = BackupState;

    fn name(&self) -> &'static str {
        "backup"
    }

    fn events(&self) -> Vec<EventName> {
        vec![EventName::backup_state_changed(
            self.backup_id.backup_profile_id,
            self.backup_id.repository_id,
        )]
    }

    async fn fetch(&self, gateway: &dyn RpcGateway) -> RpcResult<BackupState> {
        gateway.get_backup_state(self.backup_id).await
    }
}

/// Slice mirroring one [`BackupState`].
pub type BackupSlice = StateSlice<BackupReconciler>;
