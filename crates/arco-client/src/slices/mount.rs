//! Per-repository mirror of mount state.

use arco_api_models::MountState;
use arco_events::EventName;
use arco_gateway::{RpcGateway, RpcResult};
use async_trait::async_trait;

use crate::sync::{Reconciler, StateSlice};

/// Refetches on `mountStateChanged:{id}`.
#[derive(Debug, Clone, Copy)]
pub struct MountReconciler {
    repository_id: i64,
}

impl MountReconciler {
    /// Reconciler for `repository_id`.
    #[must_use]
    pub const fn new(repository_id: i64) -> Self {
        Self { repository_id }
    }
}

#[async_trait]
impl Reconciler for MountReconciler {
    type State = MountState;

    fn name(&self) -> &'static str {
        "mount"
    }

    fn events(&self) -> Vec<EventName> {
        vec![EventName::mount_state_changed(self.repository_id)]
    }

    async fn fetch(&self, gateway: &dyn RpcGateway) -> RpcResult<MountState> {
        gateway.get_mount_state(self.repository_id).await
    }
}

/// Slice mirroring one [`MountState`].
pub type MountSlice = StateSlice<MountReconciler>;
