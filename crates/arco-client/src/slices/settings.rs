//! Mirror of persisted application settings.

use arco_api_models::Settings;
use arco_events::{EventKind, EventName};
use arco_gateway::{RpcGateway, RpcResult};
use async_trait::async_trait;

use crate::sync::{Reconciler, StateSlice};

/// Fetches [`Settings`] on `settingsChanged`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SettingsReconciler;

#[async_trait]
impl Reconciler for SettingsReconciler {
    type State = Settings;

    fn name(&self) -> &'static str {
        "settings"
    }

    fn events(&self) -> Vec<EventName> {
        vec![EventKind::SettingsChanged.into()]
    }

    async fn fetch(&self, gateway: &dyn RpcGateway) -> RpcResult<Settings> {
        gateway.get_settings().await
    }
}

/// Slice mirroring [`Settings`].
pub type SettingsSlice = StateSlice<SettingsReconciler>;
