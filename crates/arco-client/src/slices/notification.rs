//! Mirror of outstanding notifications.

use arco_api_models::Notification;
use arco_events::{EventKind, EventName};
use arco_gateway::{RpcGateway, RpcResult};
use async_trait::async_trait;
use tracing::debug;

use crate::error::{SliceError, SliceResult};
use crate::sync::{Reconciler, StateSlice};

/// Refetches the notification list on create/dismiss.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotificationReconciler;

#[async_trait]
impl Reconciler for NotificationReconciler {
    type State = Vec<Notification>;

    fn name(&self) -> &'static str {
        "notifications"
    }

    fn events(&self) -> Vec<EventName> {
        vec![
            EventKind::NotificationCreated.into(),
            EventKind::NotificationDismissed.into(),
        ]
    }

    async fn fetch(&self, gateway: &dyn RpcGateway) -> RpcResult<Vec<Notification>> {
        gateway.get_notifications().await
    }
}

/// Slice mirroring the notification list.
pub type NotificationSlice = StateSlice<NotificationReconciler>;

impl StateSlice<NotificationReconciler> {
    /// Ask the backend to dismiss `notification_id`.
    ///
    /// The list itself updates when the backend emits `notificationDismissed`.
    ///
    /// # Errors
    ///
    /// Returns an error when the backend call fails.
    pub async fn dismiss(&self, notification_id: i64) -> SliceResult<()> {
        self.gateway()
            .dismiss_notification(notification_id)
            .await
            .map_err(|source| SliceError::Action {
                slice: "notifications",
                operation: "dismiss_notification",
                source,
            })?;
        debug!(notification_id, "notification dismissed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use arco_api_models::NotificationLevel;
    use arco_events::EventBus;
    use arco_test_support::fixtures::{settle, unavailable};
    use arco_test_support::mocks::{Call, ScriptedGateway};
    use chrono::{TimeZone, Utc};

    fn notice(id: i64) -> Notification {
        Notification {
            id,
            message: format!("backup {id} finished"),
            level: NotificationLevel::Info,
            created_at: Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).single().expect("valid timestamp"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn dismissal_round_trips_through_the_backend_event() {
        let gateway = Arc::new(ScriptedGateway::new());
        gateway.set_notifications(Ok(vec![notice(1), notice(2)]));
        let bus = EventBus::new();
        let slice = NotificationSlice::new(NotificationReconciler, gateway.clone(), Arc::new(bus.clone()));
        slice.start().await;
        assert_eq!(slice.state().len(), 2);

        slice.dismiss(1).await.expect("dismiss");
        gateway.set_notifications(Ok(vec![notice(2)]));
        bus.emit(EventKind::NotificationDismissed);
        settle().await;

        assert_eq!(slice.state(), vec![notice(2)]);
        assert_eq!(gateway.count(|call| *call == Call::DismissNotification(1)), 1);
    }

    #[tokio::test]
    async fn failed_dismissal_names_the_operation() {
        let gateway = Arc::new(ScriptedGateway::new());
        gateway.set_dismiss(Err(unavailable("dismiss_notification")));
        let slice = NotificationSlice::new(NotificationReconciler, gateway, Arc::new(EventBus::new()));

        let err = slice.dismiss(9).await.expect_err("dismiss fails");
        assert!(matches!(
            err,
            SliceError::Action {
                operation: "dismiss_notification",
                ..
            }
        ));
    }
}
