use std::sync::Arc;
use std::time::Duration;

use arco_api_models::{AuthState, MountState, RepoState, RepoStatus};
use arco_client::{ClientCore, Lifecycle};
use arco_config::ClientConfig;
use arco_events::{EventBus, EventKind, EventName};
use arco_gateway::RpcGateway;
use arco_test_support::fixtures::{sample_backup_id, sample_user, settle, unavailable};
use arco_test_support::mocks::{Call, ScriptedGateway};

fn core(gateway: &Arc<ScriptedGateway>, bus: &EventBus) -> ClientCore {
    let gateway: Arc<dyn RpcGateway> = gateway.clone();
    ClientCore::new(&ClientConfig::default(), gateway, Arc::new(bus.clone()))
}

#[tokio::test(start_paused = true)]
async fn repo_event_only_reconciles_the_matching_repository() {
    let gateway = Arc::new(ScriptedGateway::new());
    let bus = EventBus::new();
    let core = core(&gateway, &bus);
    core.start().await;
    let repository = core.repository_slice(42).await;
    let other = core.repository_slice(7).await;
    let _backup = core.backup_slice(sample_backup_id()).await;
    let _mount = core.mount_slice(42).await;
    gateway.set_repo_state(
        42,
        Ok(RepoState {
            status: RepoStatus::BackingUp,
        }),
    );
    gateway.clear_calls();

    bus.emit(EventName::repo_state_changed(42));
    settle().await;

    let calls = gateway.calls();
    assert!(calls.contains(&Call::GetRepoState(42)));
    assert!(
        calls
            .iter()
            .all(|call| matches!(call, Call::GetRepoState(42) | Call::GetArchiveCount(42))),
        "unexpected calls: {calls:?}"
    );
    assert_eq!(repository.state().state.status, RepoStatus::BackingUp);
    assert_eq!(other.state().state.status, RepoStatus::Idle);
}

#[tokio::test(start_paused = true)]
async fn repeated_setup_never_stacks_listeners() {
    let gateway = Arc::new(ScriptedGateway::new());
    let bus = EventBus::new();
    let core = core(&gateway, &bus);
    core.start().await;
    let once = bus.total_listeners();

    for _ in 0..5 {
        core.settings().registry().setup();
        core.notifications().registry().setup();
    }

    assert_eq!(bus.total_listeners(), once);
    assert_eq!(core.live_listeners(), once);
    assert_eq!(core.settings().registry().lifecycle(), Lifecycle::Active);

    gateway.clear_calls();
    bus.emit(EventKind::SettingsChanged);
    settle().await;
    assert_eq!(gateway.calls(), vec![Call::GetSettings]);
}

#[tokio::test(start_paused = true)]
async fn transient_slices_keep_the_last_known_state_on_failure() {
    let gateway = Arc::new(ScriptedGateway::new());
    gateway.set_mount_state(
        3,
        Ok(MountState {
            is_mounted: true,
            ..MountState::default()
        }),
    );
    let bus = EventBus::new();
    let core = core(&gateway, &bus);
    let mount = core.mount_slice(3).await;
    assert!(mount.state().is_mounted);

    gateway.set_mount_state(3, Err(unavailable("get_mount_state")));
    bus.emit(EventName::mount_state_changed(3));
    settle().await;

    assert!(mount.state().is_mounted);
    assert_eq!(gateway.count(|call| *call == Call::GetMountState(3)), 2);
}

#[tokio::test(start_paused = true)]
async fn auth_resets_to_signed_out_when_its_fetch_fails() {
    let gateway = Arc::new(ScriptedGateway::new());
    gateway.set_auth_state(Ok(AuthState {
        is_authenticated: true,
    }));
    gateway.set_current_user(Ok(Some(sample_user())));
    let bus = EventBus::new();
    let core = core(&gateway, &bus);
    core.start().await;
    assert!(core.session().is_authenticated());

    gateway.set_auth_state(Err(unavailable("get_auth_state")));
    bus.emit(EventKind::AuthStateChanged);
    settle().await;

    assert!(!core.session().is_authenticated());
    assert_eq!(core.auth().state().user, None);
}

#[tokio::test(start_paused = true)]
async fn slower_older_reconcile_does_not_overwrite_a_newer_one() {
    let gateway = Arc::new(ScriptedGateway::new());
    let bus = EventBus::new();
    let core = core(&gateway, &bus);
    let repository = core.repository_slice(42).await;

    gateway.queue_repo_state_after(
        42,
        Ok(RepoState {
            status: RepoStatus::Locked,
        }),
        Duration::from_secs(3),
    );
    gateway.set_repo_state(
        42,
        Ok(RepoState {
            status: RepoStatus::Mounted,
        }),
    );
    bus.emit(EventName::repo_state_changed(42));
    bus.emit(EventName::repo_state_changed(42));
    settle().await;
    assert_eq!(repository.state().state.status, RepoStatus::Mounted);

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(repository.state().state.status, RepoStatus::Mounted);
}

#[tokio::test(start_paused = true)]
async fn shutdown_silences_every_global_slice() {
    let gateway = Arc::new(ScriptedGateway::new());
    let bus = EventBus::new();
    let core = core(&gateway, &bus);
    core.start().await;

    core.shutdown();
    gateway.clear_calls();
    for kind in [
        EventKind::AuthStateChanged,
        EventKind::SettingsChanged,
        EventKind::NotificationCreated,
        EventKind::SubscriptionAdded,
    ] {
        bus.emit(kind);
    }
    settle().await;

    assert!(gateway.calls().is_empty());
    assert_eq!(core.live_listeners(), 0);
    assert_eq!(core.auth().registry().lifecycle(), Lifecycle::TornDown);
}
