mod common;

use std::rc::Rc;

use common::{FakeRuntime, RecordingHost};
use shuttle_bridge::sink::{self, SinkDelivery};
use shuttle_bridge::{
    BridgeConfig, BridgeError, EditorSession, LifecycleState, MountOutcome, RuntimeError,
};

#[tokio::test]
async fn test_mount_then_visit_link() {
    let (runtime, probe) = FakeRuntime::ready();
    let host = RecordingHost::new();
    let session = EditorSession::new(runtime, host.clone(), &BridgeConfig::default());

    let mut subscription = session.mount().await.unwrap().into_subscription().unwrap();
    assert!(session.lifecycle().is_renderable());

    probe.visit_link("https://example.com");
    subscription.dispatch_pending();
    assert_eq!(host.opened(), vec!["https://example.com"]);
}

#[tokio::test]
async fn test_mount_then_open_embedded_file() {
    let (runtime, probe) = FakeRuntime::ready();
    let host = RecordingHost::new();
    let session = EditorSession::new(runtime, host.clone(), &BridgeConfig::default());

    let mut subscription = session.mount().await.unwrap().into_subscription().unwrap();
    probe.open_embedded_file("assets/img.png");
    subscription.dispatch_pending();
    assert_eq!(host.opened(), vec!["/assets/img.png"]);
}

#[tokio::test]
async fn test_unmount_before_ready_abandons_mount() {
    let (runtime, probe, gate) = FakeRuntime::gated();
    let session = EditorSession::new(runtime, RecordingHost::new(), &BridgeConfig::default());

    let driver = async {
        while session.lifecycle().state() != LifecycleState::Initializing {
            tokio::task::yield_now().await;
        }
        session.unmount();
        assert_eq!(session.lifecycle().state(), LifecycleState::Released);
        gate.send(Ok(())).unwrap();
    };
    let (outcome, ()) = tokio::join!(session.mount(), driver);

    assert!(matches!(outcome, Ok(MountOutcome::Abandoned)));
    assert_eq!(probe.loads.get(), 1);
    assert_eq!(probe.instances.get(), 0);
    assert_eq!(probe.frees.get(), 0);
    assert_eq!(sink::installed_name(), None);
    assert!(!session.lifecycle().is_renderable());

    // Still a no-op afterwards.
    session.unmount();
    assert_eq!(session.lifecycle().state(), LifecycleState::Released);
}

#[tokio::test]
async fn test_unmount_before_mount_abandons() {
    let (runtime, probe) = FakeRuntime::ready();
    let session = EditorSession::new(runtime, RecordingHost::new(), &BridgeConfig::default());

    session.unmount();
    let outcome = session.mount().await.unwrap();

    assert!(matches!(outcome, MountOutcome::Abandoned));
    assert_eq!(probe.loads.get(), 0);
    assert_eq!(probe.instances.get(), 0);
    assert_eq!(session.lifecycle().state(), LifecycleState::Released);
}

#[tokio::test]
async fn test_initialization_failure_reaches_host() {
    let (runtime, probe, gate) = FakeRuntime::gated();
    let session = EditorSession::new(runtime, RecordingHost::new(), &BridgeConfig::default());

    gate.send(Err(RuntimeError::new("core module failed to compile")))
        .unwrap();
    let err = session.mount().await.unwrap_err();

    assert!(matches!(err, BridgeError::Initialization(ref cause) if cause.message() == "core module failed to compile"));
    assert_eq!(session.lifecycle().state(), LifecycleState::Failed);
    assert_eq!(probe.instances.get(), 0);
    assert!(!session.lifecycle().is_renderable());
    session.unmount();
}

#[tokio::test]
async fn test_renderable_tracks_handle() {
    let (runtime, _probe) = FakeRuntime::ready();
    let session = EditorSession::new(runtime, RecordingHost::new(), &BridgeConfig::default());
    let mut watcher = session.lifecycle().watch();

    assert!(!watcher.borrow_and_update().is_renderable());
    let _subscription = session.mount().await.unwrap();
    assert!(watcher.has_changed().unwrap());
    assert!(watcher.borrow_and_update().is_renderable());

    session.unmount();
    assert!(watcher.has_changed().unwrap());
    let status = *watcher.borrow_and_update();
    assert_eq!(status.state, LifecycleState::Released);
    assert!(!status.is_renderable());
}

#[tokio::test]
async fn test_unmount_stops_dispatch() {
    let (runtime, probe) = FakeRuntime::ready();
    let host = RecordingHost::new();
    let session = EditorSession::new(runtime, host.clone(), &BridgeConfig::default());
    let mut subscription = session.mount().await.unwrap().into_subscription().unwrap();

    probe.visit_link("https://pending.example");
    session.unmount();
    probe.visit_link("https://after.example");

    let report = subscription.dispatch_pending();
    assert_eq!(report.discarded, 1);
    assert!(host.attempts().is_empty());
    assert_eq!(probe.frees.get(), 1);
}

#[tokio::test]
async fn test_global_sink_lifecycle() {
    let (runtime, probe) = FakeRuntime::ready();
    let config = BridgeConfig {
        sink_name: "pushToEditor".into(),
        ..BridgeConfig::default()
    };
    let session = EditorSession::new(runtime, RecordingHost::new(), &config);

    assert_eq!(sink::deliver("pushToEditor", "before"), SinkDelivery::Ignored);
    let _subscription = session.mount().await.unwrap();
    assert_eq!(sink::deliver("pushToEditor", "during"), SinkDelivery::Delivered);

    session.unmount();
    assert_eq!(sink::deliver("pushToEditor", "after"), SinkDelivery::Ignored);
    assert_eq!(*probe.messages.borrow(), vec!["during".to_owned()]);
}

#[tokio::test]
async fn test_drop_releases_on_every_exit_path() {
    let (runtime, probe) = FakeRuntime::ready();
    let host = RecordingHost::new();
    {
        let session = EditorSession::new(runtime, host.clone(), &BridgeConfig::default());
        let _subscription = session.mount().await.unwrap();
        assert_eq!(sink::installed_name().as_deref(), Some("sendMessageToCore"));
    }
    assert_eq!(probe.frees.get(), 1);
    assert_eq!(sink::installed_name(), None);
    assert!(!probe.visit_link("https://after-drop.example"));
}

#[tokio::test]
async fn test_mount_twice_is_rejected() {
    let (runtime, probe) = FakeRuntime::ready();
    let session = EditorSession::new(runtime, RecordingHost::new(), &BridgeConfig::default());

    let _first = session.mount().await.unwrap();
    let err = session.mount().await.unwrap_err();
    assert!(matches!(err, BridgeError::InvalidState { .. }));
    assert_eq!(probe.instances.get(), 1);
    assert!(session.lifecycle().is_renderable());
}

#[tokio::test]
async fn test_core_may_unmount_from_inbound_message() {
    let (runtime, probe) = FakeRuntime::ready();
    let session = Rc::new(EditorSession::new(
        runtime,
        RecordingHost::new(),
        &BridgeConfig::default(),
    ));
    let mut subscription = session.mount().await.unwrap().into_subscription().unwrap();

    let target = Rc::downgrade(&session);
    *probe.on_message.borrow_mut() = Some(Box::new(move |message: &str| {
        if message == "close" {
            if let Some(session) = target.upgrade() {
                session.unmount();
            }
        }
    }));

    assert_eq!(sink::deliver("sendMessageToCore", "keep"), SinkDelivery::Delivered);
    assert_eq!(session.lifecycle().state(), LifecycleState::Ready);

    assert_eq!(sink::deliver("sendMessageToCore", "close"), SinkDelivery::Delivered);
    assert_eq!(session.lifecycle().state(), LifecycleState::Released);
    assert_eq!(probe.frees.get(), 1);
    assert_eq!(sink::installed_name(), None);
    assert_eq!(*probe.messages.borrow(), vec!["keep", "close"]);

    assert!(!probe.visit_link("https://example.com"));
    assert_eq!(subscription.dispatch_pending().handled(), 0);

    session.unmount();
    assert_eq!(probe.frees.get(), 1);
}
