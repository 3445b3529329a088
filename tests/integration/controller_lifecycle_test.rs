use std::rc::Rc;

use broadcast_core::{CreateSessionRequest, RealtimeEvent, SessionError, SessionPhase};
use broadcast_client::controller::{ControllerConfig, ControllerHandle, StreamSessionController};
use broadcast_client::media::{CaptureConstraints, MediaDeviceManager, TrackKind};
use uuid::Uuid;

use super::support::{
    broadcaster_identity, wait_for, FakeSessionApi, ScriptedConnector, TestBackend,
};

fn spawn_controller(
    config: ControllerConfig,
) -> (
    Rc<FakeSessionApi>,
    Rc<ScriptedConnector>,
    Rc<TestBackend>,
    ControllerHandle,
) {
    let api = FakeSessionApi::new();
    let connector = ScriptedConnector::new();
    let backend = TestBackend::new();
    let media = MediaDeviceManager::new(backend.clone());
    let handle = StreamSessionController::spawn(
        api.clone(),
        connector.clone(),
        media,
        broadcaster_identity(),
        config,
    );
    (api, connector, backend, handle)
}

#[actix_rt::test]
async fn friday_jam_happy_path() {
    let (api, connector, backend, handle) = spawn_controller(ControllerConfig::default());
    let channel = connector.prepare();

    handle
        .acquire_devices(CaptureConstraints::default())
        .await
        .unwrap();
    assert_eq!(handle.snapshot().phase, SessionPhase::DeviceReady);
    assert_eq!(backend.open_tracks(), 2);

    let record = handle
        .start(CreateSessionRequest::new("Friday Jam"))
        .await
        .unwrap();
    assert_eq!(record.id, Uuid::from_u128(42));
    assert_eq!(handle.snapshot().phase, SessionPhase::Live);

    // The join event rode on the channel open.
    let sent = channel.sent_events();
    assert!(matches!(&sent[0], RealtimeEvent::Join { viewer_id, .. } if viewer_id == "host-1"));

    channel.push_event(&RealtimeEvent::ViewerCount { count: 5 });
    wait_for(&handle, |s| s.viewer_count == 5).await;

    channel.push_event(&RealtimeEvent::Chat {
        sender: "Alex".into(),
        sender_id: "viewer-7".into(),
        text: "hi".into(),
    });
    wait_for(&handle, |s| s.chat.len() == 1).await;
    let snapshot = handle.snapshot();
    assert_eq!(snapshot.chat[0].sender, "Alex");
    assert_eq!(snapshot.chat[0].text, "hi");

    handle.stop().await.unwrap();
    let snapshot = handle.snapshot();
    assert_eq!(snapshot.phase, SessionPhase::Ended);
    assert_eq!(*api.stop_calls.borrow(), vec![Uuid::from_u128(42)]);
    assert!(channel.is_closed());
    assert_eq!(backend.open_tracks(), 0);
}

#[actix_rt::test]
async fn empty_title_is_rejected_with_zero_network_calls() {
    let (api, connector, _backend, handle) = spawn_controller(ControllerConfig::default());

    handle
        .acquire_devices(CaptureConstraints::default())
        .await
        .unwrap();

    let err = handle
        .start(CreateSessionRequest::new(""))
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::State(_)));
    assert_eq!(api.create_calls.get(), 0);
    assert_eq!(connector.connects.get(), 0);
    // Nothing happened: still ready to start.
    assert_eq!(handle.snapshot().phase, SessionPhase::DeviceReady);
}

#[actix_rt::test]
async fn start_rejection_keeps_devices_for_manual_retry() {
    let (api, connector, backend, handle) = spawn_controller(ControllerConfig::default());
    let _channel = connector.prepare();

    handle
        .acquire_devices(CaptureConstraints::default())
        .await
        .unwrap();

    api.reject_next_create(400, "category is required");
    let err = handle
        .start(CreateSessionRequest::new("Friday Jam"))
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::Network { status: Some(400), .. }));

    let snapshot = handle.snapshot();
    assert_eq!(snapshot.phase, SessionPhase::Failed);
    assert!(snapshot.failure.is_some());
    // No channel was opened and the capture handle survived.
    assert_eq!(connector.connects.get(), 0);
    assert_eq!(backend.open_tracks(), 2);

    // Corrected retry goes live without re-acquiring devices.
    handle
        .start(CreateSessionRequest::new("Friday Jam"))
        .await
        .unwrap();
    assert_eq!(handle.snapshot().phase, SessionPhase::Live);
    assert_eq!(backend.acquires.get(), 1);
}

#[actix_rt::test]
async fn server_pushed_end_skips_the_stop_call() {
    let (api, connector, backend, handle) = spawn_controller(ControllerConfig::default());
    let channel = connector.prepare();

    handle
        .acquire_devices(CaptureConstraints::default())
        .await
        .unwrap();
    handle
        .start(CreateSessionRequest::new("Friday Jam"))
        .await
        .unwrap();

    channel.push_event(&RealtimeEvent::StreamEnded {});
    wait_for(&handle, |s| s.phase == SessionPhase::Ended).await;

    // Server authority: ended without a stop round trip.
    assert!(api.stop_calls.borrow().is_empty());
    assert!(channel.is_closed());
    assert_eq!(backend.open_tracks(), 0);
}

#[actix_rt::test]
async fn stop_failure_still_runs_cleanup() {
    let (api, connector, backend, handle) = spawn_controller(ControllerConfig::default());
    let channel = connector.prepare();

    handle
        .acquire_devices(CaptureConstraints::default())
        .await
        .unwrap();
    handle
        .start(CreateSessionRequest::new("Friday Jam"))
        .await
        .unwrap();

    api.fail_stop.set(true);
    handle.stop().await.unwrap();

    let snapshot = handle.snapshot();
    assert_eq!(snapshot.phase, SessionPhase::Ended);
    assert!(snapshot.banner.is_some());
    assert!(channel.is_closed());
    assert_eq!(backend.open_tracks(), 0);

    // A second stop finds nothing to stop.
    assert!(matches!(
        handle.stop().await,
        Err(SessionError::State(_))
    ));
}

#[actix_rt::test]
async fn shutdown_converges_on_the_same_cleanup_path() {
    let (api, connector, backend, handle) = spawn_controller(ControllerConfig::default());
    let channel = connector.prepare();

    handle
        .acquire_devices(CaptureConstraints::default())
        .await
        .unwrap();
    handle
        .start(CreateSessionRequest::new("Friday Jam"))
        .await
        .unwrap();

    handle.shutdown().await;
    assert_eq!(handle.snapshot().phase, SessionPhase::Ended);
    assert_eq!(*api.stop_calls.borrow(), vec![Uuid::from_u128(42)]);
    assert!(channel.is_closed());
    assert_eq!(backend.open_tracks(), 0);

    // Second shutdown finds the controller gone; nothing changes.
    handle.shutdown().await;
    assert_eq!(backend.open_tracks(), 0);
}

#[actix_rt::test]
async fn protocol_error_budget_exhaustion_fails_the_session() {
    let config = ControllerConfig {
        protocol_error_budget: 2,
        ..ControllerConfig::default()
    };
    let (_api, connector, backend, handle) = spawn_controller(config);
    let channel = connector.prepare();

    handle
        .acquire_devices(CaptureConstraints::default())
        .await
        .unwrap();
    handle
        .start(CreateSessionRequest::new("Friday Jam"))
        .await
        .unwrap();

    // Two dropped frames stay within budget, the third exceeds it.
    channel.push_raw(r#"{"type":"poll_started","payload":{}}"#);
    channel.push_raw("not even json");
    channel.push_event(&RealtimeEvent::ViewerCount { count: 3 });
    wait_for(&handle, |s| s.viewer_count == 3).await;
    assert_eq!(handle.snapshot().phase, SessionPhase::Live);

    channel.push_raw(r#"{"type":"mystery","payload":{}}"#);
    wait_for(&handle, |s| s.phase == SessionPhase::Failed).await;

    assert!(channel.is_closed());
    assert_eq!(backend.open_tracks(), 0);
}

#[actix_rt::test]
async fn channel_loss_freezes_realtime_but_not_the_session() {
    let (_api, connector, backend, handle) = spawn_controller(ControllerConfig::default());
    let mut channel = connector.prepare();

    handle
        .acquire_devices(CaptureConstraints::default())
        .await
        .unwrap();
    handle
        .start(CreateSessionRequest::new("Friday Jam"))
        .await
        .unwrap();

    channel.push_event(&RealtimeEvent::ViewerCount { count: 4 });
    wait_for(&handle, |s| s.viewer_count == 4).await;

    channel.hang_up();
    wait_for(&handle, |s| s.realtime_lost).await;

    let snapshot = handle.snapshot();
    // The broadcast itself keeps going; only counters and chat froze.
    assert_eq!(snapshot.phase, SessionPhase::Live);
    assert!(snapshot.banner.is_some());
    assert_eq!(snapshot.viewer_count, 4);
    assert_eq!(backend.open_tracks(), 2);

    // Chat can no longer be sent, stop still works.
    assert!(handle.post_chat("anyone there?").await.is_err());
    handle.stop().await.unwrap();
    assert_eq!(handle.snapshot().phase, SessionPhase::Ended);
    assert_eq!(backend.open_tracks(), 0);
}

#[actix_rt::test]
async fn device_denial_surfaces_as_banner_and_stays_idle() {
    let (_api, _connector, backend, handle) = spawn_controller(ControllerConfig::default());

    backend.fail_next(SessionError::Permission("user dismissed the prompt".into()));
    let err = handle
        .acquire_devices(CaptureConstraints::default())
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::Permission(_)));

    let snapshot = handle.snapshot();
    assert_eq!(snapshot.phase, SessionPhase::Idle);
    assert!(snapshot.banner.is_some());

    handle.dismiss_banner().await;
    wait_for(&handle, |s| s.banner.is_none()).await;

    // Re-prompting works.
    handle
        .acquire_devices(CaptureConstraints::default())
        .await
        .unwrap();
    assert_eq!(handle.snapshot().phase, SessionPhase::DeviceReady);
}

#[actix_rt::test]
async fn broadcaster_chat_rides_the_channel_and_fills_from_echo() {
    let (_api, connector, _backend, handle) = spawn_controller(ControllerConfig::default());
    let channel = connector.prepare();

    handle
        .acquire_devices(CaptureConstraints::default())
        .await
        .unwrap();
    handle
        .start(CreateSessionRequest::new("Friday Jam"))
        .await
        .unwrap();

    handle.post_chat("  welcome all  ").await.unwrap();
    let sent = channel.sent_events();
    assert!(sent.iter().any(|e| matches!(
        e,
        RealtimeEvent::Chat { sender_id, text, .. } if sender_id == "host-1" && text == "welcome all"
    )));
    // Local history only fills from the server echo.
    assert!(handle.snapshot().chat.is_empty());

    assert!(matches!(
        handle.post_chat("   ").await,
        Err(SessionError::State(_))
    ));
    let long = "x".repeat(501);
    assert!(matches!(
        handle.post_chat(&long).await,
        Err(SessionError::State(_))
    ));
}

#[actix_rt::test]
async fn track_controls_route_through_the_controller() {
    let (_api, _connector, _backend, handle) = spawn_controller(ControllerConfig::default());

    handle
        .acquire_devices(CaptureConstraints::default())
        .await
        .unwrap();
    handle.attach_sink("main-preview").await.unwrap();
    handle.attach_sink("popup").await.unwrap();

    assert!(!handle.toggle_track(TrackKind::Video).await.unwrap());
    assert!(handle.toggle_track(TrackKind::Video).await.unwrap());

    handle.switch_device(TrackKind::Video, "cam-usb").await.unwrap();
    handle.detach_sink("popup").await;

    let devices = handle.enumerate_devices().await.unwrap();
    assert_eq!(devices[0].label, "Front Camera");
}
