use std::rc::Rc;
use std::time::Duration;

use broadcast_core::{CreateSessionRequest, RealtimeEvent, SessionPhase};
use broadcast_client::api::{HttpSessionApi, SessionApi};
use broadcast_client::channel::WsChannelConnector;
use broadcast_client::config::ApiConfig;
use broadcast_client::controller::{ControllerConfig, StreamSessionController};
use broadcast_client::media::{CaptureConstraints, MediaDeviceManager};
use broadcast_client::viewer::ViewerSession;

use super::support::{
    broadcaster_identity, pump_until, start_relay_server, viewer_identity, wait_for, TestBackend,
};

fn api_config(addr: std::net::SocketAddr) -> ApiConfig {
    ApiConfig {
        base_url: format!("http://{addr}"),
        request_timeout_secs: 5,
        connect_timeout_secs: 2,
    }
}

#[actix_rt::test]
async fn end_to_end_flow_over_real_transport() {
    let (addr, server, hub) = start_relay_server().await.expect("start relay server");

    // Broadcaster wiring: real REST client, real WebSocket transport,
    // scripted capture hardware.
    let api = Rc::new(HttpSessionApi::new(&api_config(addr), "host-token").unwrap());
    let connector = Rc::new(WsChannelConnector::new(format!("ws://{addr}"), "host-token"));
    let backend = TestBackend::new();
    let media = MediaDeviceManager::new(backend.clone());
    let handle = StreamSessionController::spawn(
        api,
        connector,
        media,
        broadcaster_identity(),
        ControllerConfig::default(),
    );

    handle
        .acquire_devices(CaptureConstraints::default())
        .await
        .unwrap();
    let record = handle
        .start(CreateSessionRequest::new("Friday Jam"))
        .await
        .unwrap();
    assert_eq!(handle.snapshot().phase, SessionPhase::Live);
    assert_eq!(record.title, "Friday Jam");

    // Viewer joins through the same REST + WebSocket surface.
    let viewer_api = HttpSessionApi::new(&api_config(addr), "viewer-token").unwrap();
    let viewer_connector = WsChannelConnector::new(format!("ws://{addr}"), "viewer-token");
    let mut viewer = ViewerSession::connect(&viewer_api, &viewer_connector, record.id, viewer_identity(1))
        .await
        .expect("viewer connect");
    assert!(viewer.media_url().is_some());
    tokio::time::sleep(Duration::from_millis(50)).await;

    // Server pushes an absolute viewer count to everyone.
    hub.broadcast_event(record.id, &RealtimeEvent::ViewerCount { count: 5 })
        .await;
    wait_for(&handle, |s| s.viewer_count == 5).await;
    pump_until(&mut viewer, |v| v.viewer_count() == 5).await;

    // One like from the viewer, echoed to both sides.
    assert!(viewer.like().await.unwrap());
    assert!(!viewer.like().await.unwrap());
    wait_for(&handle, |s| s.like_count == 1).await;
    pump_until(&mut viewer, |v| v.like_count() == 1).await;

    // Chat crosses in both directions through the relay.
    viewer.send_chat("hi").await.unwrap();
    wait_for(&handle, |s| {
        s.chat.iter().any(|e| e.sender == "Viewer 1" && e.text == "hi")
    })
    .await;

    handle.post_chat("welcome!").await.unwrap();
    pump_until(&mut viewer, |v| {
        v.chat().any(|e| e.sender == "Host" && e.text == "welcome!")
    })
    .await;

    // Explicit stop: backend acknowledges, server pushes stream_ended to
    // the viewer, every local resource is gone.
    handle.stop().await.unwrap();
    assert_eq!(handle.snapshot().phase, SessionPhase::Ended);
    assert_eq!(backend.open_tracks(), 0);

    pump_until(&mut viewer, |v| v.ended()).await;
    assert_eq!(viewer.session().status, SessionPhase::Ended);

    // The backend record reflects the stop.
    let stopped = viewer_api.fetch_session(record.id).await.unwrap();
    assert_eq!(stopped.status, SessionPhase::Ended);

    server.stop(true).await;
}

#[actix_rt::test]
async fn backend_rejection_over_http_maps_to_network_error() {
    let (addr, server, _hub) = start_relay_server().await.expect("start relay server");

    let api = Rc::new(HttpSessionApi::new(&api_config(addr), "host-token").unwrap());
    let connector = Rc::new(WsChannelConnector::new(format!("ws://{addr}"), "host-token"));
    let backend = TestBackend::new();
    let media = MediaDeviceManager::new(backend.clone());
    let handle = StreamSessionController::spawn(
        api,
        connector,
        media,
        broadcaster_identity(),
        ControllerConfig::default(),
    );

    handle
        .acquire_devices(CaptureConstraints::default())
        .await
        .unwrap();

    // The relay's create endpoint rejects whitespace-only titles with 400;
    // client-side validation only catches the empty string.
    let err = handle
        .start(CreateSessionRequest::new("   "))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        broadcast_core::SessionError::Network { status: Some(400), .. }
    ));
    assert_eq!(handle.snapshot().phase, SessionPhase::Failed);
    // Devices survive for a manual retry.
    assert_eq!(backend.open_tracks(), 2);

    handle
        .start(CreateSessionRequest::new("Friday Jam"))
        .await
        .unwrap();
    assert_eq!(handle.snapshot().phase, SessionPhase::Live);
    assert_eq!(backend.acquires.get(), 1);

    handle.shutdown().await;
    assert_eq!(backend.open_tracks(), 0);
    server.stop(true).await;
}
