//! Caller-side handle for the session controller.
//!
//! Wraps the command channel so presentation code can await operations
//! without dealing with oneshot channels directly, and exposes the watch
//! receiver carrying the observable snapshot.

use tokio::sync::{mpsc, oneshot, watch};

use broadcast_core::{CreateSessionRequest, Result, SessionError, SessionRecord};

use crate::media::{CaptureConstraints, CaptureSnapshot, DeviceDescriptor, TrackKind};

use super::commands::SessionCommand;
use super::snapshot::SessionSnapshot;

#[derive(Clone)]
pub struct ControllerHandle {
    tx: mpsc::Sender<SessionCommand>,
    watch: watch::Receiver<SessionSnapshot>,
}

impl ControllerHandle {
    pub(crate) fn new(
        tx: mpsc::Sender<SessionCommand>,
        watch: watch::Receiver<SessionSnapshot>,
    ) -> Self {
        Self { tx, watch }
    }

    /// Send a command and await its response.
    async fn send_command<T>(
        &self,
        f: impl FnOnce(oneshot::Sender<Result<T>>) -> SessionCommand,
    ) -> Result<T> {
        let (responder_tx, responder_rx) = oneshot::channel();
        self.tx
            .send(f(responder_tx))
            .await
            .map_err(|_| SessionError::State("session controller is gone".into()))?;
        responder_rx
            .await
            .map_err(|_| SessionError::State("session controller dropped the responder".into()))?
    }

    pub async fn acquire_devices(
        &self,
        constraints: CaptureConstraints,
    ) -> Result<CaptureSnapshot> {
        self.send_command(|responder| SessionCommand::AcquireDevices {
            constraints,
            responder,
        })
        .await
    }

    pub async fn enumerate_devices(&self) -> Result<Vec<DeviceDescriptor>> {
        self.send_command(|responder| SessionCommand::EnumerateDevices { responder })
            .await
    }

    pub async fn switch_device(&self, kind: TrackKind, device_id: &str) -> Result<()> {
        self.send_command(|responder| SessionCommand::SwitchDevice {
            kind,
            device_id: device_id.to_string(),
            responder,
        })
        .await
    }

    pub async fn toggle_track(&self, kind: TrackKind) -> Result<bool> {
        self.send_command(|responder| SessionCommand::ToggleTrack { kind, responder })
            .await
    }

    pub async fn attach_sink(&self, label: &str) -> Result<()> {
        self.send_command(|responder| SessionCommand::AttachSink {
            label: label.to_string(),
            responder,
        })
        .await
    }

    pub async fn detach_sink(&self, label: &str) {
        let (responder, rx) = oneshot::channel();
        if self
            .tx
            .send(SessionCommand::DetachSink {
                label: label.to_string(),
                responder,
            })
            .await
            .is_ok()
        {
            let _ = rx.await;
        }
    }

    pub async fn start(&self, request: CreateSessionRequest) -> Result<SessionRecord> {
        self.send_command(|responder| SessionCommand::Start { request, responder })
            .await
    }

    pub async fn stop(&self) -> Result<()> {
        self.send_command(|responder| SessionCommand::Stop { responder })
            .await
    }

    pub async fn post_chat(&self, text: &str) -> Result<()> {
        self.send_command(|responder| SessionCommand::PostChat {
            text: text.to_string(),
            responder,
        })
        .await
    }

    pub async fn dismiss_banner(&self) {
        let _ = self.tx.send(SessionCommand::DismissBanner).await;
    }

    /// Converge on the cleanup path and stop the actor. Safe to call more
    /// than once; later calls find the controller gone and return.
    pub async fn shutdown(&self) {
        let (responder, rx) = oneshot::channel();
        if self
            .tx
            .send(SessionCommand::Shutdown { responder })
            .await
            .is_ok()
        {
            let _ = rx.await;
        }
    }

    /// Current observable state.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.watch.borrow().clone()
    }

    /// Watch receiver for change notifications.
    pub fn watch(&self) -> watch::Receiver<SessionSnapshot> {
        self.watch.clone()
    }
}
