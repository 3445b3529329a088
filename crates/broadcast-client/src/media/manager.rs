use std::rc::Rc;

use broadcast_core::{Result, SessionError};

use super::backend::{
    CaptureConstraints, DeviceBackend, DeviceDescriptor, MediaTrack, TrackKind,
};

struct CaptureHandle {
    video: MediaTrack,
    audio: MediaTrack,
    sinks: Vec<String>,
}

/// Read-only view of the live handle for presentation code.
#[derive(Debug, Clone)]
pub struct CaptureSnapshot {
    pub video: MediaTrack,
    pub audio: MediaTrack,
    pub sinks: Vec<String>,
}

/// Exclusive owner of the local capture resource for one session.
///
/// At most one handle is live at a time. All track mutation goes through
/// this manager; a switch either fully replaces the old track or leaves it
/// untouched. Nothing here retries on its own.
pub struct MediaDeviceManager {
    backend: Rc<dyn DeviceBackend>,
    handle: Option<CaptureHandle>,
    permission_granted: bool,
}

impl MediaDeviceManager {
    pub fn new(backend: Rc<dyn DeviceBackend>) -> Self {
        Self {
            backend,
            handle: None,
            permission_granted: false,
        }
    }

    /// Open camera and microphone. Fails with `State` if a handle is
    /// already live; permission and missing-device failures pass through
    /// from the backend untouched.
    pub async fn acquire(&mut self, constraints: &CaptureConstraints) -> Result<CaptureSnapshot> {
        if self.handle.is_some() {
            return Err(SessionError::State(
                "capture handle already acquired for this session".into(),
            ));
        }

        let (video, audio) = self.backend.open_capture(constraints).await?;
        tracing::debug!(
            video_device = %video.device_id,
            audio_device = %audio.device_id,
            "capture acquired"
        );

        self.permission_granted = true;
        self.handle = Some(CaptureHandle {
            video,
            audio,
            sinks: Vec::new(),
        });
        Ok(self.snapshot().expect("handle just stored"))
    }

    /// Device descriptors. Labels stay blank until a capture has been
    /// granted once.
    pub async fn enumerate(&self) -> Result<Vec<DeviceDescriptor>> {
        self.backend.list_devices(self.permission_granted).await
    }

    /// Atomically replace one track with a track on `device_id`.
    ///
    /// Open-new-then-stop-old: on open failure the previous track keeps
    /// producing and the call fails with `DeviceSwitch`. The enabled flag
    /// carries over to the replacement.
    pub async fn switch_device(&mut self, kind: TrackKind, device_id: &str) -> Result<()> {
        if self.handle.is_none() {
            return Err(SessionError::State("no capture handle to switch".into()));
        }

        let mut replacement = match self.backend.open_track(kind, device_id).await {
            Ok(track) => track,
            Err(e) => {
                tracing::warn!(kind = kind.as_str(), device_id, "device switch failed: {e}");
                return Err(SessionError::DeviceSwitch(e.to_string()));
            }
        };

        let handle = self.handle.as_mut().expect("checked above");
        let old = match kind {
            TrackKind::Video => &mut handle.video,
            TrackKind::Audio => &mut handle.audio,
        };
        replacement.enabled = old.enabled;
        let retired = std::mem::replace(old, replacement);

        if let Err(e) = self.backend.stop_track(&retired).await {
            tracing::warn!(track = %retired.id, "failed to stop replaced track: {e}");
        }
        Ok(())
    }

    /// Flip the enabled flag on one track. Pure in-memory; no device or
    /// network round-trip. Returns the new flag value.
    pub fn toggle_enabled(&mut self, kind: TrackKind) -> Result<bool> {
        let handle = self
            .handle
            .as_mut()
            .ok_or_else(|| SessionError::State("no capture handle to toggle".into()))?;
        let track = match kind {
            TrackKind::Video => &mut handle.video,
            TrackKind::Audio => &mut handle.audio,
        };
        track.enabled = !track.enabled;
        Ok(track.enabled)
    }

    /// Register a presentation render sink. Bookkeeping only.
    pub fn attach_sink(&mut self, label: impl Into<String>) -> Result<()> {
        let handle = self
            .handle
            .as_mut()
            .ok_or_else(|| SessionError::State("no capture handle to attach to".into()))?;
        let label = label.into();
        if !handle.sinks.contains(&label) {
            handle.sinks.push(label);
        }
        Ok(())
    }

    pub fn detach_sink(&mut self, label: &str) {
        if let Some(handle) = self.handle.as_mut() {
            handle.sinks.retain(|s| s != label);
        }
    }

    /// Stop all tracks and detach every sink. Idempotent; backend stop
    /// failures are logged and swallowed so cleanup cannot be blocked.
    pub async fn release(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };

        for track in [&handle.video, &handle.audio] {
            if let Err(e) = self.backend.stop_track(track).await {
                tracing::warn!(track = %track.id, "failed to stop track on release: {e}");
            }
        }
        tracing::debug!(sinks = handle.sinks.len(), "capture released");
    }

    pub fn has_handle(&self) -> bool {
        self.handle.is_some()
    }

    pub fn snapshot(&self) -> Option<CaptureSnapshot> {
        self.handle.as_ref().map(|h| CaptureSnapshot {
            video: h.video.clone(),
            audio: h.audio.clone(),
            sinks: h.sinks.clone(),
        })
    }
}
