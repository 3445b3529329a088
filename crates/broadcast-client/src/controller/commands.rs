//! Controller commands.
//!
//! Every mutation of the broadcast session is a command processed
//! sequentially by the actor, so no lock guards session state and no two
//! operations can interleave.

use tokio::sync::oneshot;

use broadcast_core::{CreateSessionRequest, Result, SessionRecord};

use crate::media::{CaptureConstraints, CaptureSnapshot, DeviceDescriptor, TrackKind};

/// All possible commands for the session controller actor.
#[derive(Debug)]
pub enum SessionCommand {
    /// Acquire camera and microphone (Idle only).
    AcquireDevices {
        constraints: CaptureConstraints,
        responder: oneshot::Sender<Result<CaptureSnapshot>>,
    },

    /// Enumerate available capture devices.
    EnumerateDevices {
        responder: oneshot::Sender<Result<Vec<DeviceDescriptor>>>,
    },

    /// Hot-swap one track to another device.
    SwitchDevice {
        kind: TrackKind,
        device_id: String,
        responder: oneshot::Sender<Result<()>>,
    },

    /// Flip a track's enabled flag (mute / camera-off).
    ToggleTrack {
        kind: TrackKind,
        responder: oneshot::Sender<Result<bool>>,
    },

    /// Register a presentation render sink on the capture handle.
    AttachSink {
        label: String,
        responder: oneshot::Sender<Result<()>>,
    },

    /// Remove a presentation render sink.
    DetachSink {
        label: String,
        responder: oneshot::Sender<()>,
    },

    /// Create the backend session and go live.
    Start {
        request: CreateSessionRequest,
        responder: oneshot::Sender<Result<SessionRecord>>,
    },

    /// Stop the live session (user action).
    Stop {
        responder: oneshot::Sender<Result<()>>,
    },

    /// Send a chat line onto the realtime channel.
    PostChat {
        text: String,
        responder: oneshot::Sender<Result<()>>,
    },

    /// Clear the dismissible error banner.
    DismissBanner,

    /// Converge on the cleanup path and stop the actor (unmount).
    Shutdown {
        responder: oneshot::Sender<()>,
    },
}

impl SessionCommand {
    /// Command name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::AcquireDevices { .. } => "acquire_devices",
            Self::EnumerateDevices { .. } => "enumerate_devices",
            Self::SwitchDevice { .. } => "switch_device",
            Self::ToggleTrack { .. } => "toggle_track",
            Self::AttachSink { .. } => "attach_sink",
            Self::DetachSink { .. } => "detach_sink",
            Self::Start { .. } => "start",
            Self::Stop { .. } => "stop",
            Self::PostChat { .. } => "post_chat",
            Self::DismissBanner => "dismiss_banner",
            Self::Shutdown { .. } => "shutdown",
        }
    }
}
