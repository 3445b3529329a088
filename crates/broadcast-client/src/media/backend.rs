use async_trait::async_trait;
use uuid::Uuid;

use broadcast_core::Result;

/// Track kind, camera or microphone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    Video,
    Audio,
}

impl TrackKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Audio => "audio",
        }
    }
}

/// One open capture track, as handed out by the backend.
#[derive(Debug, Clone)]
pub struct MediaTrack {
    pub id: Uuid,
    pub kind: TrackKind,
    pub device_id: String,
    pub label: String,
    pub enabled: bool,
}

impl MediaTrack {
    pub fn new(kind: TrackKind, device_id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            device_id: device_id.into(),
            label: label.into(),
            enabled: true,
        }
    }
}

/// An available capture device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceDescriptor {
    pub device_id: String,
    pub kind: TrackKind,
    pub label: String,
}

/// Requested devices for acquisition; `None` means the platform default.
#[derive(Debug, Clone, Default)]
pub struct CaptureConstraints {
    pub video_device: Option<String>,
    pub audio_device: Option<String>,
}

/// Platform capture layer.
///
/// Implementations map their own failures onto the shared taxonomy:
/// a denied prompt is `Permission`, an absent device `DeviceNotFound`.
/// The manager never calls `open_*` twice for the same slot without
/// stopping the previous track.
#[async_trait(?Send)]
pub trait DeviceBackend {
    /// Open one video and one audio track in a single permission prompt.
    async fn open_capture(
        &self,
        constraints: &CaptureConstraints,
    ) -> Result<(MediaTrack, MediaTrack)>;

    /// Open a single track on a specific device (hot-swap path).
    async fn open_track(&self, kind: TrackKind, device_id: &str) -> Result<MediaTrack>;

    /// Stop a track and release its hardware.
    async fn stop_track(&self, track: &MediaTrack) -> Result<()>;

    /// Enumerate devices. `disclose_labels` is false until a capture has
    /// been granted once; implementations must blank labels in that case.
    async fn list_devices(&self, disclose_labels: bool) -> Result<Vec<DeviceDescriptor>>;
}
