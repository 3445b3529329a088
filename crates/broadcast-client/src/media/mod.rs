//! Local capture device ownership.
//!
//! Hardware access lives behind [`DeviceBackend`]; the host application
//! supplies the platform implementation. [`MediaDeviceManager`] is the sole
//! owner and sole mutator of the capture handle — presentation sinks attach
//! read-only, and every exit path funnels through the idempotent
//! [`MediaDeviceManager::release`].

pub mod backend;
pub mod manager;

pub use backend::{CaptureConstraints, DeviceBackend, DeviceDescriptor, MediaTrack, TrackKind};
pub use manager::{CaptureSnapshot, MediaDeviceManager};
