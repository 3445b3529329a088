//! Client side of the live broadcast session core.
//!
//! Three independently-failing subsystems are coordinated here:
//!
//! - local capture devices ([`media::MediaDeviceManager`], hardware behind
//!   the [`media::DeviceBackend`] trait),
//! - the REST-backed session lifecycle ([`api::SessionApi`]),
//! - the realtime duplex channel ([`channel::RealtimeChannel`]).
//!
//! The broadcaster runs [`controller::StreamSessionController`], a
//! sequential actor whose published snapshot is the single source of truth
//! for the presentation layer. Viewers run [`viewer::ViewerSession`], a
//! read-mostly consumer of the same channel protocol.

pub mod api;
pub mod auth;
pub mod channel;
pub mod config;
pub mod controller;
pub mod logging;
pub mod media;
pub mod viewer;

pub use api::{HttpSessionApi, SessionApi};
pub use auth::{Identity, StoredToken, TokenStore};
pub use channel::{ChannelConnector, ChannelTransport, RealtimeChannel, WsChannelConnector};
pub use config::ClientConfig;
pub use controller::{ControllerHandle, SessionSnapshot, StreamSessionController};
pub use media::{CaptureConstraints, DeviceBackend, MediaDeviceManager, TrackKind};
pub use viewer::ViewerSession;
