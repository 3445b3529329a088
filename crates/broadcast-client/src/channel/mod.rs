//! Realtime duplex channel, scoped to one session.
//!
//! [`RealtimeChannel`] speaks the typed event protocol over a
//! [`ChannelTransport`]; the production transport is a WebSocket via `awc`.
//! There is no automatic reconnection — a dropped transport is terminal for
//! the session's realtime features and the owner is informed through the
//! channel's EOF.

pub mod realtime;
pub mod transport;

pub use realtime::RealtimeChannel;
pub use transport::{ChannelConnector, ChannelTransport, WsChannelConnector};
