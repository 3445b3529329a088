//! Realtime event wire protocol.
//!
//! Every message on the duplex channel is a JSON envelope
//! `{"type": ..., "payload": ...}`. The set of types is closed; both the
//! broadcaster and the viewer speak exactly this enum, which is what keeps
//! the two implementations bit-compatible. Unknown types fail to decode and
//! are dropped by the channel layer, never fatal.

use serde::{Deserialize, Serialize};

/// A message exchanged over the realtime channel of one session.
///
/// Ordering rules are per-type: `viewer_count` is last-write-wins (the
/// payload is an absolute count), `like` is increment-only with no
/// channel-side dedup, `chat` is append-in-arrival-order, `stream_ended` is
/// a one-shot signal after which the receiver closes the channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum RealtimeEvent {
    /// Sent once by each participant when its connection opens.
    #[serde(rename_all = "camelCase")]
    Join { viewer_id: String, name: String },

    /// Absolute viewer count; safe under reordering.
    ViewerCount { count: i64 },

    /// One like from one viewer; dedup is the sender's responsibility.
    #[serde(rename_all = "camelCase")]
    Like { by_viewer_id: String },

    /// A chat line; arrival order is authoritative.
    #[serde(rename_all = "camelCase")]
    Chat {
        sender: String,
        sender_id: String,
        text: String,
    },

    /// Server-pushed termination; overrides local intent.
    StreamEnded {},
}

impl RealtimeEvent {
    /// Tag string as it appears on the wire, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Join { .. } => "join",
            Self::ViewerCount { .. } => "viewer_count",
            Self::Like { .. } => "like",
            Self::Chat { .. } => "chat",
            Self::StreamEnded {} => "stream_ended",
        }
    }
}
