//! Shared types for the live broadcast session core.
//!
//! This crate holds everything both sides of a broadcast agree on: the
//! session data model, the realtime event wire protocol, the bounded chat
//! history, the viewer counters and the error taxonomy. It performs no I/O;
//! the client crate supplies transports and device backends.

pub mod chat;
pub mod counters;
pub mod error;
pub mod events;
pub mod models;

pub use chat::{ChatEntry, ChatHistory};
pub use counters::{LikeTally, ViewerCount};
pub use error::{Result, SessionError};
pub use events::RealtimeEvent;
pub use models::{CreateSessionRequest, SessionCategory, SessionPhase, SessionRecord};
