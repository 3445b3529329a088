//! Broadcaster session controller.
//!
//! A sequential actor owns the whole broadcast lifecycle: commands arrive
//! on an mpsc channel with oneshot responders and are processed one at a
//! time, interleaved with inbound realtime events and the duration clock.
//! Because nothing else mutates session state, every transition of
//! `Idle → DeviceReady → Starting → Live → Ending → Ended` (and the
//! parallel `Failed`) is atomic from the caller's point of view, and the
//! cleanup path is trivially idempotent.

pub mod actor;
pub mod commands;
pub mod handle;
pub mod snapshot;

pub use actor::{ControllerConfig, StreamSessionController};
pub use commands::SessionCommand;
pub use handle::ControllerHandle;
pub use snapshot::SessionSnapshot;
