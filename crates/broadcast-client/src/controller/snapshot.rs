use broadcast_core::{ChatEntry, SessionPhase, SessionRecord};

/// Observable controller state, published through a watch channel.
///
/// This is the single source of truth for the presentation layer: every
/// "is live", "is loading", "has error" boolean derives from here instead
/// of living as a separate flag.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub session: Option<SessionRecord>,
    pub viewer_count: i64,
    pub peak_viewers: i64,
    pub like_count: u64,
    pub chat: Vec<ChatEntry>,
    /// Seconds elapsed since going live; frozen after the session ends.
    pub duration_secs: u64,
    /// True once the realtime channel dropped; counters and chat are
    /// frozen but the session itself is unaffected.
    pub realtime_lost: bool,
    /// Dismissible, user-facing message for recoverable errors.
    pub banner: Option<String>,
    /// Reason the controller entered `Failed`, if it did.
    pub failure: Option<String>,
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self {
            phase: SessionPhase::Idle,
            session: None,
            viewer_count: 0,
            peak_viewers: 0,
            like_count: 0,
            chat: Vec::new(),
            duration_secs: 0,
            realtime_lost: false,
            banner: None,
            failure: None,
        }
    }
}

impl SessionSnapshot {
    pub fn is_live(&self) -> bool {
        self.phase == SessionPhase::Live
    }
}
