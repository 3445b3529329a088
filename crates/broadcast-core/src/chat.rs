//! Bounded chat history for a live session.
//!
//! Chat is ephemeral: entries exist only for the lifetime of the session
//! and only in arrival order. The history is capped; the oldest entry is
//! evicted on overflow. Nothing here persists or resorts by timestamp.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use uuid::Uuid;

pub const DEFAULT_HISTORY_CAP: usize = 100;

/// One received chat line.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatEntry {
    pub id: Uuid,
    pub sender: String,
    pub sender_id: String,
    pub text: String,
    pub received_at: DateTime<Utc>,
}

impl ChatEntry {
    pub fn new(sender: impl Into<String>, sender_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender: sender.into(),
            sender_id: sender_id.into(),
            text: text.into(),
            received_at: Utc::now(),
        }
    }
}

/// Insertion-ordered history with a fixed capacity.
#[derive(Debug, Clone)]
pub struct ChatHistory {
    entries: VecDeque<ChatEntry>,
    cap: usize,
}

impl ChatHistory {
    pub fn new(cap: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(cap.min(DEFAULT_HISTORY_CAP)),
            cap: cap.max(1),
        }
    }

    /// Append in arrival order, evicting the oldest entry at capacity.
    pub fn push(&mut self, entry: ChatEntry) {
        if self.entries.len() == self.cap {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChatEntry> {
        self.entries.iter()
    }

    pub fn to_vec(&self) -> Vec<ChatEntry> {
        self.entries.iter().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for ChatHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAP)
    }
}
