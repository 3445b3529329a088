//! Live counters fed by realtime events.
//!
//! The viewer count is last-write-wins because every `viewer_count` event
//! carries the absolute value; reordering is harmless and a malformed
//! negative value clamps to zero. Likes are increment-only; dedup of a
//! single viewer's repeats happens at the sending side, not here.

/// Last-write-wins viewer count with a peak watermark.
#[derive(Debug, Clone, Copy, Default)]
pub struct ViewerCount {
    current: i64,
    peak: i64,
}

impl ViewerCount {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply an absolute count from a `viewer_count` event.
    pub fn apply(&mut self, count: i64) -> i64 {
        self.current = count.max(0);
        if self.current > self.peak {
            self.peak = self.current;
        }
        self.current
    }

    pub fn current(&self) -> i64 {
        self.current
    }

    pub fn peak(&self) -> i64 {
        self.peak
    }
}

/// Increment-only like counter.
#[derive(Debug, Clone, Copy, Default)]
pub struct LikeTally {
    count: u64,
}

impl LikeTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&mut self) -> u64 {
        self.count += 1;
        self.count
    }

    pub fn count(&self) -> u64 {
        self.count
    }
}
