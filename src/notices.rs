//! User-facing notices.
//!
//! Launch outcomes are reported to the user as short notices. The host
//! decides how to show them; [`NoticeLog`] keeps the most recent ones in a
//! fixed-capacity ring buffer so a host can render them, and the bundled
//! binary prints them to stderr.

use std::fmt;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Warn,
    Error,
}

impl fmt::Display for NoticeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notice {
    pub id: u64,
    pub timestamp_ms: i64,
    pub level: NoticeLevel,
    pub source: String,
    pub message: String,
}

/// Where notices go. Implemented by the host.
pub trait NoticeSink: Send + Sync {
    fn notify(&self, level: NoticeLevel, source: &str, message: &str);
}

// ---------------------------------------------------------------------------
// Ring buffer
// ---------------------------------------------------------------------------

pub(crate) const NOTICE_RING_CAPACITY: usize = 100;

/// Fixed-capacity circular buffer of notices.
pub(crate) struct NoticeRing {
    entries: Vec<Option<Notice>>,
    capacity: usize,
    /// Write position (wraps around)
    write_pos: usize,
    /// Number of entries currently stored (≤ capacity)
    count: usize,
    next_id: u64,
}

impl NoticeRing {
    pub(crate) fn new(capacity: usize) -> Self {
        let mut entries = Vec::with_capacity(capacity);
        entries.resize_with(capacity, || None);
        Self {
            entries,
            capacity,
            write_pos: 0,
            count: 0,
            next_id: 1,
        }
    }

    pub(crate) fn push(&mut self, level: NoticeLevel, source: &str, message: &str) -> u64 {
        let id = self.next_id;
        self.next_id += 1;

        self.entries[self.write_pos] = Some(Notice {
            id,
            timestamp_ms: chrono::Utc::now().timestamp_millis(),
            level,
            source: source.to_string(),
            message: message.to_string(),
        });
        self.write_pos = (self.write_pos + 1) % self.capacity;
        if self.count < self.capacity {
            self.count += 1;
        }

        id
    }

    /// Entries oldest first, limited to the `limit` most recent (0 = all).
    pub(crate) fn get_entries(&self, limit: usize) -> Vec<Notice> {
        if self.count == 0 {
            return Vec::new();
        }
        let effective_limit = if limit == 0 { self.count } else { limit.min(self.count) };
        // write_pos points to the oldest entry once the buffer is full
        let start = if self.count < self.capacity { 0 } else { self.write_pos };
        let skip = self.count - effective_limit;
        (skip..self.count)
            .filter_map(|i| self.entries[(start + i) % self.capacity].clone())
            .collect()
    }
}

/// Thread-safe notice store, shared with the launcher and automation tasks.
pub struct NoticeLog {
    ring: Mutex<NoticeRing>,
}

impl Default for NoticeLog {
    fn default() -> Self {
        Self::new(NOTICE_RING_CAPACITY)
    }
}

impl NoticeLog {
    pub fn new(capacity: usize) -> Self {
        Self { ring: Mutex::new(NoticeRing::new(capacity.max(1))) }
    }

    pub fn entries(&self, limit: usize) -> Vec<Notice> {
        self.ring.lock().get_entries(limit)
    }
}

impl NoticeSink for NoticeLog {
    fn notify(&self, level: NoticeLevel, source: &str, message: &str) {
        self.ring.lock().push(level, source, message);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
