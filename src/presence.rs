//! Time-bounded cache of executable presence checks.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::cli::PresenceProbe;
use crate::command::DEFAULT_EXECUTABLE;

/// How long a probe result is reused.
pub(crate) const PRESENCE_TTL_MS: i64 = 60_000;

/// Millisecond wall clock, injectable for tests.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> i64;
}

#[derive(Debug, Default, Clone)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceCacheEntry {
    pub key: String,
    pub installed: bool,
    pub checked_at_ms: i64,
}

/// Shared by everything that needs presence checks; owned by the
/// composition root and handed out as `Arc<PresenceCache>`.
pub struct PresenceCache {
    probe: Arc<dyn PresenceProbe>,
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<String, PresenceCacheEntry>>,
    /// Assistant key that has been seen present; skips the TTL for it.
    assistant_confirmed: Mutex<Option<String>>,
}

impl PresenceCache {
    pub fn new(probe: Arc<dyn PresenceProbe>, clock: Arc<dyn Clock>) -> Self {
        Self {
            probe,
            clock,
            entries: Mutex::new(HashMap::new()),
            assistant_confirmed: Mutex::new(None),
        }
    }

    /// Whether `name` is installed, probing only when the cached answer is
    /// missing or older than the TTL.
    pub async fn is_present(&self, name: &str) -> bool {
        let now = self.clock.now_ms();
        let cached = self
            .entries
            .lock()
            .get(name)
            .filter(|entry| now - entry.checked_at_ms <= PRESENCE_TTL_MS)
            .map(|entry| entry.installed);
        if let Some(installed) = cached {
            return installed;
        }

        let installed = self.probe.probe(name).await;
        tracing::debug!(name, installed, "presence probed");
        self.entries.lock().insert(
            name.to_string(),
            PresenceCacheEntry {
                key: name.to_string(),
                installed,
                checked_at_ms: self.clock.now_ms(),
            },
        );
        installed
    }

    /// Whether the assistant executable is installed. Once found, the same
    /// executable is not probed again until the override path changes or
    /// the cache is cleared.
    pub async fn is_assistant_present(&self, use_override: bool, override_path: &str) -> bool {
        let key = assistant_key(use_override, override_path);
        let confirmed = self.assistant_confirmed.lock().as_deref() == Some(key.as_str());
        if confirmed {
            return true;
        }

        let installed = self.is_present(&key).await;
        *self.assistant_confirmed.lock() = installed.then_some(key);
        installed
    }

    /// Drop every cached result, including the assistant short-circuit.
    pub fn clear(&self) {
        self.entries.lock().clear();
        *self.assistant_confirmed.lock() = None;
    }

    pub fn entry(&self, name: &str) -> Option<PresenceCacheEntry> {
        self.entries.lock().get(name).cloned()
    }
}

/// The executable the presence check targets for the given settings.
pub fn assistant_key(use_override: bool, override_path: &str) -> String {
    let trimmed = override_path.trim();
    if use_override && !trimmed.is_empty() {
        trimmed.to_string()
    } else {
        DEFAULT_EXECUTABLE.to_string()
    }
}
