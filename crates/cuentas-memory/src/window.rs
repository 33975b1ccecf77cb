//! Bounded, time-limited per-user message history used as classifier context.

use chrono::{DateTime, Duration, Utc};
use cuentas_core::{
    clock::Clock,
    limits::{CONVERSATION_TIMEOUT_MINUTES, CONVERSATION_WINDOW_SIZE},
    message::{ConversationEntry, Role},
};
use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::debug;

struct UserWindow {
    entries: VecDeque<ConversationEntry>,
    last_activity: DateTime<Utc>,
}

/// Keyed store of recent conversation turns.
///
/// Appending past the size limit drops the oldest entry. A user who has been
/// silent longer than the inactivity timeout starts from an empty window on
/// their next access.
pub struct ConversationWindow {
    windows: DashMap<String, UserWindow>,
    max_entries: usize,
    timeout: Duration,
    clock: Arc<dyn Clock>,
}

impl ConversationWindow {
    /// Create a window with the standard limits (10 entries, 30 minutes).
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            windows: DashMap::new(),
            max_entries: CONVERSATION_WINDOW_SIZE,
            timeout: Duration::minutes(CONVERSATION_TIMEOUT_MINUTES),
            clock,
        }
    }

    /// Record a turn for `user_key`.
    pub fn append(&self, user_key: &str, role: Role, text: &str) {
        let now = self.clock.now();
        let mut window = self
            .windows
            .entry(user_key.to_string())
            .or_insert_with(|| UserWindow {
                entries: VecDeque::with_capacity(self.max_entries),
                last_activity: now,
            });

        if now - window.last_activity > self.timeout {
            debug!("conversation window for {user_key} idle, clearing");
            window.entries.clear();
        }

        window.entries.push_back(ConversationEntry {
            role,
            content: text.to_string(),
            timestamp: now,
        });
        while window.entries.len() > self.max_entries {
            window.entries.pop_front();
        }
        window.last_activity = now;
    }

    /// The user's window, oldest first.
    pub fn snapshot(&self, user_key: &str) -> Vec<ConversationEntry> {
        let now = self.clock.now();
        self.windows
            .remove_if(user_key, |_, w| now - w.last_activity > self.timeout);
        self.windows
            .get(user_key)
            .map(|w| w.entries.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Forget everything for `user_key`.
    pub fn clear(&self, user_key: &str) {
        self.windows.remove(user_key);
    }

    /// Drop every idle window. Returns how many were removed.
    pub fn purge_idle(&self) -> usize {
        let now = self.clock.now();
        let before = self.windows.len();
        self.windows
            .retain(|_, w| now - w.last_activity <= self.timeout);
        before.saturating_sub(self.windows.len())
    }

    /// Number of users with a window in memory.
    pub fn user_count(&self) -> usize {
        self.windows.len()
    }
}
