//! Time-based message retention.
//!
//! A message is kept while `now - timestamp <= ttl`. Messages without a
//! timestamp count as created "now" and are never purged early. A script
//! whose messages all expire keeps its (empty) history entry; only deleting
//! the script removes the entry.

use chrono::{DateTime, Duration, Utc};
use scriptdesk_types::chat::{ChatHistories, ChatMessage};

/// Default maximum message age.
pub const DEFAULT_TTL_HOURS: i64 = 24;

/// Whether `message` survives a sweep at `now`.
pub fn is_retained(message: &ChatMessage, now: DateTime<Utc>, ttl: Duration) -> bool {
    now - message.effective_timestamp(now) <= ttl
}

/// Return a copy of `histories` with expired messages removed.
///
/// Pure: the input is untouched and the same `now` always yields the same
/// result, so cleaning twice is a no-op the second time.
pub fn clean(histories: &ChatHistories, now: DateTime<Utc>, ttl: Duration) -> ChatHistories {
    histories
        .iter()
        .map(|(id, messages)| {
            let kept = messages
                .iter()
                .filter(|m| is_retained(m, now, ttl))
                .cloned()
                .collect();
            (id.clone(), kept)
        })
        .collect()
}

/// Retention rule with a fixed TTL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    ttl: Duration,
}

impl RetentionPolicy {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Remove expired messages in place, returning how many were removed.
    pub fn apply_in_place(&self, histories: &mut ChatHistories, now: DateTime<Utc>) -> usize {
        let mut purged = 0;
        for messages in histories.values_mut() {
            let before = messages.len();
            messages.retain(|m| is_retained(m, now, self.ttl));
            purged += before - messages.len();
        }
        purged
    }
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self::new(Duration::hours(DEFAULT_TTL_HOURS))
    }
}
