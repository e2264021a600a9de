//! Recency view over the script list.
//!
//! Pure derivations; nothing here mutates or persists.

use chrono::{DateTime, Duration, Utc};
use scriptdesk_types::script::{Script, ScriptView};

/// Default recency window.
pub const DEFAULT_RECENT_WINDOW_HOURS: i64 = 24;

/// Scripts accessed less than `window` ago, most recent first.
///
/// The sort is stable, so scripts with equal `last_accessed` keep their
/// insertion order.
pub fn recent_scripts(scripts: &[Script], now: DateTime<Utc>, window: Duration) -> Vec<Script> {
    let mut recent: Vec<Script> = scripts
        .iter()
        .filter(|s| now - s.last_accessed < window)
        .cloned()
        .collect();
    recent.sort_by(|a, b| b.last_accessed.cmp(&a.last_accessed));
    recent
}

/// Apply a [`ScriptView`] to the script list.
pub fn view_scripts(
    scripts: &[Script],
    view: ScriptView,
    now: DateTime<Utc>,
    window: Duration,
) -> Vec<Script> {
    match view {
        ScriptView::All => scripts.to_vec(),
        ScriptView::Recent => recent_scripts(scripts, now, window),
    }
}
