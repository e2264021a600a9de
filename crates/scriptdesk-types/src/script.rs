//! Script types for ScriptDesk.
//!
//! A script is a named, independent conversational context. Scripts are owned
//! by the registry; everything else holds them by id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

/// Name given to freshly created scripts.
pub const DEFAULT_SCRIPT_NAME: &str = "New Script";

/// Maximum script name length, in characters.
pub const MAX_SCRIPT_NAME_CHARS: usize = 40;

/// Unique, stable identifier of a script.
///
/// Stored as a plain string so documents written by earlier versions (which
/// used short numeric ids) keep loading. New ids are UUID v7 strings, which
/// are time-derived and sort by creation time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScriptId(pub String);

impl ScriptId {
    /// Generate a fresh time-derived id.
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScriptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ScriptId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ScriptId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A named chat context.
///
/// Serialized as `{"id", "name", "lastAccessed"}` with `lastAccessed` in epoch
/// milliseconds, matching the `scripts_data` document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Script {
    pub id: ScriptId,
    pub name: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub last_accessed: DateTime<Utc>,
}

impl Script {
    /// A new script with the default name, last accessed at `now`.
    pub fn new(id: ScriptId, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: DEFAULT_SCRIPT_NAME.to_string(),
            last_accessed: now,
        }
    }
}

/// Normalize a user-supplied script name.
///
/// Trims surrounding whitespace and truncates to [`MAX_SCRIPT_NAME_CHARS`]
/// characters. Returns `None` when nothing is left.
pub fn normalize_script_name(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.chars().take(MAX_SCRIPT_NAME_CHARS).collect::<String>().trim_end().to_string())
}

/// Which scripts a listing shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptView {
    /// Every script, in insertion order.
    All,
    /// Scripts accessed within the recency window, most recent first.
    Recent,
}

impl fmt::Display for ScriptView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptView::All => write!(f, "all"),
            ScriptView::Recent => write!(f, "recent"),
        }
    }
}

impl FromStr for ScriptView {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(ScriptView::All),
            "recent" => Ok(ScriptView::Recent),
            other => Err(format!("invalid script view: '{other}'")),
        }
    }
}

impl Default for ScriptView {
    fn default() -> Self {
        ScriptView::All
    }
}
