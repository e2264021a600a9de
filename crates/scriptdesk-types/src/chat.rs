//! Chat message and history types for ScriptDesk.
//!
//! These types model the per-script conversation: individual messages, their
//! roles, and the `chat_histories` document that maps script ids to ordered
//! message lists.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::script::ScriptId;

/// Content of the message appended when the assistant backend fails.
///
/// The raw backend error is never shown to the user.
pub const GENERATION_ERROR_MESSAGE: &str = "Sorry, there was an error generating the response.";

/// Who produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    /// Synthesized by the controller when generation fails.
    Error,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
            MessageRole::Error => write!(f, "error"),
        }
    }
}

impl FromStr for MessageRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(MessageRole::User),
            "assistant" => Ok(MessageRole::Assistant),
            "error" => Ok(MessageRole::Error),
            other => Err(format!("invalid message role: '{other}'")),
        }
    }
}

/// A single message in a script's history. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
    /// Creation time. Older stored documents may lack it; such messages are
    /// treated as created "now" by retention.
    #[serde(
        default,
        with = "chrono::serde::ts_milliseconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp: Option<DateTime<Utc>>,
}

impl ChatMessage {
    pub fn new(role: MessageRole, content: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Some(now),
        }
    }

    pub fn user(content: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self::new(MessageRole::User, content, now)
    }

    pub fn assistant(content: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self::new(MessageRole::Assistant, content, now)
    }

    /// The fixed user-facing failure message.
    pub fn generation_error(now: DateTime<Utc>) -> Self {
        Self::new(MessageRole::Error, GENERATION_ERROR_MESSAGE, now)
    }

    /// The timestamp used for age calculations (`now` when missing).
    pub fn effective_timestamp(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.timestamp.unwrap_or(now)
    }
}

/// Ordered messages of one script, in insertion order.
pub type ChatHistory = Vec<ChatMessage>;

/// The `chat_histories` document: script id to history. A missing entry is an
/// empty history.
pub type ChatHistories = HashMap<ScriptId, ChatHistory>;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_message_role_roundtrip() {
        for role in [MessageRole::User, MessageRole::Assistant, MessageRole::Error] {
            let parsed: MessageRole = role.to_string().parse().unwrap();
            assert_eq!(parsed, role);
        }
        assert!("system".parse::<MessageRole>().is_err());
    }

    #[test]
    fn test_message_role_serde() {
        let json = serde_json::to_string(&MessageRole::Error).unwrap();
        assert_eq!(json, "\"error\"");
    }

    #[test]
    fn test_message_serializes_millis() {
        let msg = ChatMessage::user("hi", Utc.timestamp_millis_opt(1_700_000_000_000).unwrap());
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"role": "user", "content": "hi", "timestamp": 1_700_000_000_000i64})
        );
    }

    #[test]
    fn test_message_without_timestamp() {
        let msg: ChatMessage =
            serde_json::from_str(r#"{"role":"assistant","content":"hello"}"#).unwrap();
        assert!(msg.timestamp.is_none());

        let now = Utc::now();
        assert_eq!(msg.effective_timestamp(now), now);

        let json = serde_json::to_string(&msg).unwrap();
        assert!(!json.contains("timestamp"));
    }

    #[test]
    fn test_histories_document_shape() {
        let raw = r#"{"1":[{"role":"user","content":"a","timestamp":1}],"2":[]}"#;
        let histories: ChatHistories = serde_json::from_str(raw).unwrap();
        assert_eq!(histories.len(), 2);
        assert_eq!(histories[&ScriptId::from("1")].len(), 1);
        assert!(histories[&ScriptId::from("2")].is_empty());
    }

    #[test]
    fn test_generation_error_message() {
        let msg = ChatMessage::generation_error(Utc::now());
        assert_eq!(msg.role, MessageRole::Error);
        assert_eq!(msg.content, GENERATION_ERROR_MESSAGE);
        assert!(!msg.content.is_empty());
    }
}
