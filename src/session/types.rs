//! Core types for conversation sessions.
//!
//! A [`Session`] is one persisted conversation: an append-only message
//! log plus a running approximate-token counter that drives rotation.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Unique session identifier (UUID v4, opaque to callers).
pub type SessionId = String;

/// Current schema version for session serialization.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Timestamp format used for session and message timestamps.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Who produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The human speaking to the assistant.
    User,
    /// The assistant's response.
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

/// One conversational turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Speaker of this message.
    pub role: Role,
    /// Message text.
    pub content: String,
    /// Creation time, human-readable.
    pub timestamp: String,
    /// Approximate token cost attributed to this message at creation.
    /// Never recomputed afterwards. Absent in files written by older
    /// layouts, which load as zero.
    #[serde(default)]
    pub approx_tokens: u64,
}

impl Message {
    /// Create a message stamped with the current time.
    pub fn new(role: Role, content: impl Into<String>, approx_tokens: u64) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: now_timestamp(),
            approx_tokens,
        }
    }
}

/// One persisted conversation.
///
/// `messages` is append-only and never reordered. `token_count` is
/// maintained incrementally as messages are appended and restored
/// verbatim from disk, never recomputed from the list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Unique identifier, immutable once created.
    pub id: SessionId,
    /// Display title. Starts as a timestamp-derived default; may be
    /// overwritten once by the naming agent or explicitly by the user.
    pub name: String,
    /// Creation time, human-readable. Immutable.
    pub created_at: String,
    /// Ordered conversation log.
    pub messages: Vec<Message>,
    /// Running sum of `approx_tokens` since creation (or last rotation).
    pub token_count: u64,
    /// Schema version for forward compatibility. Files written before
    /// versioning load as the current version.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
}

fn default_schema_version() -> u32 {
    CURRENT_SCHEMA_VERSION
}

impl Session {
    /// Create a new empty session with a fresh id.
    ///
    /// Without an explicit name the session gets the timestamp default
    /// (`Chat {created_at}`), which [`has_default_name`](Self::has_default_name)
    /// recognizes later.
    pub fn new(name: Option<&str>) -> Self {
        let created_at = now_timestamp();
        let name = name
            .map(str::to_owned)
            .unwrap_or_else(|| format!("Chat {created_at}"));
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            created_at,
            messages: Vec::new(),
            token_count: 0,
            schema_version: CURRENT_SCHEMA_VERSION,
        }
    }

    /// Append a message and add its cost to the running counter.
    pub fn push_message(&mut self, message: Message) {
        self.token_count = self.token_count.saturating_add(message.approx_tokens);
        self.messages.push(message);
    }

    /// Whether the name still matches the generated `Chat {timestamp}`
    /// default. A structural check rather than a substring match, so a
    /// user title that merely starts with "Chat" is not mistaken for the
    /// default.
    #[must_use]
    pub fn has_default_name(&self) -> bool {
        self.name
            .strip_prefix("Chat ")
            .is_some_and(|rest| NaiveDateTime::parse_from_str(rest, TIMESTAMP_FORMAT).is_ok())
    }
}

/// Fixed heuristic for a message's approximate token cost: character
/// count divided by four, floored.
#[must_use]
pub fn estimate_tokens(content: &str) -> u64 {
    (content.chars().count() / 4) as u64
}

/// Current local time in the session timestamp format.
fn now_timestamp() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_new_sets_defaults() {
        let session = Session::new(None);
        assert!(!session.id.is_empty());
        assert!(session.name.starts_with("Chat "));
        assert!(session.messages.is_empty());
        assert_eq!(session.token_count, 0);
        assert_eq!(session.name, format!("Chat {}", session.created_at));
        assert_eq!(session.schema_version, CURRENT_SCHEMA_VERSION);
    }

    #[test]
    fn session_new_with_explicit_name() {
        let session = Session::new(Some("Trip planning"));
        assert_eq!(session.name, "Trip planning");
        assert!(!session.has_default_name());
    }

    #[test]
    fn session_ids_are_unique() {
        let a = Session::new(None);
        let b = Session::new(None);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn push_message_accumulates_tokens() {
        let mut session = Session::new(None);
        session.push_message(Message::new(Role::User, "hello", 10));
        session.push_message(Message::new(Role::Assistant, "hi there", 7));
        assert_eq!(session.messages.len(), 2);
        assert_eq!(session.token_count, 17);
    }

    #[test]
    fn default_name_is_recognized() {
        let session = Session::new(None);
        assert!(session.has_default_name());
    }

    #[test]
    fn user_title_starting_with_chat_is_not_default() {
        let session = Session::new(Some("Chat about birds"));
        assert!(!session.has_default_name());
    }

    #[test]
    fn renamed_session_loses_default_name() {
        let mut session = Session::new(None);
        session.name = "My Trip Plan".to_owned();
        assert!(!session.has_default_name());
    }

    #[test]
    fn estimate_tokens_divides_by_four() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abc"), 0);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("a".repeat(100).as_str()), 25);
    }

    #[test]
    fn estimate_tokens_counts_chars_not_bytes() {
        // Four multi-byte characters are still one token
        assert_eq!(estimate_tokens("\u{e9}\u{e9}\u{e9}\u{e9}"), 1);
    }

    #[test]
    fn message_serde_round_trip() {
        let msg = Message::new(Role::User, "hello", 5);
        let json = serde_json::to_string(&msg).unwrap();
        let parsed: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, msg);
    }

    #[test]
    fn message_without_approx_tokens_loads_as_zero() {
        // Files written before the per-message cost field existed
        let json = r#"{"role":"user","content":"hi","timestamp":"2024-01-01 10:00:00"}"#;
        let parsed: Message = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.approx_tokens, 0);
        assert_eq!(parsed.role, Role::User);
    }

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&Role::Assistant).unwrap();
        assert_eq!(json, "\"assistant\"");
    }

    #[test]
    fn session_serde_round_trip() {
        let mut session = Session::new(None);
        session.push_message(Message::new(Role::User, "hello", 5));
        session.push_message(Message::new(Role::Assistant, "hi", 2));

        let json = serde_json::to_string(&session).unwrap();
        let parsed: Session = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, session);
        assert_eq!(parsed.token_count, 7);
    }

    #[test]
    fn token_count_restored_verbatim_not_recomputed() {
        // A counter that disagrees with the message list must survive a
        // round trip untouched
        let json = r#"{
            "id": "abc",
            "name": "Chat 2024-01-01 10:00:00",
            "created_at": "2024-01-01 10:00:00",
            "messages": [
                {"role": "user", "content": "hello", "timestamp": "2024-01-01 10:00:01"}
            ],
            "token_count": 4242
        }"#;
        let parsed: Session = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.token_count, 4242);
        // Pre-versioning files load as the current schema version
        assert_eq!(parsed.schema_version, CURRENT_SCHEMA_VERSION);
    }

    #[test]
    fn session_types_are_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Session>();
        assert_send_sync::<Message>();
        assert_send_sync::<Role>();
    }
}
