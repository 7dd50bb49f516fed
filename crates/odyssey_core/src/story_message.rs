//! Persisted turn messages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who produced a stored message.
///
/// Parsing is strict: stored values other than `user` and `narrator` are
/// rejected rather than coerced.
///
/// # Examples
///
/// ```
/// use odyssey_core::MessageType;
/// use std::str::FromStr;
///
/// assert_eq!(MessageType::from_str("narrator").unwrap(), MessageType::Narrator);
/// assert!(MessageType::from_str("system").is_err());
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MessageType {
    /// Player input
    User,
    /// Narrator output
    Narrator,
}

/// A message as read back from storage.
///
/// `message_type` is kept as the stored text; it is only interpreted when a
/// transcript is built, where unknown values are a data-integrity fault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryMessage {
    /// Record identifier
    pub id: Uuid,
    /// Owning session
    pub session_id: Uuid,
    /// Chapter that was current when the message was created
    pub chapter_number: i32,
    /// Stored message type
    pub message_type: String,
    /// Message text
    pub content: String,
    /// Creation time; messages are ordered by it
    pub created_at: DateTime<Utc>,
}

/// A message ready to be inserted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewStoryMessage {
    /// Owning session
    pub session_id: Uuid,
    /// Chapter current at creation
    pub chapter_number: i32,
    /// Message type
    pub message_type: MessageType,
    /// Message text
    pub content: String,
}

impl NewStoryMessage {
    /// Player message for the given chapter.
    pub fn user(session_id: Uuid, chapter_number: i32, content: impl Into<String>) -> Self {
        Self {
            session_id,
            chapter_number,
            message_type: MessageType::User,
            content: content.into(),
        }
    }

    /// Narrator message for the given chapter.
    pub fn narrator(session_id: Uuid, chapter_number: i32, content: impl Into<String>) -> Self {
        Self {
            session_id,
            chapter_number,
            message_type: MessageType::Narrator,
            content: content.into(),
        }
    }
}
