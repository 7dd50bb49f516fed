//! Stored messages as generation transcripts.

use odyssey_core::{ChatMessage, MessageType, Role, StoryMessage};
use odyssey_error::{StorageError, StorageErrorKind};
use std::str::FromStr;

/// Map a stored message type onto the role the model sees.
///
/// Player messages are `user`; narrator messages are `assistant`, because the
/// model plays the narrator. Anything else in storage is a data-integrity
/// fault rather than something to guess about.
///
/// # Examples
///
/// ```
/// use odyssey_core::Role;
/// use odyssey_narrative::role_for;
///
/// assert_eq!(role_for("narrator").unwrap(), Role::Assistant);
/// assert!(role_for("system").is_err());
/// ```
pub fn role_for(message_type: &str) -> Result<Role, StorageError> {
    match MessageType::from_str(message_type) {
        Ok(MessageType::User) => Ok(Role::User),
        Ok(MessageType::Narrator) => Ok(Role::Assistant),
        Err(_) => {
            tracing::error!(message_type, "Unknown stored message type");
            Err(StorageError::new(StorageErrorKind::DataIntegrity(format!(
                "unknown message type '{}'",
                message_type
            ))))
        }
    }
}

/// Convert stored messages, oldest first, into chat messages.
pub fn build_transcript(messages: &[StoryMessage]) -> Result<Vec<ChatMessage>, StorageError> {
    messages
        .iter()
        .map(|m| Ok(ChatMessage::new(role_for(&m.message_type)?, m.content.clone())))
        .collect()
}

/// Render stored messages as labelled plain text for stage prompts.
pub(crate) fn render_dialogue(messages: &[StoryMessage]) -> Result<String, StorageError> {
    let mut lines = Vec::with_capacity(messages.len());
    for message in messages {
        let label = match role_for(&message.message_type)? {
            Role::User => "Player",
            _ => "Narrator",
        };
        lines.push(format!("{}: {}", label, message.content.trim()));
    }
    Ok(lines.join("\n"))
}
