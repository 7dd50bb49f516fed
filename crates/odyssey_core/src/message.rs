//! Messages sent to the text-generation service.

use crate::Role;
use serde::{Deserialize, Serialize};

/// One entry of a generation transcript.
///
/// # Examples
///
/// ```
/// use odyssey_core::{ChatMessage, Role};
///
/// let message = ChatMessage::user("I open the door.");
/// assert_eq!(message.role, Role::User);
/// assert_eq!(message.content, "I open the door.");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChatMessage {
    /// The role of the message sender
    pub role: Role,
    /// The message text
    pub content: String,
}

impl ChatMessage {
    /// Create a message with an explicit role.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}
