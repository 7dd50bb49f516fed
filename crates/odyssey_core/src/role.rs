//! Role types for conversation participants.

use serde::{Deserialize, Serialize};

/// Speaker of a message sent to the text-generation service.
///
/// # Examples
///
/// ```
/// use odyssey_core::Role;
///
/// assert_ne!(Role::User, Role::Assistant);
/// assert_eq!(Role::System.as_str(), "system");
/// assert_eq!(format!("{}", Role::Assistant), "Assistant");
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions framing the generation
    System,
    /// Messages from the player
    User,
    /// Messages from the narrator
    Assistant,
}

impl Role {
    /// Wire name used by OpenAI-compatible providers.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}
