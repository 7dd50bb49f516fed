//! Per-session story configuration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Thematic and tonal configuration established once at session start.
///
/// Immutable after creation: stages read it on every turn but never edit it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryParameters {
    /// Session these parameters belong to
    pub session_id: Uuid,
    /// Central theme of the story
    pub theme: String,
    /// Where and when the story takes place
    pub setting: String,
    /// How the protagonist is framed
    pub protagonist: String,
    /// Sources of conflict the story draws on
    pub conflict_sources: String,
    /// Emotional effect the story aims for
    pub emotional_effect: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

/// Story parameters as supplied by the caller, before a session exists.
///
/// # Examples
///
/// ```
/// use odyssey_core::NewStoryParameters;
/// use uuid::Uuid;
///
/// let input = NewStoryParameters {
///     theme: "redemption".into(),
///     setting: "a drowned city".into(),
///     protagonist: "a disgraced lighthouse keeper".into(),
///     conflict_sources: "the tide, an old rival".into(),
///     emotional_effect: "bittersweet hope".into(),
/// };
/// let session_id = Uuid::new_v4();
/// let params = input.into_parameters(session_id);
/// assert_eq!(params.session_id, session_id);
/// assert_eq!(params.theme, "redemption");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NewStoryParameters {
    /// Central theme of the story
    pub theme: String,
    /// Where and when the story takes place
    pub setting: String,
    /// How the protagonist is framed
    #[serde(default)]
    pub protagonist: String,
    /// Sources of conflict the story draws on
    #[serde(default)]
    pub conflict_sources: String,
    /// Emotional effect the story aims for
    #[serde(default)]
    pub emotional_effect: String,
}

impl NewStoryParameters {
    /// Bind these parameters to a session, stamping the creation time.
    pub fn into_parameters(self, session_id: Uuid) -> StoryParameters {
        StoryParameters {
            session_id,
            theme: self.theme,
            setting: self.setting,
            protagonist: self.protagonist,
            conflict_sources: self.conflict_sources,
            emotional_effect: self.emotional_effect,
            created_at: Utc::now(),
        }
    }
}
