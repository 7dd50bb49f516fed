//! Chapter records and the history/current/future lifecycle.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Position of a chapter in its session's lifecycle.
///
/// A chapter only ever walks `future` → `current` → `history`.
///
/// # Examples
///
/// ```
/// use odyssey_core::ChapterStatus;
/// use std::str::FromStr;
///
/// assert_eq!(ChapterStatus::Current.to_string(), "current");
/// assert_eq!(ChapterStatus::from_str("history").unwrap(), ChapterStatus::History);
/// assert!(ChapterStatus::from_str("archived").is_err());
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
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ChapterStatus {
    /// Completed, immutable
    History,
    /// Being narrated; at most one per session
    Current,
    /// Planned, not yet narrated
    Future,
}

/// A bounded narrative unit with its own arc.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    /// Record identifier
    pub id: Uuid,
    /// Owning session
    pub session_id: Uuid,
    /// Position in the session's chapter sequence, starting at 1
    pub number: i32,
    /// Chapter title
    pub title: String,
    /// What the chapter is about
    pub description: String,
    /// Lifecycle position
    pub status: ChapterStatus,
    /// Beats narrated so far in this chapter, one per line
    pub decomposition: Option<String>,
}

impl Chapter {
    /// This chapter's decomposition with one more beat appended.
    ///
    /// # Examples
    ///
    /// ```
    /// # use odyssey_core::{Chapter, ChapterStatus};
    /// # use uuid::Uuid;
    /// let mut chapter = Chapter {
    ///     id: Uuid::new_v4(),
    ///     session_id: Uuid::new_v4(),
    ///     number: 1,
    ///     title: "Arrival".into(),
    ///     description: "The keeper returns.".into(),
    ///     status: ChapterStatus::Current,
    ///     decomposition: None,
    /// };
    /// assert_eq!(chapter.with_beat("The tide turns."), "The tide turns.");
    /// chapter.decomposition = Some("The tide turns.".into());
    /// assert_eq!(chapter.with_beat("A bell rings."), "The tide turns.\nA bell rings.");
    /// ```
    pub fn with_beat(&self, beat: &str) -> String {
        let beat = beat.trim();
        match self.decomposition.as_deref().map(str::trim_end) {
            Some(existing) if !existing.is_empty() => format!("{}\n{}", existing, beat),
            _ => beat.to_string(),
        }
    }
}

/// A chapter ready to be inserted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewChapter {
    /// Owning session
    pub session_id: Uuid,
    /// Position in the session's chapter sequence
    pub number: i32,
    /// Chapter title
    pub title: String,
    /// What the chapter is about
    pub description: String,
    /// Initial lifecycle position
    pub status: ChapterStatus,
}

/// A chapter as proposed by forward planning, before it is numbered.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlannedChapter {
    /// Proposed title
    #[serde(default)]
    pub title: String,
    /// Proposed description
    #[serde(default)]
    pub description: String,
}

impl PlannedChapter {
    /// Create a planned chapter.
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }

    /// Number this plan and bind it to a session.
    pub fn into_new_chapter(self, session_id: Uuid, number: i32, status: ChapterStatus) -> NewChapter {
        NewChapter {
            session_id,
            number,
            title: self.title,
            description: self.description,
            status,
        }
    }
}

impl From<&Chapter> for PlannedChapter {
    fn from(chapter: &Chapter) -> Self {
        Self::new(chapter.title.clone(), chapter.description.clone())
    }
}

/// All chapters of a session, grouped by lifecycle position.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChapterSet {
    /// Completed chapters, ascending by number
    pub history: Vec<Chapter>,
    /// The chapter being narrated, if any
    pub current: Option<Chapter>,
    /// Planned chapters, ascending by number
    pub future: Vec<Chapter>,
}

/// Outcome of completing the current chapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    /// The chapter moved to history
    pub completed: Chapter,
    /// The chapter promoted to current; `None` when the story is complete
    pub promoted: Option<Chapter>,
}
