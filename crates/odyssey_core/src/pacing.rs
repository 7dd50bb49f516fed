//! Pacing directives produced by the optimizer stage.

use serde::{Deserialize, Serialize};

/// Position in the five-phase chapter rhythm.
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
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum StoryPhase {
    /// Establishing the chapter's situation
    Introduction,
    /// Complications build
    Rising,
    /// The chapter's decisive moment
    Climax,
    /// Consequences settle
    Resolution,
    /// Handing over to the next chapter
    Transition,
}

impl StoryPhase {
    /// Parse a phase label as models tend to write it.
    ///
    /// Case, punctuation and common longer forms are tolerated.
    ///
    /// # Examples
    ///
    /// ```
    /// use odyssey_core::StoryPhase;
    ///
    /// assert_eq!(StoryPhase::from_label("Rising Tension"), Some(StoryPhase::Rising));
    /// assert_eq!(StoryPhase::from_label("**CLIMAX**"), Some(StoryPhase::Climax));
    /// assert_eq!(StoryPhase::from_label("denouement"), None);
    /// ```
    pub fn from_label(label: &str) -> Option<Self> {
        let normalized: String = label
            .chars()
            .filter(|c| c.is_ascii_alphabetic())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match normalized.as_str() {
            "introduction" | "intro" | "setup" => Some(Self::Introduction),
            "rising" | "risingtension" | "risingaction" => Some(Self::Rising),
            "climax" => Some(Self::Climax),
            "resolution" | "fallingaction" => Some(Self::Resolution),
            "transition" => Some(Self::Transition),
            _ => None,
        }
    }
}

/// The next beat the narrator should dramatize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacingDirective {
    /// What should happen next
    pub beat_description: String,
    /// Advisory hint that the chapter is ready to end
    pub should_transition_hint: bool,
    /// Current phase, when the model named a known one
    pub phase: Option<StoryPhase>,
}
