//! Narrator output.

use serde::{Deserialize, Serialize};

/// Number of choices the narrator offers every turn.
pub const CHOICE_COUNT: usize = 3;

/// One turn of narration: the prose, the offered choices and the narrator's
/// chapter-transition decision.
///
/// # Examples
///
/// ```
/// use odyssey_core::NarrationOutput;
///
/// let narration = NarrationOutput::new(
///     "The door creaks open.",
///     [
///         "Step inside".to_string(),
///         "Call out".to_string(),
///         "Walk away".to_string(),
///     ],
///     false,
/// );
/// let rendered = narration.render();
/// assert!(rendered.starts_with("The door creaks open."));
/// assert!(rendered.contains("\n1. Step inside\n2. Call out\n3. Walk away"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_getters::Getters)]
pub struct NarrationOutput {
    /// Narration body
    text: String,
    /// Exactly three choices offered to the player
    choices: [String; CHOICE_COUNT],
    /// Whether the narrator decided the current chapter is complete
    should_transition: bool,
}

impl NarrationOutput {
    /// Create narration output.
    pub fn new(
        text: impl Into<String>,
        choices: [String; CHOICE_COUNT],
        should_transition: bool,
    ) -> Self {
        Self {
            text: text.into(),
            choices,
            should_transition,
        }
    }

    /// The user-visible text: narration body followed by a numbered choice list.
    pub fn render(&self) -> String {
        let mut rendered = self.text.trim_end().to_string();
        rendered.push_str("\n\n");
        let list = self
            .choices
            .iter()
            .enumerate()
            .map(|(i, choice)| format!("{}. {}", i + 1, choice.trim()))
            .collect::<Vec<_>>()
            .join("\n");
        rendered.push_str(&list);
        rendered
    }
}
