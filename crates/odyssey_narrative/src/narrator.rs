//! Narration stage: writes the story and decides chapter transitions.

use crate::extraction::parse_reply;
use crate::prompts::narrator_system;
use crate::transcript::build_transcript;
use odyssey_core::{
    CHOICE_COUNT, Chapter, ChatMessage, GenerateRequest, NarrationOutput, PacingDirective,
    StageSettings, StoryMessage, StoryParameters,
};
use odyssey_error::{ConfigError, ExtractionError, ExtractionErrorKind, OdysseyResult};
use odyssey_interface::TextGeneration;
use serde::Deserialize;
use std::sync::Arc;
use tracing::instrument;

/// What the narration stage looks at.
#[derive(Debug, Clone, Copy)]
pub struct NarrationInput<'a> {
    /// Story parameters of the session
    pub params: &'a StoryParameters,
    /// The chapter being narrated
    pub chapter: &'a Chapter,
    /// Pacing advice for this turn, if any
    pub directive: Option<&'a PacingDirective>,
    /// Every message of the current chapter, oldest first
    pub history: &'a [StoryMessage],
    /// The player's latest message
    pub user_input: &'a str,
}

/// The narration stage.
///
/// Generation failures are retried by the wrapped generator; a reply that
/// parses but breaks the narration contract fails the turn immediately.
#[derive(Clone)]
pub struct Narrator {
    generator: Arc<dyn TextGeneration>,
    settings: StageSettings,
}

impl Narrator {
    /// Create the stage over a (retrying) generator.
    pub fn new(generator: Arc<dyn TextGeneration>, settings: StageSettings) -> Self {
        Self {
            generator,
            settings,
        }
    }

    /// Narrate the player's turn.
    #[instrument(
        skip_all,
        fields(session_id = %input.params.session_id, chapter = input.chapter.number, history = input.history.len())
    )]
    pub async fn narrate(&self, input: NarrationInput<'_>) -> OdysseyResult<NarrationOutput> {
        let mut messages = vec![ChatMessage::system(narrator_system(
            input.params,
            input.chapter,
            input.directive,
        ))];
        messages.extend(build_transcript(input.history)?);
        messages.push(ChatMessage::user(input.user_input.trim()));

        self.complete(messages).await
    }

    /// Narrate the opening of a chapter, before the player has said anything.
    #[instrument(skip_all, fields(session_id = %params.session_id, chapter = chapter.number))]
    pub async fn open(
        &self,
        params: &StoryParameters,
        chapter: &Chapter,
    ) -> OdysseyResult<NarrationOutput> {
        let messages = vec![
            ChatMessage::system(narrator_system(params, chapter, None)),
            ChatMessage::user("Begin the story."),
        ];
        self.complete(messages).await
    }

    async fn complete(&self, messages: Vec<ChatMessage>) -> OdysseyResult<NarrationOutput> {
        let request = GenerateRequest::builder()
            .messages(messages)
            .temperature(self.settings.temperature)
            .max_tokens(self.settings.max_tokens)
            .build()
            .map_err(|e| ConfigError::new(format!("Invalid narration request: {}", e)))?;

        let response = self.generator.generate(&request).await?;
        let narration = parse_narration(&response.content)?;
        tracing::debug!(
            should_transition = *narration.should_transition(),
            "Narration ready"
        );
        Ok(narration)
    }
}

#[derive(Debug, Deserialize)]
struct NarrationReply {
    #[serde(alias = "narration")]
    text: String,
    choices: Vec<String>,
    #[serde(alias = "shouldTransition")]
    should_transition: bool,
}

/// Parse and validate a narrator reply.
///
/// The reply must carry non-empty text, exactly three non-empty choices and
/// an explicit transition flag; choice lists are never truncated or padded.
///
/// # Examples
///
/// ```
/// use odyssey_narrative::parse_narration;
///
/// let reply = r#"{"narration": "Fog rolls in.", "choices": ["Wait", "Run", "Hide"], "shouldTransition": true}"#;
/// let narration = parse_narration(reply).unwrap();
/// assert_eq!(narration.text(), "Fog rolls in.");
/// assert!(*narration.should_transition());
///
/// let two = r#"{"text": "Fog.", "choices": ["Wait", "Run"], "should_transition": false}"#;
/// assert!(parse_narration(two).is_err());
/// ```
pub fn parse_narration(reply: &str) -> Result<NarrationOutput, ExtractionError> {
    let parsed: NarrationReply = parse_reply(reply)?;

    if parsed.text.trim().is_empty() {
        return Err(ExtractionError::new(ExtractionErrorKind::MissingField(
            "text".to_string(),
        )));
    }

    if let Some(index) = parsed.choices.iter().position(|c| c.trim().is_empty()) {
        return Err(ExtractionError::new(ExtractionErrorKind::MissingField(
            format!("choices[{}]", index),
        )));
    }

    let found = parsed.choices.len();
    let choices: [String; CHOICE_COUNT] = parsed.choices.try_into().map_err(|_| {
        tracing::error!(found, "Narration offered the wrong number of choices");
        ExtractionError::new(ExtractionErrorKind::ChoiceCount {
            expected: CHOICE_COUNT,
            found,
        })
    })?;

    Ok(NarrationOutput::new(
        parsed.text.trim(),
        choices.map(|c| c.trim().to_string()),
        parsed.should_transition,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn four_choices_rejected() {
        let reply = r#"{"text": "x", "choices": ["a", "b", "c", "d"], "should_transition": false}"#;
        let err = parse_narration(reply).unwrap_err();
        assert_eq!(
            err.kind,
            ExtractionErrorKind::ChoiceCount {
                expected: 3,
                found: 4
            }
        );
    }

    #[test]
    fn blank_choice_rejected() {
        let reply = r#"{"text": "x", "choices": ["a", " ", "c"], "should_transition": false}"#;
        let err = parse_narration(reply).unwrap_err();
        assert_eq!(
            err.kind,
            ExtractionErrorKind::MissingField("choices[1]".to_string())
        );
    }

    #[test]
    fn missing_flag_rejected() {
        let reply = "```json\n{\"text\": \"x\", \"choices\": [\"a\", \"b\", \"c\"]}\n```";
        let err = parse_narration(reply).unwrap_err();
        assert!(matches!(err.kind, ExtractionErrorKind::InvalidShape(_)));
    }

    #[test]
    fn non_boolean_flag_rejected() {
        let reply = r#"{"text": "x", "choices": ["a", "b", "c"], "should_transition": "maybe"}"#;
        assert!(parse_narration(reply).is_err());
    }

    #[test]
    fn empty_text_rejected() {
        let reply = r#"{"text": "", "choices": ["a", "b", "c"], "should_transition": false}"#;
        assert!(parse_narration(reply).is_err());
    }
}
