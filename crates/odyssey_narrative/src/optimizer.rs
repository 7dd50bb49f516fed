//! Pacing stage: decides the next beat of the current chapter.

use crate::prompts::{OPTIMIZER_SYSTEM, chapter_brief, story_brief};
use crate::transcript::render_dialogue;
use odyssey_core::{
    Chapter, ChatMessage, GenerateRequest, PacingDirective, StageSettings, StoryMessage,
    StoryParameters, StoryPhase,
};
use odyssey_error::{ConfigError, GenerationError, GenerationErrorKind, OdysseyResult};
use odyssey_interface::TextGeneration;
use regex::Regex;
use std::sync::{Arc, LazyLock};
use tracing::instrument;

static BEAT_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^[ \t>*_#`-]*NEXT[ _]?BEAT[ \t*_`]*:[ \t*_`]*(.*)$").expect("Valid beat regex")
});

static TRANSITION_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^[ \t>*_#`-]*TRANSITION[ \t*_`]*:[ \t*_`]*(.*)$")
        .expect("Valid transition regex")
});

static PHASE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^[ \t>*_#`-]*PHASE[ \t*_`]*:[ \t*_`]*(.*)$").expect("Valid phase regex")
});

/// What the pacing stage looks at.
#[derive(Debug, Clone, Copy)]
pub struct PacingInput<'a> {
    /// Story parameters of the session
    pub params: &'a StoryParameters,
    /// The chapter being narrated
    pub chapter: &'a Chapter,
    /// Recent messages across chapters, oldest first
    pub recent: &'a [StoryMessage],
    /// The player's latest message
    pub user_input: &'a str,
}

/// The pacing stage.
#[derive(Clone)]
pub struct Optimizer {
    generator: Arc<dyn TextGeneration>,
    settings: StageSettings,
}

impl Optimizer {
    /// Create the stage over a (retrying) generator.
    pub fn new(generator: Arc<dyn TextGeneration>, settings: StageSettings) -> Self {
        Self {
            generator,
            settings,
        }
    }

    /// Ask the model for the next beat.
    ///
    /// # Errors
    ///
    /// Fails if generation fails or the reply carries no beat.
    #[instrument(skip_all, fields(session_id = %input.params.session_id, chapter = input.chapter.number))]
    pub async fn direct(&self, input: PacingInput<'_>) -> OdysseyResult<PacingDirective> {
        let prompt = format!(
            "{}\n\nCurrent chapter:\n{}\n\nRecent exchange:\n{}\n\nPlayer: {}",
            story_brief(input.params),
            chapter_brief(input.chapter),
            render_dialogue(input.recent)?,
            input.user_input.trim()
        );

        let request = GenerateRequest::builder()
            .messages(vec![
                ChatMessage::system(OPTIMIZER_SYSTEM),
                ChatMessage::user(prompt),
            ])
            .temperature(self.settings.temperature)
            .max_tokens(self.settings.max_tokens)
            .build()
            .map_err(|e| ConfigError::new(format!("Invalid pacing request: {}", e)))?;

        let response = self.generator.generate(&request).await?;
        let directive = parse_directive(&response.content)?;
        tracing::debug!(
            beat = %directive.beat_description,
            transition_hint = directive.should_transition_hint,
            phase = ?directive.phase,
            "Pacing directive ready"
        );
        Ok(directive)
    }
}

fn captured<'a>(pattern: &Regex, reply: &'a str) -> Option<&'a str> {
    pattern
        .captures(reply)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().trim_end_matches(['*', '_', '`']).trim())
}

/// Parse the three labelled lines of a pacing reply.
///
/// Surrounding prose and markdown decoration are ignored. A missing
/// transition line reads as `false` and an unknown phase as `None`; a
/// missing or empty beat is an error.
///
/// # Examples
///
/// ```
/// use odyssey_core::StoryPhase;
/// use odyssey_narrative::parse_directive;
///
/// let reply = "Here you go:\n**NEXT_BEAT:** The bridge collapses.\nTRANSITION: no\nPHASE: climax";
/// let directive = parse_directive(reply).unwrap();
/// assert_eq!(directive.beat_description, "The bridge collapses.");
/// assert!(!directive.should_transition_hint);
/// assert_eq!(directive.phase, Some(StoryPhase::Climax));
/// ```
pub fn parse_directive(reply: &str) -> Result<PacingDirective, GenerationError> {
    let beat = captured(&BEAT_LINE, reply)
        .filter(|beat| !beat.is_empty())
        .ok_or_else(|| {
            tracing::error!(reply_length = reply.len(), "Pacing reply has no next beat");
            GenerationError::new(GenerationErrorKind::MissingBeat)
        })?;

    let should_transition_hint = captured(&TRANSITION_LINE, reply)
        .map(|value| {
            let value = value.to_ascii_lowercase();
            value.starts_with("yes") || value.starts_with("true")
        })
        .unwrap_or(false);

    let phase = match captured(&PHASE_LINE, reply) {
        Some(label) => {
            let phase = StoryPhase::from_label(label);
            if phase.is_none() {
                tracing::warn!(label, "Unknown story phase in pacing reply");
            }
            phase
        }
        None => None,
    };

    Ok(PacingDirective {
        beat_description: beat.to_string(),
        should_transition_hint,
        phase,
    })
}
