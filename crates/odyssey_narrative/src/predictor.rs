//! Forward-planning stage: plans and revises the chapter roadmap.

use crate::extraction::parse_reply;
use crate::prompts::{
    PREDICTOR_INITIALIZE_SYSTEM, PREDICTOR_REFRESH_SYSTEM, chapter_brief, roadmap_brief,
    story_brief,
};
use crate::transcript::render_dialogue;
use odyssey_core::{
    Chapter, ChatMessage, GenerateRequest, PlannedChapter, StageSettings, StoryMessage,
    StoryParameters,
};
use odyssey_error::{ConfigError, ExtractionError, ExtractionErrorKind, OdysseyResult};
use odyssey_interface::TextGeneration;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;

/// The first chapter and the roadmap after it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitialRoadmap {
    /// Where the story begins
    pub current: PlannedChapter,
    /// Chapters planned after the first, in narration order
    pub future: Vec<PlannedChapter>,
}

/// What the model reports having changed during a refresh.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RoadmapModifications {
    /// The current chapter's title or description changed
    #[serde(default)]
    pub current_chapter_modified: bool,
    /// Planned chapters were edited, reordered or dropped
    #[serde(default)]
    pub future_chapters_modified: bool,
    /// Planned chapters were added
    #[serde(default)]
    pub new_chapters_added: bool,
    /// Why
    #[serde(default)]
    pub reasoning: String,
}

impl RoadmapModifications {
    /// Whether the future chapters must be replaced.
    pub fn touches_future(&self) -> bool {
        self.future_chapters_modified || self.new_chapters_added
    }
}

/// A revised roadmap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoadmapRefresh {
    /// Current chapter, possibly refined
    pub current: PlannedChapter,
    /// Planned chapters, possibly revised
    #[serde(default)]
    pub future: Vec<PlannedChapter>,
    /// Self-reported edits
    #[serde(default)]
    pub modifications: RoadmapModifications,
}

/// Everything the refresh sees after a turn.
#[derive(Debug, Clone)]
pub struct RefreshContext<'a> {
    /// Story parameters of the session
    pub params: &'a StoryParameters,
    /// Completed chapters; context only
    pub history: &'a [Chapter],
    /// The chapter being narrated
    pub current: &'a Chapter,
    /// Planned chapters
    pub future: &'a [Chapter],
    /// Recent messages, oldest first
    pub recent: &'a [StoryMessage],
    /// The player's latest message
    pub user_input: &'a str,
    /// The narrator's latest reply
    pub narrator_output: &'a str,
    /// The narrator decided to end the current chapter this turn
    pub transition_pending: bool,
}

#[derive(Debug, Deserialize)]
struct InitializeReply {
    #[serde(alias = "roadmap")]
    chapters: Vec<PlannedChapter>,
}

/// The forward-planning stage.
#[derive(Clone)]
pub struct Predictor {
    generator: Arc<dyn TextGeneration>,
    settings: StageSettings,
}

impl Predictor {
    /// Create the stage over a (retrying) generator.
    pub fn new(generator: Arc<dyn TextGeneration>, settings: StageSettings) -> Self {
        Self {
            generator,
            settings,
        }
    }

    /// Plan a new story: its first chapter and a roadmap of model-chosen length.
    #[instrument(skip_all, fields(session_id = %params.session_id))]
    pub async fn initialize(&self, params: &StoryParameters) -> OdysseyResult<InitialRoadmap> {
        let reply = self
            .ask(PREDICTOR_INITIALIZE_SYSTEM, story_brief(params))
            .await?;
        let parsed: InitializeReply = parse_reply(&reply)?;
        validate_chapters(&parsed.chapters)?;

        let mut chapters = parsed.chapters.into_iter();
        let current = chapters
            .next()
            .ok_or_else(|| ExtractionError::new(ExtractionErrorKind::EmptyRoadmap))?;
        let future: Vec<_> = chapters.collect();
        tracing::info!(planned = future.len() + 1, "Initial roadmap planned");
        Ok(InitialRoadmap { current, future })
    }

    /// Revise the current chapter and the roadmap after a turn.
    #[instrument(skip_all, fields(session_id = %ctx.params.session_id, chapter = ctx.current.number))]
    pub async fn refresh(&self, ctx: RefreshContext<'_>) -> OdysseyResult<RoadmapRefresh> {
        let history: Vec<PlannedChapter> = ctx.history.iter().map(PlannedChapter::from).collect();
        let future: Vec<PlannedChapter> = ctx.future.iter().map(PlannedChapter::from).collect();

        let mut prompt = format!(
            "{}\n\nCompleted chapters:\n{}\n\nCurrent chapter:\n{}\n\nPlanned chapters:\n{}\n\nRecent exchange:\n{}\n\nPlayer: {}\nNarrator: {}",
            story_brief(ctx.params),
            roadmap_brief(&history),
            chapter_brief(ctx.current),
            roadmap_brief(&future),
            render_dialogue(ctx.recent)?,
            ctx.user_input.trim(),
            ctx.narrator_output.trim()
        );
        if ctx.transition_pending {
            prompt.push_str(
                "\n\nThe narrator has just ended the current chapter; the first planned chapter comes next.",
            );
        }

        let reply = self.ask(PREDICTOR_REFRESH_SYSTEM, prompt).await?;
        let refresh: RoadmapRefresh = parse_reply(&reply)?;
        validate_chapters(std::slice::from_ref(&refresh.current))?;
        validate_chapters(&refresh.future).or_else(|e| match e.kind {
            ExtractionErrorKind::EmptyRoadmap => Ok(()),
            _ => Err(e),
        })?;

        tracing::info!(
            current_modified = refresh.modifications.current_chapter_modified,
            future_modified = refresh.modifications.future_chapters_modified,
            added = refresh.modifications.new_chapters_added,
            reasoning = %refresh.modifications.reasoning,
            "Roadmap refreshed"
        );
        Ok(refresh)
    }

    async fn ask(&self, system: &str, prompt: String) -> OdysseyResult<String> {
        let request = GenerateRequest::builder()
            .messages(vec![ChatMessage::system(system), ChatMessage::user(prompt)])
            .temperature(self.settings.temperature)
            .max_tokens(self.settings.max_tokens)
            .build()
            .map_err(|e| ConfigError::new(format!("Invalid planning request: {}", e)))?;
        Ok(self.generator.generate(&request).await?.content)
    }
}

/// Check a planned chapter list: non-empty, every chapter titled and described.
///
/// # Examples
///
/// ```
/// use odyssey_core::PlannedChapter;
/// use odyssey_narrative::validate_chapters;
///
/// assert!(validate_chapters(&[PlannedChapter::new("Arrival", "The keeper returns.")]).is_ok());
/// assert!(validate_chapters(&[]).is_err());
/// assert!(validate_chapters(&[PlannedChapter::new("Arrival", " ")]).is_err());
/// ```
pub fn validate_chapters(chapters: &[PlannedChapter]) -> Result<(), ExtractionError> {
    if chapters.is_empty() {
        return Err(ExtractionError::new(ExtractionErrorKind::EmptyRoadmap));
    }

    for (index, chapter) in chapters.iter().enumerate() {
        let missing = if chapter.title.trim().is_empty() {
            Some("title")
        } else if chapter.description.trim().is_empty() {
            Some("description")
        } else {
            None
        };
        if let Some(field) = missing {
            tracing::error!(index, field, "Planned chapter is incomplete");
            return Err(ExtractionError::new(
                ExtractionErrorKind::IncompleteChapter {
                    index,
                    field: field.to_string(),
                },
            ));
        }
    }
    Ok(())
}
