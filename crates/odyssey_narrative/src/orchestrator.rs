//! Turn orchestration: pacing, narration, then deferred persistence and planning.

use crate::deferred::DeferredTasks;
use crate::lifecycle::ChapterLifecycle;
use crate::narrator::{NarrationInput, Narrator};
use crate::optimizer::{Optimizer, PacingInput};
use crate::predictor::{Predictor, RefreshContext, RoadmapRefresh};
use futures::FutureExt;
use odyssey_core::{
    Chapter, ChapterSet, ChapterStatus, NarrationOutput, NarrativeSettings, NewStoryMessage,
    NewStoryParameters, NewWorld, PacingDirective, StoryMessage, StoryParameters, World,
};
use odyssey_error::{LifecycleError, LifecycleErrorKind, OdysseyResult, ValidationError};
use odyssey_interface::{StoryStore, TextGeneration};
use odyssey_models::{RetryPolicy, RetryingGenerator};
use serde::Serialize;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

/// Most worlds a catalog listing returns.
pub const WORLD_LISTING_LIMIT: usize = 20;

/// Most demo worlds a listing returns.
pub const DEMO_LISTING_LIMIT: usize = 10;

/// Everything a turn needs, built once per process and shared by `Arc`.
#[derive(derive_getters::Getters)]
pub struct StoryContext {
    /// Persistence gateway
    store: Arc<dyn StoryStore>,
    /// Retry-wrapped text generator shared by every stage
    generator: Arc<dyn TextGeneration>,
    /// Runner for post-response work
    tasks: Arc<dyn DeferredTasks>,
    /// Turn settings
    settings: NarrativeSettings,
    /// Chapter lifecycle manager
    lifecycle: ChapterLifecycle,
    /// Pacing stage
    optimizer: Optimizer,
    /// Narration stage
    narrator: Narrator,
    /// Forward-planning stage
    predictor: Predictor,
}

impl std::fmt::Debug for StoryContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoryContext")
            .field("provider", &self.generator.provider_name())
            .field("model", &self.generator.model_name())
            .field("guarantee", &self.tasks.guarantee())
            .field("settings", &self.settings)
            .finish()
    }
}

impl StoryContext {
    /// Build the context, wrapping the generator with the retry policy.
    pub fn new(
        store: Arc<dyn StoryStore>,
        generator: Arc<dyn TextGeneration>,
        retry: RetryPolicy,
        tasks: Arc<dyn DeferredTasks>,
        settings: NarrativeSettings,
    ) -> Self {
        let generator: Arc<dyn TextGeneration> = Arc::new(RetryingGenerator::new(generator, retry));
        tracing::info!(
            provider = generator.provider_name(),
            model = generator.model_name(),
            guarantee = ?tasks.guarantee(),
            "Story context ready"
        );
        Self {
            lifecycle: ChapterLifecycle::new(Arc::clone(&store)),
            optimizer: Optimizer::new(Arc::clone(&generator), settings.optimizer),
            narrator: Narrator::new(Arc::clone(&generator), settings.narrator),
            predictor: Predictor::new(Arc::clone(&generator), settings.predictor),
            store,
            generator,
            tasks,
            settings,
        }
    }
}

/// Result of one player turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TurnOutcome {
    /// User-visible text: narration followed by the numbered choices
    pub response: String,
    /// Structured narration
    pub narration: NarrationOutput,
    /// Pacing advice the narrator received
    pub directive: PacingDirective,
    /// Chapter the turn was narrated in
    pub chapter_number: i32,
}

/// Result of starting a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionOpening {
    /// The new session
    pub session_id: Uuid,
    /// User-visible opening text
    pub response: String,
    /// Structured opening narration
    pub opening: NarrationOutput,
    /// Chapter 1
    pub current_chapter: Chapter,
    /// The planned roadmap
    pub future_chapters: Vec<Chapter>,
}

/// Owned snapshot of a turn, handed to the deferred tail.
#[derive(Debug, Clone)]
struct TurnCommit {
    session_id: Uuid,
    params: StoryParameters,
    chapter: Chapter,
    recent: Vec<StoryMessage>,
    user_input: String,
    directive: PacingDirective,
    narration: NarrationOutput,
}

/// Runs player turns against a shared [`StoryContext`].
#[derive(Debug, Clone)]
pub struct StoryOrchestrator {
    ctx: Arc<StoryContext>,
}

impl StoryOrchestrator {
    /// Create an orchestrator over a context.
    pub fn new(ctx: Arc<StoryContext>) -> Self {
        Self { ctx }
    }

    /// The shared context.
    pub fn context(&self) -> &Arc<StoryContext> {
        &self.ctx
    }

    /// Run one player turn.
    ///
    /// Pacing and narration run in sequence on the caller's path; persisting
    /// the turn, refreshing the roadmap and any chapter transition happen
    /// afterwards as deferred work, so no write delays the response.
    ///
    /// # Errors
    ///
    /// - [`ValidationError`] for an empty or oversized message
    /// - `LifecycleError` for an unknown, uninitialized or finished session
    /// - generation, extraction and storage errors from the stages
    #[instrument(skip(self, message), fields(chars = message.chars().count()))]
    pub async fn interact(&self, session_id: Uuid, message: &str) -> OdysseyResult<TurnOutcome> {
        let user_input = self.validate_message(message)?;
        let ctx = &self.ctx;

        let (current, params) = tokio::try_join!(
            ctx.store.current_chapter(session_id),
            ctx.store.story_parameters(session_id),
        )?;
        let params = params.ok_or_else(|| {
            LifecycleError::new(LifecycleErrorKind::UnknownSession(session_id.to_string()))
        })?;
        let chapter = match current {
            Some(chapter) => chapter,
            None => return Err(self.no_current_chapter(session_id).await),
        };

        let (recent, history) = tokio::try_join!(
            ctx.store
                .recent_messages(session_id, ctx.settings.recent_window),
            ctx.store.messages_by_chapter(session_id, chapter.number),
        )?;

        let directive = ctx
            .optimizer
            .direct(PacingInput {
                params: &params,
                chapter: &chapter,
                recent: &recent,
                user_input: &user_input,
            })
            .await?;

        let narration = ctx
            .narrator
            .narrate(NarrationInput {
                params: &params,
                chapter: &chapter,
                directive: Some(&directive),
                history: &history,
                user_input: &user_input,
            })
            .await?;

        let response = narration.render();
        let chapter_number = chapter.number;

        let commit = TurnCommit {
            session_id,
            params,
            chapter,
            recent,
            user_input,
            directive: directive.clone(),
            narration: narration.clone(),
        };
        let tail_ctx = Arc::clone(&self.ctx);
        ctx.tasks
            .defer("commit_turn", commit_turn(tail_ctx, commit).boxed());

        Ok(TurnOutcome {
            response,
            narration,
            directive,
            chapter_number,
        })
    }

    /// Create a session: store its parameters, plan the roadmap and narrate
    /// the opening of chapter 1.
    #[instrument(skip_all, fields(theme = %input.theme))]
    pub async fn start_session(&self, input: NewStoryParameters) -> OdysseyResult<SessionOpening> {
        validate_story(&input)?;

        let ctx = &self.ctx;
        let session_id = Uuid::new_v4();
        let params = ctx
            .store
            .create_story_parameters(input.into_parameters(session_id))
            .await?;

        let roadmap = ctx.predictor.initialize(&params).await?;
        let installed = ctx.lifecycle.install_roadmap(session_id, roadmap).await?;

        let opening = ctx.narrator.open(&params, &installed.current).await?;
        let response = opening.render();
        ctx.store
            .create_message(NewStoryMessage::narrator(
                session_id,
                installed.current.number,
                response.clone(),
            ))
            .await?;

        tracing::info!(
            session_id = %session_id,
            chapters = installed.future.len() + 1,
            "Session started"
        );
        Ok(SessionOpening {
            session_id,
            response,
            opening,
            current_chapter: installed.current,
            future_chapters: installed.future,
        })
    }

    /// Start a session from a stored world's parameters.
    ///
    /// Private worlds can be played by id; they are only left out of listings.
    #[instrument(skip(self))]
    pub async fn start_session_from_world(&self, world_id: Uuid) -> OdysseyResult<SessionOpening> {
        let world = self.ctx.store.world(world_id).await?.ok_or_else(|| {
            LifecycleError::new(LifecycleErrorKind::UnknownWorld(world_id.to_string()))
        })?;
        tracing::debug!(title = %world.title, "Starting session from world");
        self.start_session(world.story_parameters()).await
    }

    /// Publish a world to the catalog.
    #[instrument(skip_all, fields(title = %input.title))]
    pub async fn create_world(&self, input: NewWorld) -> OdysseyResult<World> {
        validate_story(&input.story)?;
        if input.title.trim().is_empty() {
            return Err(ValidationError::new("title must not be empty").into());
        }
        let world = self.ctx.store.create_world(input.into_world()).await?;
        tracing::info!(world_id = %world.id, demo = world.demo, "World created");
        Ok(world)
    }

    /// Public worlds, newest first.
    pub async fn worlds(&self) -> OdysseyResult<Vec<World>> {
        self.ctx.store.public_worlds(WORLD_LISTING_LIMIT).await
    }

    /// Public demo worlds, newest first.
    pub async fn demo_worlds(&self) -> OdysseyResult<Vec<World>> {
        self.ctx.store.demo_worlds(DEMO_LISTING_LIMIT).await
    }

    /// Every chapter of a known session.
    #[instrument(skip(self))]
    pub async fn chapters(&self, session_id: Uuid) -> OdysseyResult<ChapterSet> {
        if self.ctx.store.story_parameters(session_id).await?.is_none() {
            return Err(
                LifecycleError::new(LifecycleErrorKind::UnknownSession(session_id.to_string()))
                    .into(),
            );
        }
        self.ctx.lifecycle.all(session_id).await
    }

    fn validate_message(&self, message: &str) -> OdysseyResult<String> {
        let trimmed = message.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::new("message must not be empty").into());
        }
        let limit = self.ctx.settings.max_input_chars;
        let length = trimmed.chars().count();
        if length > limit {
            return Err(ValidationError::new(format!(
                "message is {} characters; the limit is {}",
                length, limit
            ))
            .into());
        }
        Ok(trimmed.to_string())
    }

    async fn no_current_chapter(&self, session_id: Uuid) -> odyssey_error::OdysseyError {
        let history = match self
            .ctx
            .store
            .chapters_by_status(session_id, ChapterStatus::History)
            .await
        {
            Ok(history) => history,
            Err(e) => return e,
        };
        let kind = if history.is_empty() {
            LifecycleErrorKind::NotInitialized(session_id.to_string())
        } else {
            LifecycleErrorKind::StoryExhausted(session_id.to_string())
        };
        LifecycleError::new(kind).into()
    }
}

fn validate_story(input: &NewStoryParameters) -> OdysseyResult<()> {
    if input.theme.trim().is_empty() {
        return Err(ValidationError::new("theme must not be empty").into());
    }
    if input.setting.trim().is_empty() {
        return Err(ValidationError::new("setting must not be empty").into());
    }
    Ok(())
}

/// Deferred tail of a turn, in strict order: persist both messages, record
/// the narrated beat, refresh the roadmap, then transition if flagged.
///
/// Persistence failures abort the tail, so a chapter boundary is never
/// recorded without the turn that caused it. A failed refresh only costs the
/// roadmap update.
#[instrument(skip_all, fields(session_id = %commit.session_id, chapter = commit.chapter.number))]
async fn commit_turn(ctx: Arc<StoryContext>, commit: TurnCommit) -> OdysseyResult<()> {
    let session_id = commit.session_id;
    let number = commit.chapter.number;
    let narrator_text = commit.narration.render();

    ctx.store
        .create_message(NewStoryMessage::user(
            session_id,
            number,
            commit.user_input.clone(),
        ))
        .await?;
    ctx.store
        .create_message(NewStoryMessage::narrator(
            session_id,
            number,
            narrator_text.clone(),
        ))
        .await?;

    let chapters = ctx.lifecycle.all(session_id).await?;

    // Another turn's tail may have recorded a beat since the snapshot was taken
    let latest = chapters
        .current
        .as_ref()
        .filter(|c| c.id == commit.chapter.id)
        .unwrap_or(&commit.chapter);
    ctx.store
        .update_decomposition(
            commit.chapter.id,
            &latest.with_beat(&commit.directive.beat_description),
        )
        .await?;

    let transition_pending = *commit.narration.should_transition();
    let refreshed = ctx
        .predictor
        .refresh(RefreshContext {
            params: &commit.params,
            history: &chapters.history,
            current: &commit.chapter,
            future: &chapters.future,
            recent: &commit.recent,
            user_input: &commit.user_input,
            narrator_output: &narrator_text,
            transition_pending,
        })
        .await;

    match refreshed {
        Ok(refresh) => apply_refresh(&ctx, &commit.chapter, refresh).await?,
        Err(e) => tracing::error!(error = %e, "Roadmap refresh failed, keeping current plan"),
    }

    if transition_pending {
        ctx.lifecycle.transition(session_id).await?;
    }
    Ok(())
}

async fn apply_refresh(
    ctx: &StoryContext,
    current: &Chapter,
    refresh: RoadmapRefresh,
) -> OdysseyResult<()> {
    let modifications = &refresh.modifications;

    if modifications.current_chapter_modified
        && (refresh.current.title != current.title
            || refresh.current.description != current.description)
    {
        ctx.store
            .update_title_and_description(
                current.id,
                &refresh.current.title,
                &refresh.current.description,
            )
            .await?;
        tracing::debug!(chapter = current.number, "Current chapter refined");
    }

    if modifications.touches_future() {
        let replaced = ctx
            .lifecycle
            .replace_future_chapters(current.session_id, refresh.future)
            .await?;
        tracing::debug!(future = replaced.len(), "Future chapters replaced");
    }
    Ok(())
}
