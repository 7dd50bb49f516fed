//! Test utilities for orchestration tests.
//!
//! Provides a generator that answers each stage from its own script, reply
//! builders, a store wrapper that fails selected writes, and helpers for
//! seeding an in-memory store.

#![allow(dead_code)]

use async_trait::async_trait;
use odyssey_core::{
    Chapter, ChapterStatus, GenerateRequest, GenerateResponse, MessageType, NarrativeSettings,
    NewChapter, NewStoryMessage, NewStoryParameters, StoryMessage, StoryParameters, Transition,
    World,
};
use odyssey_error::{
    GenerationError, GenerationErrorKind, OdysseyResult, StorageError, StorageErrorKind,
};
use odyssey_interface::{
    ChapterRepository, MessageRepository, StoryParametersRepository, StoryStore, TextGeneration,
    WorldRepository,
};
use odyssey_models::RetryPolicy;
use odyssey_narrative::{InMemoryStoryStore, StoryContext, StoryOrchestrator, TrackedTasks};
use serde_json::json;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Which stage a request came from, judged by its system prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Pacing,
    Narration,
    Initialize,
    Refresh,
}

impl Stage {
    fn of(request: &GenerateRequest) -> Self {
        let system = request
            .messages
            .first()
            .map(|m| m.content.as_str())
            .unwrap_or_default();
        if system.starts_with("You are the narrator") {
            Stage::Narration
        } else if system.starts_with("You are the pacing editor") {
            Stage::Pacing
        } else if system.contains("Plan the story") {
            Stage::Initialize
        } else {
            Stage::Refresh
        }
    }

    fn default_reply(self) -> String {
        match self {
            Stage::Pacing => pacing_reply("Something stirs in the dark.", false),
            Stage::Narration => narration_json("The wind rises.", false),
            Stage::Initialize => roadmap_json(&[
                ("Arrival", "The keeper returns to the drowned city."),
                ("The Flood", "The tide comes in early."),
                ("Lights Out", "The lighthouse goes dark."),
            ]),
            Stage::Refresh => unchanged_refresh_json(),
        }
    }
}

/// A scripted reply: content, or a generation failure.
pub type Reply = Result<String, GenerationErrorKind>;

/// Generator that answers each stage from its own queue, falling back to a
/// valid default once a queue is empty.
#[derive(Default)]
pub struct StageScript {
    queues: Mutex<HashMap<Stage, VecDeque<Reply>>>,
    calls: Mutex<Vec<Stage>>,
}

impl StageScript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, stage: Stage, reply: Reply) -> &Self {
        self.queues
            .lock()
            .unwrap()
            .entry(stage)
            .or_default()
            .push_back(reply);
        self
    }

    pub fn calls(&self) -> Vec<Stage> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, stage: Stage) -> usize {
        self.calls().iter().filter(|s| **s == stage).count()
    }
}

#[async_trait]
impl TextGeneration for StageScript {
    async fn generate(&self, req: &GenerateRequest) -> OdysseyResult<GenerateResponse> {
        let stage = Stage::of(req);
        self.calls.lock().unwrap().push(stage);

        let scripted = self
            .queues
            .lock()
            .unwrap()
            .get_mut(&stage)
            .and_then(|queue| queue.pop_front());

        match scripted.unwrap_or_else(|| Ok(stage.default_reply())) {
            Ok(content) => Ok(GenerateResponse::text(content)),
            Err(kind) => Err(GenerationError::new(kind).into()),
        }
    }

    fn provider_name(&self) -> &str {
        "scripted"
    }

    fn model_name(&self) -> &str {
        "scripted-stages"
    }
}

pub fn pacing_reply(beat: &str, transition: bool) -> String {
    format!(
        "NEXT_BEAT: {}\nTRANSITION: {}\nPHASE: rising",
        beat,
        if transition { "yes" } else { "no" }
    )
}

pub fn narration_json(text: &str, should_transition: bool) -> String {
    json!({
        "text": text,
        "choices": ["Go north", "Wait for dawn", "Light the lamp"],
        "should_transition": should_transition,
    })
    .to_string()
}

pub fn roadmap_json(chapters: &[(&str, &str)]) -> String {
    let chapters: Vec<_> = chapters
        .iter()
        .map(|(title, description)| json!({ "title": title, "description": description }))
        .collect();
    json!({ "chapters": chapters }).to_string()
}

pub fn refresh_json(
    current: (&str, &str),
    future: &[(&str, &str)],
    current_modified: bool,
    future_modified: bool,
) -> String {
    let future: Vec<_> = future
        .iter()
        .map(|(title, description)| json!({ "title": title, "description": description }))
        .collect();
    json!({
        "current": { "title": current.0, "description": current.1 },
        "future": future,
        "modifications": {
            "current_chapter_modified": current_modified,
            "future_chapters_modified": future_modified,
            "new_chapters_added": false,
            "reasoning": "scripted",
        }
    })
    .to_string()
}

pub fn unchanged_refresh_json() -> String {
    json!({
        "current": { "title": "unchanged", "description": "unchanged" },
        "future": [],
        "modifications": {
            "current_chapter_modified": false,
            "future_chapters_modified": false,
            "new_chapters_added": false,
            "reasoning": "nothing to change",
        }
    })
    .to_string()
}

pub fn new_story() -> NewStoryParameters {
    NewStoryParameters {
        theme: "redemption".into(),
        setting: "a drowned city".into(),
        protagonist: "a disgraced lighthouse keeper".into(),
        conflict_sources: "the tide, an old rival".into(),
        emotional_effect: "bittersweet hope".into(),
    }
}

/// Everything a test needs to drive turns.
pub struct Harness {
    pub orchestrator: StoryOrchestrator,
    pub store: Arc<InMemoryStoryStore>,
    pub script: Arc<StageScript>,
    pub tasks: Arc<TrackedTasks>,
}

pub fn harness(script: StageScript) -> Harness {
    harness_with_retry(
        script,
        RetryPolicy {
            max_attempts: 1,
            ..RetryPolicy::default()
        },
    )
}

pub fn harness_with_retry(script: StageScript, retry: RetryPolicy) -> Harness {
    let store = Arc::new(InMemoryStoryStore::new());
    build_harness(script, store.clone(), store, retry)
}

/// A harness whose engine writes through `faulty`; `Harness::store` is the
/// wrapped in-memory store, so assertions see what actually landed.
pub fn harness_with_faults(script: StageScript, faulty: Arc<FaultyStore>) -> Harness {
    let inner = faulty.inner();
    build_harness(
        script,
        faulty,
        inner,
        RetryPolicy {
            max_attempts: 1,
            ..RetryPolicy::default()
        },
    )
}

fn build_harness(
    script: StageScript,
    engine_store: Arc<dyn StoryStore>,
    store: Arc<InMemoryStoryStore>,
    retry: RetryPolicy,
) -> Harness {
    let script = Arc::new(script);
    let tasks = Arc::new(TrackedTasks::new());
    let ctx = StoryContext::new(
        engine_store,
        script.clone(),
        retry,
        tasks.clone(),
        NarrativeSettings::default(),
    );
    Harness {
        orchestrator: StoryOrchestrator::new(Arc::new(ctx)),
        store,
        script,
        tasks,
    }
}

/// Store parameters for a new session without planning any chapters.
pub async fn seed_session(store: &InMemoryStoryStore) -> anyhow::Result<StoryParameters> {
    let session_id = Uuid::new_v4();
    Ok(store
        .create_story_parameters(new_story().into_parameters(session_id))
        .await?)
}

/// Insert a chapter with the given number and state.
pub async fn seed_chapter(
    store: &InMemoryStoryStore,
    session_id: Uuid,
    number: i32,
    status: ChapterStatus,
) -> anyhow::Result<()> {
    store
        .create_chapter(NewChapter {
            session_id,
            number,
            title: format!("Chapter {}", number),
            description: format!("What happens in chapter {}", number),
            status,
        })
        .await?;
    Ok(())
}

/// In-memory store that can be told to fail chapter advances or narrator
/// message writes.
#[derive(Default)]
pub struct FaultyStore {
    inner: Arc<InMemoryStoryStore>,
    fail_advance: AtomicBool,
    fail_narrator_messages: AtomicBool,
}

impl FaultyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inner(&self) -> Arc<InMemoryStoryStore> {
        Arc::clone(&self.inner)
    }

    pub fn fail_advance(&self, fail: bool) {
        self.fail_advance.store(fail, Ordering::SeqCst);
    }

    pub fn fail_narrator_messages(&self, fail: bool) {
        self.fail_narrator_messages.store(fail, Ordering::SeqCst);
    }
}

fn injected(what: &str) -> StorageError {
    StorageError::new(StorageErrorKind::Connection(format!("{} unavailable", what)))
}

#[async_trait]
impl ChapterRepository for FaultyStore {
    async fn create_chapter(&self, chapter: NewChapter) -> OdysseyResult<Chapter> {
        self.inner.create_chapter(chapter).await
    }

    async fn chapters_by_status(
        &self,
        session_id: Uuid,
        status: ChapterStatus,
    ) -> OdysseyResult<Vec<Chapter>> {
        self.inner.chapters_by_status(session_id, status).await
    }

    async fn current_chapter(&self, session_id: Uuid) -> OdysseyResult<Option<Chapter>> {
        self.inner.current_chapter(session_id).await
    }

    async fn update_chapter_status(
        &self,
        chapter_id: Uuid,
        status: ChapterStatus,
    ) -> OdysseyResult<Chapter> {
        self.inner.update_chapter_status(chapter_id, status).await
    }

    async fn advance_chapter(
        &self,
        completed: Uuid,
        promoted: Option<Uuid>,
    ) -> OdysseyResult<Transition> {
        if self.fail_advance.load(Ordering::SeqCst) {
            return Err(injected("chapter advance").into());
        }
        self.inner.advance_chapter(completed, promoted).await
    }

    async fn update_decomposition(
        &self,
        chapter_id: Uuid,
        decomposition: &str,
    ) -> OdysseyResult<Chapter> {
        self.inner.update_decomposition(chapter_id, decomposition).await
    }

    async fn update_title_and_description(
        &self,
        chapter_id: Uuid,
        title: &str,
        description: &str,
    ) -> OdysseyResult<Chapter> {
        self.inner
            .update_title_and_description(chapter_id, title, description)
            .await
    }

    async fn clear_future_chapters(&self, session_id: Uuid) -> OdysseyResult<usize> {
        self.inner.clear_future_chapters(session_id).await
    }
}

#[async_trait]
impl MessageRepository for FaultyStore {
    async fn create_message(&self, message: NewStoryMessage) -> OdysseyResult<StoryMessage> {
        if message.message_type == MessageType::Narrator
            && self.fail_narrator_messages.load(Ordering::SeqCst)
        {
            return Err(injected("narrator message write").into());
        }
        self.inner.create_message(message).await
    }

    async fn recent_messages(
        &self,
        session_id: Uuid,
        limit: usize,
    ) -> OdysseyResult<Vec<StoryMessage>> {
        self.inner.recent_messages(session_id, limit).await
    }

    async fn messages_by_chapter(
        &self,
        session_id: Uuid,
        chapter_number: i32,
    ) -> OdysseyResult<Vec<StoryMessage>> {
        self.inner.messages_by_chapter(session_id, chapter_number).await
    }
}

#[async_trait]
impl StoryParametersRepository for FaultyStore {
    async fn create_story_parameters(
        &self,
        parameters: StoryParameters,
    ) -> OdysseyResult<StoryParameters> {
        self.inner.create_story_parameters(parameters).await
    }

    async fn story_parameters(&self, session_id: Uuid) -> OdysseyResult<Option<StoryParameters>> {
        self.inner.story_parameters(session_id).await
    }
}

#[async_trait]
impl WorldRepository for FaultyStore {
    async fn create_world(&self, world: World) -> OdysseyResult<World> {
        self.inner.create_world(world).await
    }

    async fn world(&self, world_id: Uuid) -> OdysseyResult<Option<World>> {
        self.inner.world(world_id).await
    }

    async fn public_worlds(&self, limit: usize) -> OdysseyResult<Vec<World>> {
        self.inner.public_worlds(limit).await
    }

    async fn demo_worlds(&self, limit: usize) -> OdysseyResult<Vec<World>> {
        self.inner.demo_worlds(limit).await
    }
}
