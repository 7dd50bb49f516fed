//! Persistence gateway for chapters, messages, story parameters and worlds.
//!
//! Implementations can use a relational database or in-memory structures.
//! Every method is async so database drivers can run off the request path.

use async_trait::async_trait;
use odyssey_core::{
    Chapter, ChapterStatus, NewChapter, NewStoryMessage, StoryMessage, StoryParameters,
    Transition, World,
};
use odyssey_error::OdysseyResult;
use uuid::Uuid;

/// Chapter records.
#[async_trait]
pub trait ChapterRepository: Send + Sync {
    /// Insert a chapter and return the stored record.
    async fn create_chapter(&self, chapter: NewChapter) -> OdysseyResult<Chapter>;

    /// Chapters of a session in the given state, ascending by number.
    async fn chapters_by_status(
        &self,
        session_id: Uuid,
        status: ChapterStatus,
    ) -> OdysseyResult<Vec<Chapter>>;

    /// The session's current chapter, if any.
    async fn current_chapter(&self, session_id: Uuid) -> OdysseyResult<Option<Chapter>>;

    /// Move a chapter to a new lifecycle state.
    async fn update_chapter_status(
        &self,
        chapter_id: Uuid,
        status: ChapterStatus,
    ) -> OdysseyResult<Chapter>;

    /// Move `completed` to history and `promoted`, if any, to current.
    ///
    /// Both changes are stored together or not at all, so a failure never
    /// leaves a session without a current chapter while future ones remain.
    async fn advance_chapter(
        &self,
        completed: Uuid,
        promoted: Option<Uuid>,
    ) -> OdysseyResult<Transition>;

    /// Replace a chapter's beat breakdown.
    async fn update_decomposition(
        &self,
        chapter_id: Uuid,
        decomposition: &str,
    ) -> OdysseyResult<Chapter>;

    /// Refine a chapter's title and description.
    async fn update_title_and_description(
        &self,
        chapter_id: Uuid,
        title: &str,
        description: &str,
    ) -> OdysseyResult<Chapter>;

    /// Delete every future chapter of a session, returning how many were removed.
    async fn clear_future_chapters(&self, session_id: Uuid) -> OdysseyResult<usize>;
}

/// Turn messages.
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Insert a message and return the stored record.
    async fn create_message(&self, message: NewStoryMessage) -> OdysseyResult<StoryMessage>;

    /// The newest `limit` messages of a session, oldest first.
    async fn recent_messages(&self, session_id: Uuid, limit: usize)
    -> OdysseyResult<Vec<StoryMessage>>;

    /// All messages recorded while the given chapter was current, oldest first.
    async fn messages_by_chapter(
        &self,
        session_id: Uuid,
        chapter_number: i32,
    ) -> OdysseyResult<Vec<StoryMessage>>;
}

/// Per-session story parameters.
#[async_trait]
pub trait StoryParametersRepository: Send + Sync {
    /// Store the parameters of a new session.
    async fn create_story_parameters(
        &self,
        parameters: StoryParameters,
    ) -> OdysseyResult<StoryParameters>;

    /// Parameters of a session, or `None` for an unknown session.
    async fn story_parameters(&self, session_id: Uuid) -> OdysseyResult<Option<StoryParameters>>;
}

/// The world catalog.
#[async_trait]
pub trait WorldRepository: Send + Sync {
    /// Store a new world.
    async fn create_world(&self, world: World) -> OdysseyResult<World>;

    /// A world by id, public or not.
    async fn world(&self, world_id: Uuid) -> OdysseyResult<Option<World>>;

    /// Public worlds, newest first.
    async fn public_worlds(&self, limit: usize) -> OdysseyResult<Vec<World>>;

    /// Public demo worlds, newest first.
    async fn demo_worlds(&self, limit: usize) -> OdysseyResult<Vec<World>>;
}

/// Everything the orchestrator persists.
pub trait StoryStore:
    ChapterRepository + MessageRepository + StoryParametersRepository + WorldRepository
{
}

impl<T> StoryStore for T where
    T: ChapterRepository + MessageRepository + StoryParametersRepository + WorldRepository
{
}
