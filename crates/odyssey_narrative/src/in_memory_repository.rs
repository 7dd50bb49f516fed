//! In-memory implementation of the story store.
//!
//! Backs the `memory` storage mode and the test suites. All data is lost when
//! the store is dropped.

use async_trait::async_trait;
use chrono::Utc;
use odyssey_core::{
    Chapter, ChapterStatus, NewChapter, NewStoryMessage, StoryMessage, StoryParameters,
    Transition, World,
};
use odyssey_error::{OdysseyResult, StorageError, StorageErrorKind};
use odyssey_interface::{
    ChapterRepository, MessageRepository, StoryParametersRepository, WorldRepository,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Default)]
struct Tables {
    parameters: HashMap<Uuid, StoryParameters>,
    chapters: Vec<Chapter>,
    // Insertion order is creation order
    messages: Vec<StoryMessage>,
    worlds: Vec<World>,
}

/// In-memory story store.
///
/// # Example
/// ```
/// use odyssey_interface::StoryParametersRepository;
/// use odyssey_narrative::InMemoryStoryStore;
///
/// #[tokio::main]
/// async fn main() {
///     let store = InMemoryStoryStore::new();
///     let params = store.story_parameters(uuid::Uuid::new_v4()).await.unwrap();
///     assert!(params.is_none());
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryStoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a message exactly as given, bypassing type checks (for testing).
    pub async fn insert_raw_message(&self, message: StoryMessage) {
        self.tables.write().await.messages.push(message);
    }

    /// Number of stored messages for a session (for testing).
    pub async fn message_count(&self, session_id: Uuid) -> usize {
        self.tables
            .read()
            .await
            .messages
            .iter()
            .filter(|m| m.session_id == session_id)
            .count()
    }
}

fn not_found(what: &str, id: Uuid) -> StorageError {
    StorageError::new(StorageErrorKind::NotFound(format!("{} {}", what, id)))
}

#[async_trait]
impl ChapterRepository for InMemoryStoryStore {
    async fn create_chapter(&self, chapter: NewChapter) -> OdysseyResult<Chapter> {
        let mut tables = self.tables.write().await;
        if tables
            .chapters
            .iter()
            .any(|c| c.session_id == chapter.session_id && c.number == chapter.number)
        {
            return Err(StorageError::new(StorageErrorKind::Query(format!(
                "chapter {} already exists for session {}",
                chapter.number, chapter.session_id
            )))
            .into());
        }

        let stored = Chapter {
            id: Uuid::new_v4(),
            session_id: chapter.session_id,
            number: chapter.number,
            title: chapter.title,
            description: chapter.description,
            status: chapter.status,
            decomposition: None,
        };
        tables.chapters.push(stored.clone());
        Ok(stored)
    }

    async fn chapters_by_status(
        &self,
        session_id: Uuid,
        status: ChapterStatus,
    ) -> OdysseyResult<Vec<Chapter>> {
        let tables = self.tables.read().await;
        let mut chapters: Vec<Chapter> = tables
            .chapters
            .iter()
            .filter(|c| c.session_id == session_id && c.status == status)
            .cloned()
            .collect();
        chapters.sort_by_key(|c| c.number);
        Ok(chapters)
    }

    async fn current_chapter(&self, session_id: Uuid) -> OdysseyResult<Option<Chapter>> {
        let tables = self.tables.read().await;
        Ok(tables
            .chapters
            .iter()
            .find(|c| c.session_id == session_id && c.status == ChapterStatus::Current)
            .cloned())
    }

    async fn update_chapter_status(
        &self,
        chapter_id: Uuid,
        status: ChapterStatus,
    ) -> OdysseyResult<Chapter> {
        let mut tables = self.tables.write().await;
        let chapter = tables
            .chapters
            .iter_mut()
            .find(|c| c.id == chapter_id)
            .ok_or_else(|| not_found("chapter", chapter_id))?;
        chapter.status = status;
        Ok(chapter.clone())
    }

    async fn advance_chapter(
        &self,
        completed: Uuid,
        promoted: Option<Uuid>,
    ) -> OdysseyResult<Transition> {
        let mut tables = self.tables.write().await;

        // Check both chapters before touching either
        let completed_at = tables
            .chapters
            .iter()
            .position(|c| c.id == completed && c.status == ChapterStatus::Current)
            .ok_or_else(|| not_found("current chapter", completed))?;
        let promoted_at = match promoted {
            Some(id) => {
                let position = tables
                    .chapters
                    .iter()
                    .position(|c| c.id == id)
                    .ok_or_else(|| not_found("chapter", id))?;
                let (from, to) = (&tables.chapters[completed_at], &tables.chapters[position]);
                if to.session_id != from.session_id || to.status != ChapterStatus::Future {
                    return Err(StorageError::new(StorageErrorKind::DataIntegrity(format!(
                        "chapter {} is not a future chapter of session {}",
                        to.number, from.session_id
                    )))
                    .into());
                }
                Some(position)
            }
            None => None,
        };

        tables.chapters[completed_at].status = ChapterStatus::History;
        let completed = tables.chapters[completed_at].clone();
        let promoted = promoted_at.map(|position| {
            tables.chapters[position].status = ChapterStatus::Current;
            tables.chapters[position].clone()
        });
        Ok(Transition {
            completed,
            promoted,
        })
    }

    async fn update_decomposition(
        &self,
        chapter_id: Uuid,
        decomposition: &str,
    ) -> OdysseyResult<Chapter> {
        let mut tables = self.tables.write().await;
        let chapter = tables
            .chapters
            .iter_mut()
            .find(|c| c.id == chapter_id)
            .ok_or_else(|| not_found("chapter", chapter_id))?;
        chapter.decomposition = Some(decomposition.to_string());
        Ok(chapter.clone())
    }

    async fn update_title_and_description(
        &self,
        chapter_id: Uuid,
        title: &str,
        description: &str,
    ) -> OdysseyResult<Chapter> {
        let mut tables = self.tables.write().await;
        let chapter = tables
            .chapters
            .iter_mut()
            .find(|c| c.id == chapter_id)
            .ok_or_else(|| not_found("chapter", chapter_id))?;
        chapter.title = title.to_string();
        chapter.description = description.to_string();
        Ok(chapter.clone())
    }

    async fn clear_future_chapters(&self, session_id: Uuid) -> OdysseyResult<usize> {
        let mut tables = self.tables.write().await;
        let before = tables.chapters.len();
        tables
            .chapters
            .retain(|c| !(c.session_id == session_id && c.status == ChapterStatus::Future));
        Ok(before - tables.chapters.len())
    }
}

#[async_trait]
impl MessageRepository for InMemoryStoryStore {
    async fn create_message(&self, message: NewStoryMessage) -> OdysseyResult<StoryMessage> {
        let stored = StoryMessage {
            id: Uuid::new_v4(),
            session_id: message.session_id,
            chapter_number: message.chapter_number,
            message_type: message.message_type.to_string(),
            content: message.content,
            created_at: Utc::now(),
        };
        self.tables.write().await.messages.push(stored.clone());
        Ok(stored)
    }

    async fn recent_messages(
        &self,
        session_id: Uuid,
        limit: usize,
    ) -> OdysseyResult<Vec<StoryMessage>> {
        let tables = self.tables.read().await;
        let session: Vec<&StoryMessage> = tables
            .messages
            .iter()
            .filter(|m| m.session_id == session_id)
            .collect();
        let skip = session.len().saturating_sub(limit);
        Ok(session.into_iter().skip(skip).cloned().collect())
    }

    async fn messages_by_chapter(
        &self,
        session_id: Uuid,
        chapter_number: i32,
    ) -> OdysseyResult<Vec<StoryMessage>> {
        let tables = self.tables.read().await;
        Ok(tables
            .messages
            .iter()
            .filter(|m| m.session_id == session_id && m.chapter_number == chapter_number)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl StoryParametersRepository for InMemoryStoryStore {
    async fn create_story_parameters(
        &self,
        parameters: StoryParameters,
    ) -> OdysseyResult<StoryParameters> {
        let mut tables = self.tables.write().await;
        if tables.parameters.contains_key(&parameters.session_id) {
            return Err(StorageError::new(StorageErrorKind::Query(format!(
                "story parameters already exist for session {}",
                parameters.session_id
            )))
            .into());
        }
        tables
            .parameters
            .insert(parameters.session_id, parameters.clone());
        Ok(parameters)
    }

    async fn story_parameters(&self, session_id: Uuid) -> OdysseyResult<Option<StoryParameters>> {
        Ok(self.tables.read().await.parameters.get(&session_id).cloned())
    }
}

#[async_trait]
impl WorldRepository for InMemoryStoryStore {
    async fn create_world(&self, world: World) -> OdysseyResult<World> {
        let mut tables = self.tables.write().await;
        if tables.worlds.iter().any(|w| w.id == world.id) {
            return Err(StorageError::new(StorageErrorKind::Query(format!(
                "world {} already exists",
                world.id
            )))
            .into());
        }
        tables.worlds.push(world.clone());
        Ok(world)
    }

    async fn world(&self, world_id: Uuid) -> OdysseyResult<Option<World>> {
        let tables = self.tables.read().await;
        Ok(tables.worlds.iter().find(|w| w.id == world_id).cloned())
    }

    async fn public_worlds(&self, limit: usize) -> OdysseyResult<Vec<World>> {
        let tables = self.tables.read().await;
        Ok(tables
            .worlds
            .iter()
            .rev()
            .filter(|w| w.public)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn demo_worlds(&self, limit: usize) -> OdysseyResult<Vec<World>> {
        let tables = self.tables.read().await;
        Ok(tables
            .worlds
            .iter()
            .rev()
            .filter(|w| w.public && w.demo)
            .take(limit)
            .cloned()
            .collect())
    }
}
