//! PostgreSQL implementation of the story persistence gateway.

use crate::PgPool;
use crate::models::{
    ChapterRow, NewChapterRow, NewStoryMessageRow, StoryMessageRow, StoryParametersRow, WorldRow,
};
use crate::schema::{chapters, story_messages, story_parameters, worlds};
use async_trait::async_trait;
use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use odyssey_core::{
    Chapter, ChapterStatus, NewChapter, NewStoryMessage, StoryMessage, StoryParameters,
    Transition, World,
};
use odyssey_error::{OdysseyResult, StorageError, StorageErrorKind};
use odyssey_interface::{
    ChapterRepository, MessageRepository, StoryParametersRepository, WorldRepository,
};
use tracing::instrument;
use uuid::Uuid;

/// PostgreSQL-backed story store.
///
/// Diesel is synchronous, so every query runs on tokio's blocking pool with a
/// connection checked out of the r2d2 pool for the duration of the call.
#[derive(Clone)]
pub struct PostgresStoryStore {
    pool: PgPool,
}

impl std::fmt::Debug for PostgresStoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.pool.state();
        f.debug_struct("PostgresStoryStore")
            .field("connections", &state.connections)
            .field("idle_connections", &state.idle_connections)
            .finish()
    }
}

impl PostgresStoryStore {
    /// Create a store over an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn with_conn<T, F>(&self, operation: F) -> OdysseyResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> Result<T, StorageError> + Send + 'static,
    {
        let pool = self.pool.clone();
        let result = tokio::task::spawn_blocking(move || {
            let mut conn = pool
                .get()
                .map_err(|e| StorageError::new(StorageErrorKind::Connection(e.to_string())))?;
            operation(&mut conn)
        })
        .await
        .map_err(|e| {
            StorageError::new(StorageErrorKind::Query(format!(
                "Blocking database task failed: {}",
                e
            )))
        })?;
        Ok(result?)
    }
}

fn into_chapters(rows: Vec<ChapterRow>) -> Result<Vec<Chapter>, StorageError> {
    rows.into_iter().map(Chapter::try_from).collect()
}

#[async_trait]
impl ChapterRepository for PostgresStoryStore {
    #[instrument(skip(self, chapter), fields(session_id = %chapter.session_id, number = chapter.number))]
    async fn create_chapter(&self, chapter: NewChapter) -> OdysseyResult<Chapter> {
        let row = NewChapterRow::from(chapter);
        self.with_conn(move |conn| {
            let stored = diesel::insert_into(chapters::table)
                .values(&row)
                .returning(ChapterRow::as_returning())
                .get_result(conn)?;
            Chapter::try_from(stored)
        })
        .await
    }

    #[instrument(skip(self))]
    async fn chapters_by_status(
        &self,
        session_id: Uuid,
        status: ChapterStatus,
    ) -> OdysseyResult<Vec<Chapter>> {
        self.with_conn(move |conn| {
            let rows = chapters::table
                .filter(chapters::session_id.eq(session_id))
                .filter(chapters::status.eq(status.as_ref()))
                .order(chapters::number.asc())
                .select(ChapterRow::as_select())
                .load(conn)?;
            into_chapters(rows)
        })
        .await
    }

    #[instrument(skip(self))]
    async fn current_chapter(&self, session_id: Uuid) -> OdysseyResult<Option<Chapter>> {
        self.with_conn(move |conn| {
            let row = chapters::table
                .filter(chapters::session_id.eq(session_id))
                .filter(chapters::status.eq(ChapterStatus::Current.as_ref()))
                .select(ChapterRow::as_select())
                .first(conn)
                .optional()?;
            row.map(Chapter::try_from).transpose()
        })
        .await
    }

    #[instrument(skip(self))]
    async fn update_chapter_status(
        &self,
        chapter_id: Uuid,
        status: ChapterStatus,
    ) -> OdysseyResult<Chapter> {
        self.with_conn(move |conn| {
            let row = diesel::update(chapters::table.find(chapter_id))
                .set((
                    chapters::status.eq(status.as_ref()),
                    chapters::updated_at.eq(Utc::now()),
                ))
                .returning(ChapterRow::as_returning())
                .get_result(conn)?;
            Chapter::try_from(row)
        })
        .await
    }

    #[instrument(skip(self))]
    async fn advance_chapter(
        &self,
        completed: Uuid,
        promoted: Option<Uuid>,
    ) -> OdysseyResult<Transition> {
        self.with_conn(move |conn| {
            conn.transaction::<_, StorageError, _>(|conn| {
                let now = Utc::now();
                // The old chapter leaves `current` first so the one-current-per-session
                // index never sees two
                let completed = diesel::update(
                    chapters::table
                        .find(completed)
                        .filter(chapters::status.eq(ChapterStatus::Current.as_ref())),
                )
                .set((
                    chapters::status.eq(ChapterStatus::History.as_ref()),
                    chapters::updated_at.eq(now),
                ))
                .returning(ChapterRow::as_returning())
                .get_result(conn)
                .optional()?
                .ok_or_else(|| {
                    StorageError::new(StorageErrorKind::NotFound(format!(
                        "current chapter {}",
                        completed
                    )))
                })?;

                let promoted = match promoted {
                    Some(id) => {
                        let row = diesel::update(
                            chapters::table
                                .find(id)
                                .filter(chapters::session_id.eq(completed.session_id))
                                .filter(chapters::status.eq(ChapterStatus::Future.as_ref())),
                        )
                        .set((
                            chapters::status.eq(ChapterStatus::Current.as_ref()),
                            chapters::updated_at.eq(now),
                        ))
                        .returning(ChapterRow::as_returning())
                        .get_result(conn)
                        .optional()?
                        .ok_or_else(|| {
                            StorageError::new(StorageErrorKind::DataIntegrity(format!(
                                "chapter {} is not a future chapter of session {}",
                                id, completed.session_id
                            )))
                        })?;
                        Some(Chapter::try_from(row)?)
                    }
                    None => None,
                };

                Ok(Transition {
                    completed: Chapter::try_from(completed)?,
                    promoted,
                })
            })
        })
        .await
    }

    #[instrument(skip(self, decomposition))]
    async fn update_decomposition(
        &self,
        chapter_id: Uuid,
        decomposition: &str,
    ) -> OdysseyResult<Chapter> {
        let decomposition = decomposition.to_string();
        self.with_conn(move |conn| {
            let row = diesel::update(chapters::table.find(chapter_id))
                .set((
                    chapters::decomposition.eq(Some(decomposition)),
                    chapters::updated_at.eq(Utc::now()),
                ))
                .returning(ChapterRow::as_returning())
                .get_result(conn)?;
            Chapter::try_from(row)
        })
        .await
    }

    #[instrument(skip(self, title, description))]
    async fn update_title_and_description(
        &self,
        chapter_id: Uuid,
        title: &str,
        description: &str,
    ) -> OdysseyResult<Chapter> {
        let title = title.to_string();
        let description = description.to_string();
        self.with_conn(move |conn| {
            let row = diesel::update(chapters::table.find(chapter_id))
                .set((
                    chapters::title.eq(title),
                    chapters::description.eq(description),
                    chapters::updated_at.eq(Utc::now()),
                ))
                .returning(ChapterRow::as_returning())
                .get_result(conn)?;
            Chapter::try_from(row)
        })
        .await
    }

    #[instrument(skip(self))]
    async fn clear_future_chapters(&self, session_id: Uuid) -> OdysseyResult<usize> {
        self.with_conn(move |conn| {
            let deleted = diesel::delete(
                chapters::table
                    .filter(chapters::session_id.eq(session_id))
                    .filter(chapters::status.eq(ChapterStatus::Future.as_ref())),
            )
            .execute(conn)?;
            tracing::debug!(deleted, "Cleared future chapters");
            Ok(deleted)
        })
        .await
    }
}

#[async_trait]
impl MessageRepository for PostgresStoryStore {
    #[instrument(skip(self, message), fields(session_id = %message.session_id, message_type = %message.message_type))]
    async fn create_message(&self, message: NewStoryMessage) -> OdysseyResult<StoryMessage> {
        let row = NewStoryMessageRow::from(message);
        self.with_conn(move |conn| {
            let stored = diesel::insert_into(story_messages::table)
                .values(&row)
                .returning(StoryMessageRow::as_returning())
                .get_result(conn)?;
            Ok(StoryMessage::from(stored))
        })
        .await
    }

    #[instrument(skip(self))]
    async fn recent_messages(
        &self,
        session_id: Uuid,
        limit: usize,
    ) -> OdysseyResult<Vec<StoryMessage>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.with_conn(move |conn| {
            let mut rows = story_messages::table
                .filter(story_messages::session_id.eq(session_id))
                .order((story_messages::created_at.desc(), story_messages::seq.desc()))
                .limit(limit)
                .select(StoryMessageRow::as_select())
                .load(conn)?;
            rows.reverse();
            Ok(rows.into_iter().map(StoryMessage::from).collect())
        })
        .await
    }

    #[instrument(skip(self))]
    async fn messages_by_chapter(
        &self,
        session_id: Uuid,
        chapter_number: i32,
    ) -> OdysseyResult<Vec<StoryMessage>> {
        self.with_conn(move |conn| {
            let rows = story_messages::table
                .filter(story_messages::session_id.eq(session_id))
                .filter(story_messages::chapter_number.eq(chapter_number))
                .order((story_messages::created_at.asc(), story_messages::seq.asc()))
                .select(StoryMessageRow::as_select())
                .load(conn)?;
            Ok(rows.into_iter().map(StoryMessage::from).collect())
        })
        .await
    }
}

#[async_trait]
impl StoryParametersRepository for PostgresStoryStore {
    #[instrument(skip(self, parameters), fields(session_id = %parameters.session_id))]
    async fn create_story_parameters(
        &self,
        parameters: StoryParameters,
    ) -> OdysseyResult<StoryParameters> {
        let row = StoryParametersRow::from(parameters);
        self.with_conn(move |conn| {
            let stored = diesel::insert_into(story_parameters::table)
                .values(&row)
                .returning(StoryParametersRow::as_returning())
                .get_result(conn)?;
            Ok(StoryParameters::from(stored))
        })
        .await
    }

    #[instrument(skip(self))]
    async fn story_parameters(&self, session_id: Uuid) -> OdysseyResult<Option<StoryParameters>> {
        self.with_conn(move |conn| {
            let row = story_parameters::table
                .find(session_id)
                .select(StoryParametersRow::as_select())
                .first(conn)
                .optional()?;
            Ok(row.map(StoryParameters::from))
        })
        .await
    }
}

#[async_trait]
impl WorldRepository for PostgresStoryStore {
    #[instrument(skip(self, world), fields(world_id = %world.id))]
    async fn create_world(&self, world: World) -> OdysseyResult<World> {
        let row = WorldRow::from(world);
        self.with_conn(move |conn| {
            let stored = diesel::insert_into(worlds::table)
                .values(&row)
                .returning(WorldRow::as_returning())
                .get_result(conn)?;
            Ok(World::from(stored))
        })
        .await
    }

    #[instrument(skip(self))]
    async fn world(&self, world_id: Uuid) -> OdysseyResult<Option<World>> {
        self.with_conn(move |conn| {
            let row = worlds::table
                .find(world_id)
                .select(WorldRow::as_select())
                .first(conn)
                .optional()?;
            Ok(row.map(World::from))
        })
        .await
    }

    #[instrument(skip(self))]
    async fn public_worlds(&self, limit: usize) -> OdysseyResult<Vec<World>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.with_conn(move |conn| {
            let rows = worlds::table
                .filter(worlds::public.eq(true))
                .order(worlds::created_at.desc())
                .limit(limit)
                .select(WorldRow::as_select())
                .load(conn)?;
            Ok(rows.into_iter().map(World::from).collect())
        })
        .await
    }

    #[instrument(skip(self))]
    async fn demo_worlds(&self, limit: usize) -> OdysseyResult<Vec<World>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.with_conn(move |conn| {
            let rows = worlds::table
                .filter(worlds::public.eq(true))
                .filter(worlds::demo.eq(true))
                .order(worlds::created_at.desc())
                .limit(limit)
                .select(WorldRow::as_select())
                .load(conn)?;
            Ok(rows.into_iter().map(World::from).collect())
        })
        .await
    }
}
