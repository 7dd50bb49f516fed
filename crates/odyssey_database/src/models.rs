//! Diesel models for the story tables.

use crate::schema::{chapters, story_messages, story_parameters, worlds};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use odyssey_core::{
    Chapter, ChapterStatus, NewChapter, NewStoryMessage, NewStoryParameters, StoryMessage,
    StoryParameters, World,
};
use odyssey_error::{StorageError, StorageErrorKind};
use std::str::FromStr;
use uuid::Uuid;

/// Database row for the chapters table.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = chapters)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ChapterRow {
    pub id: Uuid,
    pub session_id: Uuid,
    pub number: i32,
    pub title: String,
    pub description: String,
    pub status: String,
    pub decomposition: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insertable struct for the chapters table.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = chapters)]
pub struct NewChapterRow {
    pub id: Uuid,
    pub session_id: Uuid,
    pub number: i32,
    pub title: String,
    pub description: String,
    pub status: String,
}

impl From<NewChapter> for NewChapterRow {
    fn from(chapter: NewChapter) -> Self {
        Self {
            id: Uuid::new_v4(),
            session_id: chapter.session_id,
            number: chapter.number,
            title: chapter.title,
            description: chapter.description,
            status: chapter.status.to_string(),
        }
    }
}

impl TryFrom<ChapterRow> for Chapter {
    type Error = StorageError;

    fn try_from(row: ChapterRow) -> Result<Self, Self::Error> {
        let status = ChapterStatus::from_str(&row.status).map_err(|_| {
            StorageError::new(StorageErrorKind::DataIntegrity(format!(
                "chapter {} has unknown status '{}'",
                row.id, row.status
            )))
        })?;

        Ok(Chapter {
            id: row.id,
            session_id: row.session_id,
            number: row.number,
            title: row.title,
            description: row.description,
            status,
            decomposition: row.decomposition,
        })
    }
}

/// Database row for the story_messages table.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = story_messages)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct StoryMessageRow {
    pub id: Uuid,
    pub seq: i64,
    pub session_id: Uuid,
    pub chapter_number: i32,
    pub message_type: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for the story_messages table.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = story_messages)]
pub struct NewStoryMessageRow {
    pub id: Uuid,
    pub session_id: Uuid,
    pub chapter_number: i32,
    pub message_type: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl From<NewStoryMessage> for NewStoryMessageRow {
    fn from(message: NewStoryMessage) -> Self {
        Self {
            id: Uuid::new_v4(),
            session_id: message.session_id,
            chapter_number: message.chapter_number,
            message_type: message.message_type.to_string(),
            content: message.content,
            created_at: Utc::now(),
        }
    }
}

// Message types stay raw text here; the transcript builder validates them.
impl From<StoryMessageRow> for StoryMessage {
    fn from(row: StoryMessageRow) -> Self {
        StoryMessage {
            id: row.id,
            session_id: row.session_id,
            chapter_number: row.chapter_number,
            message_type: row.message_type,
            content: row.content,
            created_at: row.created_at,
        }
    }
}

/// Database row for the story_parameters table.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = story_parameters)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct StoryParametersRow {
    pub session_id: Uuid,
    pub theme: String,
    pub setting: String,
    pub protagonist: String,
    pub conflict_sources: String,
    pub emotional_effect: String,
    pub created_at: DateTime<Utc>,
}

impl From<StoryParameters> for StoryParametersRow {
    fn from(p: StoryParameters) -> Self {
        Self {
            session_id: p.session_id,
            theme: p.theme,
            setting: p.setting,
            protagonist: p.protagonist,
            conflict_sources: p.conflict_sources,
            emotional_effect: p.emotional_effect,
            created_at: p.created_at,
        }
    }
}

impl From<StoryParametersRow> for StoryParameters {
    fn from(row: StoryParametersRow) -> Self {
        StoryParameters {
            session_id: row.session_id,
            theme: row.theme,
            setting: row.setting,
            protagonist: row.protagonist,
            conflict_sources: row.conflict_sources,
            emotional_effect: row.emotional_effect,
            created_at: row.created_at,
        }
    }
}

/// Database row for the worlds table.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = worlds)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct WorldRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub genre: String,
    pub theme: String,
    pub setting: String,
    pub protagonist: String,
    pub conflict_sources: String,
    pub emotional_effect: String,
    pub public: bool,
    pub demo: bool,
    pub preview_content: String,
    pub created_at: DateTime<Utc>,
}

impl From<World> for WorldRow {
    fn from(w: World) -> Self {
        Self {
            id: w.id,
            title: w.title,
            description: w.description,
            genre: w.genre,
            theme: w.story.theme,
            setting: w.story.setting,
            protagonist: w.story.protagonist,
            conflict_sources: w.story.conflict_sources,
            emotional_effect: w.story.emotional_effect,
            public: w.public,
            demo: w.demo,
            preview_content: w.preview_content,
            created_at: w.created_at,
        }
    }
}

impl From<WorldRow> for World {
    fn from(row: WorldRow) -> Self {
        World {
            id: row.id,
            title: row.title,
            description: row.description,
            genre: row.genre,
            story: NewStoryParameters {
                theme: row.theme,
                setting: row.setting,
                protagonist: row.protagonist,
                conflict_sources: row.conflict_sources,
                emotional_effect: row.emotional_effect,
            },
            public: row.public,
            demo: row.demo,
            preview_content: row.preview_content,
            created_at: row.created_at,
        }
    }
}
