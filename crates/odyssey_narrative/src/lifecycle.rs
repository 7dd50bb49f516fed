//! Chapter lifecycle: history, current and future chapters of a session.

use crate::InitialRoadmap;
use odyssey_core::{Chapter, ChapterSet, ChapterStatus, PlannedChapter, Transition};
use odyssey_error::{
    LifecycleError, LifecycleErrorKind, OdysseyResult, StorageError, StorageErrorKind,
};
use odyssey_interface::StoryStore;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

/// Chapters installed from an initial roadmap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledRoadmap {
    /// Chapter 1, now current
    pub current: Chapter,
    /// The planned chapters, numbered from 2
    pub future: Vec<Chapter>,
}

/// Walks chapters through `future` → `current` → `history`.
///
/// Persistence failures propagate unchanged.
#[derive(Clone)]
pub struct ChapterLifecycle {
    store: Arc<dyn StoryStore>,
}

fn chapter_number(position: usize) -> Result<i32, StorageError> {
    i32::try_from(position).map_err(|_| {
        StorageError::new(StorageErrorKind::DataIntegrity(format!(
            "chapter number {} out of range",
            position
        )))
    })
}

impl ChapterLifecycle {
    /// Create a lifecycle manager over a store.
    pub fn new(store: Arc<dyn StoryStore>) -> Self {
        Self { store }
    }

    /// The session's current chapter, if any.
    pub async fn current(&self, session_id: Uuid) -> OdysseyResult<Option<Chapter>> {
        self.store.current_chapter(session_id).await
    }

    /// Every chapter of the session, grouped by state.
    ///
    /// The three reads run concurrently and are not wrapped in a transaction.
    #[instrument(skip(self))]
    pub async fn all(&self, session_id: Uuid) -> OdysseyResult<ChapterSet> {
        let (history, current, future) = tokio::try_join!(
            self.store
                .chapters_by_status(session_id, ChapterStatus::History),
            self.store.current_chapter(session_id),
            self.store
                .chapters_by_status(session_id, ChapterStatus::Future),
        )?;
        Ok(ChapterSet {
            history,
            current,
            future,
        })
    }

    /// Complete the current chapter and promote the lowest-numbered future one.
    ///
    /// With no future chapter left the story is complete: the session keeps no
    /// current chapter and the call still succeeds. Both status changes are
    /// applied in one store call, so a failed transition leaves the chapters
    /// as they were.
    ///
    /// # Errors
    ///
    /// [`LifecycleErrorKind::NoCurrentChapter`] if nothing is current.
    #[instrument(skip(self))]
    pub async fn transition(&self, session_id: Uuid) -> OdysseyResult<Transition> {
        let (current, future) = tokio::try_join!(
            self.store.current_chapter(session_id),
            self.store
                .chapters_by_status(session_id, ChapterStatus::Future),
        )?;
        let current = current.ok_or_else(|| {
            LifecycleError::new(LifecycleErrorKind::NoCurrentChapter(session_id.to_string()))
        })?;

        let Transition {
            completed,
            promoted,
        } = self
            .store
            .advance_chapter(current.id, future.first().map(|c| c.id))
            .await?;

        match &promoted {
            Some(next) => tracing::info!(
                completed = completed.number,
                promoted = next.number,
                "Chapter transition"
            ),
            None => tracing::info!(completed = completed.number, "Story complete"),
        }

        Ok(Transition {
            completed,
            promoted,
        })
    }

    /// Replace every future chapter with a new plan.
    ///
    /// New chapters are numbered contiguously after the current chapter, or
    /// after the last completed one when nothing is current.
    #[instrument(skip(self, planned), fields(planned = planned.len()))]
    pub async fn replace_future_chapters(
        &self,
        session_id: Uuid,
        planned: Vec<PlannedChapter>,
    ) -> OdysseyResult<Vec<Chapter>> {
        let (history, current) = tokio::try_join!(
            self.store
                .chapters_by_status(session_id, ChapterStatus::History),
            self.store.current_chapter(session_id),
        )?;
        let first = history.len() + if current.is_some() { 2 } else { 1 };

        let cleared = self.store.clear_future_chapters(session_id).await?;
        tracing::debug!(cleared, first, "Replacing future chapters");

        let mut created = Vec::with_capacity(planned.len());
        for (offset, chapter) in planned.into_iter().enumerate() {
            let number = chapter_number(first + offset)?;
            created.push(
                self.store
                    .create_chapter(chapter.into_new_chapter(
                        session_id,
                        number,
                        ChapterStatus::Future,
                    ))
                    .await?,
            );
        }
        Ok(created)
    }

    /// Install a freshly planned story: chapter 1 current, the rest future.
    #[instrument(skip(self, roadmap), fields(future = roadmap.future.len()))]
    pub async fn install_roadmap(
        &self,
        session_id: Uuid,
        roadmap: InitialRoadmap,
    ) -> OdysseyResult<InstalledRoadmap> {
        let current = self
            .store
            .create_chapter(
                roadmap
                    .current
                    .into_new_chapter(session_id, 1, ChapterStatus::Current),
            )
            .await?;

        let mut future = Vec::with_capacity(roadmap.future.len());
        for (offset, chapter) in roadmap.future.into_iter().enumerate() {
            let number = chapter_number(offset + 2)?;
            future.push(
                self.store
                    .create_chapter(chapter.into_new_chapter(
                        session_id,
                        number,
                        ChapterStatus::Future,
                    ))
                    .await?,
            );
        }

        Ok(InstalledRoadmap { current, future })
    }
}
