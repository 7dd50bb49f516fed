//! Chapter lifecycle scenarios against the in-memory store.

mod test_utils;

use odyssey_core::{ChapterStatus, PlannedChapter};
use odyssey_error::{LifecycleErrorKind, OdysseyErrorKind, StorageErrorKind};
use odyssey_interface::ChapterRepository;
use odyssey_narrative::{ChapterLifecycle, InMemoryStoryStore, InitialRoadmap};
use std::sync::Arc;
use test_utils::{FaultyStore, seed_chapter, seed_session};
use uuid::Uuid;

fn lifecycle(store: &Arc<InMemoryStoryStore>) -> ChapterLifecycle {
    ChapterLifecycle::new(store.clone())
}

#[tokio::test]
async fn transition_without_future_completes_story() -> anyhow::Result<()> {
    let store = Arc::new(InMemoryStoryStore::new());
    let session = seed_session(&store).await?.session_id;
    seed_chapter(&store, session, 1, ChapterStatus::Current).await?;

    let transition = lifecycle(&store).transition(session).await?;
    assert_eq!(transition.completed.number, 1);
    assert_eq!(transition.completed.status, ChapterStatus::History);
    assert!(transition.promoted.is_none());
    assert!(lifecycle(&store).current(session).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn transition_promotes_lowest_future() -> anyhow::Result<()> {
    let store = Arc::new(InMemoryStoryStore::new());
    let session = seed_session(&store).await?.session_id;
    seed_chapter(&store, session, 1, ChapterStatus::History).await?;
    seed_chapter(&store, session, 2, ChapterStatus::History).await?;
    seed_chapter(&store, session, 3, ChapterStatus::Current).await?;
    seed_chapter(&store, session, 5, ChapterStatus::Future).await?;
    seed_chapter(&store, session, 4, ChapterStatus::Future).await?;

    let transition = lifecycle(&store).transition(session).await?;
    assert_eq!(transition.completed.number, 3);
    assert_eq!(transition.promoted.map(|c| c.number), Some(4));

    let set = lifecycle(&store).all(session).await?;
    let history: Vec<_> = set.history.iter().map(|c| c.number).collect();
    let future: Vec<_> = set.future.iter().map(|c| c.number).collect();
    assert_eq!(history, vec![1, 2, 3]);
    assert_eq!(set.current.map(|c| c.number), Some(4));
    assert_eq!(future, vec![5]);
    Ok(())
}

#[tokio::test]
async fn transition_without_current_fails() -> anyhow::Result<()> {
    let store = Arc::new(InMemoryStoryStore::new());
    let session = seed_session(&store).await?.session_id;

    let err = lifecycle(&store).transition(session).await.unwrap_err();
    match err.kind() {
        OdysseyErrorKind::Lifecycle(e) => {
            assert!(matches!(e.kind, LifecycleErrorKind::NoCurrentChapter(_)))
        }
        other => panic!("unexpected error: {}", other),
    }
    Ok(())
}

#[tokio::test]
async fn replacement_numbers_follow_current() -> anyhow::Result<()> {
    let store = Arc::new(InMemoryStoryStore::new());
    let session = seed_session(&store).await?.session_id;
    seed_chapter(&store, session, 1, ChapterStatus::History).await?;
    seed_chapter(&store, session, 2, ChapterStatus::History).await?;
    seed_chapter(&store, session, 3, ChapterStatus::Current).await?;
    seed_chapter(&store, session, 4, ChapterStatus::Future).await?;
    seed_chapter(&store, session, 5, ChapterStatus::Future).await?;
    seed_chapter(&store, session, 6, ChapterStatus::Future).await?;

    let created = lifecycle(&store)
        .replace_future_chapters(
            session,
            vec![
                PlannedChapter::new("A", "first"),
                PlannedChapter::new("B", "second"),
            ],
        )
        .await?;

    let numbered: Vec<_> = created.iter().map(|c| (c.title.as_str(), c.number)).collect();
    assert_eq!(numbered, vec![("A", 4), ("B", 5)]);

    let set = lifecycle(&store).all(session).await?;
    assert_eq!(set.future.len(), 2);
    assert!(set.future.windows(2).all(|w| w[1].number == w[0].number + 1));
    Ok(())
}

#[tokio::test]
async fn replacement_on_fresh_session_starts_at_one() -> anyhow::Result<()> {
    let store = Arc::new(InMemoryStoryStore::new());
    let session = seed_session(&store).await?.session_id;

    let created = lifecycle(&store)
        .replace_future_chapters(session, vec![PlannedChapter::new("A", "first")])
        .await?;
    assert_eq!(created[0].number, 1);
    Ok(())
}

#[tokio::test]
async fn install_roadmap_numbers_from_one() -> anyhow::Result<()> {
    let store = Arc::new(InMemoryStoryStore::new());
    let session = seed_session(&store).await?.session_id;

    let installed = lifecycle(&store)
        .install_roadmap(
            session,
            InitialRoadmap {
                current: PlannedChapter::new("Arrival", "The keeper returns."),
                future: vec![
                    PlannedChapter::new("The Flood", "The tide comes early."),
                    PlannedChapter::new("Lights Out", "The lamp fails."),
                ],
            },
        )
        .await?;

    assert_eq!(installed.current.number, 1);
    assert_eq!(installed.current.status, ChapterStatus::Current);
    let future: Vec<_> = installed.future.iter().map(|c| c.number).collect();
    assert_eq!(future, vec![2, 3]);
    Ok(())
}

#[tokio::test]
async fn at_most_one_current_through_a_whole_story() -> anyhow::Result<()> {
    let store = Arc::new(InMemoryStoryStore::new());
    let session = seed_session(&store).await?.session_id;
    seed_chapter(&store, session, 1, ChapterStatus::Current).await?;
    seed_chapter(&store, session, 2, ChapterStatus::Future).await?;
    seed_chapter(&store, session, 3, ChapterStatus::Future).await?;

    let manager = lifecycle(&store);
    for _ in 0..3 {
        manager.transition(session).await?;
        let current = store
            .chapters_by_status(session, ChapterStatus::Current)
            .await?;
        assert!(current.len() <= 1);
    }
    assert!(manager.current(session).await?.is_none());
    assert_eq!(manager.all(session).await?.history.len(), 3);
    Ok(())
}

#[tokio::test]
async fn failed_advance_keeps_current_chapter() -> anyhow::Result<()> {
    let faulty = Arc::new(FaultyStore::new());
    let store = faulty.inner();
    let session = seed_session(&store).await?.session_id;
    seed_chapter(&store, session, 1, ChapterStatus::Current).await?;
    seed_chapter(&store, session, 2, ChapterStatus::Future).await?;
    faulty.fail_advance(true);

    let manager = ChapterLifecycle::new(faulty.clone());
    let err = manager.transition(session).await.unwrap_err();
    assert!(matches!(err.kind(), OdysseyErrorKind::Storage(_)));

    let set = manager.all(session).await?;
    assert!(set.history.is_empty());
    assert_eq!(set.current.map(|c| c.number), Some(1));
    let future: Vec<_> = set.future.iter().map(|c| c.number).collect();
    assert_eq!(future, vec![2]);

    faulty.fail_advance(false);
    let transition = manager.transition(session).await?;
    assert_eq!(transition.promoted.map(|c| c.number), Some(2));
    Ok(())
}

#[tokio::test]
async fn advance_with_unknown_promotion_changes_nothing() -> anyhow::Result<()> {
    let store = Arc::new(InMemoryStoryStore::new());
    let session = seed_session(&store).await?.session_id;
    seed_chapter(&store, session, 1, ChapterStatus::Current).await?;
    let current = store.current_chapter(session).await?.expect("chapter 1");

    let err = store
        .advance_chapter(current.id, Some(Uuid::new_v4()))
        .await
        .unwrap_err();
    match err.kind() {
        OdysseyErrorKind::Storage(e) => assert!(matches!(e.kind, StorageErrorKind::NotFound(_))),
        other => panic!("unexpected error: {}", other),
    }
    assert_eq!(store.current_chapter(session).await?.map(|c| c.id), Some(current.id));
    Ok(())
}

#[tokio::test]
async fn advance_refuses_to_promote_a_finished_chapter() -> anyhow::Result<()> {
    let store = Arc::new(InMemoryStoryStore::new());
    let session = seed_session(&store).await?.session_id;
    seed_chapter(&store, session, 1, ChapterStatus::History).await?;
    seed_chapter(&store, session, 2, ChapterStatus::Current).await?;
    let finished = store
        .chapters_by_status(session, ChapterStatus::History)
        .await?
        .remove(0);
    let current = store.current_chapter(session).await?.expect("chapter 2");

    let err = store
        .advance_chapter(current.id, Some(finished.id))
        .await
        .unwrap_err();
    match err.kind() {
        OdysseyErrorKind::Storage(e) => {
            assert!(matches!(e.kind, StorageErrorKind::DataIntegrity(_)))
        }
        other => panic!("unexpected error: {}", other),
    }
    assert_eq!(store.current_chapter(session).await?.map(|c| c.number), Some(2));
    Ok(())
}
