//! Story orchestration engine for Odyssey.
//!
//! A turn runs a three-stage pipeline around a chapter lifecycle:
//!
//! 1. [`Optimizer`] decides the next beat of the current chapter
//! 2. [`Narrator`] writes the narration, offers three choices and decides
//!    whether the chapter ends
//! 3. [`Predictor`] revises the chapter roadmap after the response is sent
//!
//! [`StoryOrchestrator`] ties the stages together over a shared
//! [`StoryContext`]. Writes never sit on the caller's path: they run as
//! [`DeferredTasks`] after the narration has been returned.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod deferred;
mod extraction;
mod in_memory_repository;
mod lifecycle;
mod narrator;
mod optimizer;
mod orchestrator;
mod predictor;
mod prompts;
mod transcript;

pub use deferred::{
    CompletionGuarantee, DeferredTask, DeferredTasks, DetachedTasks, DrainReport, TrackedTasks,
};
pub use extraction::{extract_json, parse_reply};
pub use in_memory_repository::InMemoryStoryStore;
pub use lifecycle::{ChapterLifecycle, InstalledRoadmap};
pub use narrator::{NarrationInput, Narrator, parse_narration};
pub use optimizer::{Optimizer, PacingInput, parse_directive};
pub use orchestrator::{
    DEMO_LISTING_LIMIT, SessionOpening, StoryContext, StoryOrchestrator, TurnOutcome,
    WORLD_LISTING_LIMIT,
};
pub use predictor::{
    InitialRoadmap, Predictor, RefreshContext, RoadmapModifications, RoadmapRefresh,
    validate_chapters,
};
pub use transcript::{build_transcript, role_for};
