//! Core data types for the Odyssey story engine.
//!
//! This crate provides the records the engine persists (story parameters,
//! chapters, messages, worlds), the ephemeral values its stages exchange (pacing
//! directives, narration output, planned chapters), and the request/response
//! shapes of the text-generation facade.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod chapter;
mod message;
mod narration;
mod pacing;
mod request;
mod role;
mod settings;
mod story;
mod story_message;
mod world;

pub use chapter::{Chapter, ChapterSet, ChapterStatus, NewChapter, PlannedChapter, Transition};
pub use message::ChatMessage;
pub use narration::{CHOICE_COUNT, NarrationOutput};
pub use pacing::{PacingDirective, StoryPhase};
pub use request::{GenerateRequest, GenerateRequestBuilder, GenerateRequestBuilderError, GenerateResponse, Usage};
pub use role::Role;
pub use settings::{NarrativeSettings, StageSettings};
pub use story::{NewStoryParameters, StoryParameters};
pub use story_message::{MessageType, NewStoryMessage, StoryMessage};
pub use world::{NewWorld, World};
