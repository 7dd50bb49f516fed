//! Trait definitions for the Odyssey story engine.
//!
//! This crate holds the seams between the orchestration core and its
//! collaborators: one capability trait per generation modality, the
//! [`ProviderRegistry`] that resolves them at configuration time, and the
//! persistence gateway traits unified under [`StoryStore`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod registry;
mod repository;
mod traits;

pub use registry::{Modality, ProviderRegistry, ProviderRegistryBuilder};
pub use repository::{
    ChapterRepository, MessageRepository, StoryParametersRepository, StoryStore, WorldRepository,
};
pub use traits::{SpeechToText, TextGeneration, TextToSpeech};
