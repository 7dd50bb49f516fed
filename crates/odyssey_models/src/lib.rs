//! Generation provider clients for the Odyssey story engine.
//!
//! - [`OpenAiCompatClient`] speaks the OpenAI-compatible HTTP protocol and
//!   implements text generation, speech-to-text and text-to-speech.
//! - [`RetryingGenerator`] wraps any [`TextGeneration`](odyssey_interface::TextGeneration)
//!   with bounded exponential backoff driven by a [`RetryPolicy`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod openai;
mod retry;

pub use config::ProviderConfig;
pub use openai::OpenAiCompatClient;
pub use retry::{RetryPolicy, RetryingGenerator};
