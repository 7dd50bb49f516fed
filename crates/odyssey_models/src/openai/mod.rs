//! OpenAI-compatible provider.

mod client;
mod dto;

pub use client::OpenAiCompatClient;
