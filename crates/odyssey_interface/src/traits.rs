//! Capability traits for generation providers.

use async_trait::async_trait;
use odyssey_core::{GenerateRequest, GenerateResponse};
use odyssey_error::OdysseyResult;
use std::sync::Arc;

/// Text generation: the capability every narrative stage relies on.
///
/// Implementations fail with a `GenerationError` on a non-success status or
/// an empty reply; retrying is the caller's concern.
#[async_trait]
pub trait TextGeneration: Send + Sync {
    /// Generate a reply for the given transcript.
    async fn generate(&self, req: &GenerateRequest) -> OdysseyResult<GenerateResponse>;

    /// Provider name (e.g., "openai", "ollama").
    fn provider_name(&self) -> &str;

    /// Model identifier.
    fn model_name(&self) -> &str;
}

/// Speech-to-text transcription.
#[async_trait]
pub trait SpeechToText: Send + Sync {
    /// Transcribe encoded audio of the given MIME type into text.
    async fn transcribe(&self, audio: Vec<u8>, mime_type: &str) -> OdysseyResult<String>;
}

/// Text-to-speech synthesis.
#[async_trait]
pub trait TextToSpeech: Send + Sync {
    /// Synthesize speech, returning encoded audio bytes.
    async fn synthesize(&self, text: &str, voice: Option<&str>) -> OdysseyResult<Vec<u8>>;
}

#[async_trait]
impl<T: TextGeneration + ?Sized> TextGeneration for Arc<T> {
    async fn generate(&self, req: &GenerateRequest) -> OdysseyResult<GenerateResponse> {
        (**self).generate(req).await
    }

    fn provider_name(&self) -> &str {
        (**self).provider_name()
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }
}
