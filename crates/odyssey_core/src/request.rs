//! Request and response types for text generation.

use crate::ChatMessage;
use serde::{Deserialize, Serialize};

/// Uniform generation request, independent of the provider behind it.
///
/// # Examples
///
/// ```
/// use odyssey_core::{ChatMessage, GenerateRequest};
///
/// let request = GenerateRequest::builder()
///     .messages(vec![ChatMessage::user("Hello!")])
///     .temperature(0.7)
///     .max_tokens(100)
///     .build()
///     .unwrap();
///
/// assert_eq!(request.messages.len(), 1);
/// assert_eq!(request.max_tokens, 100);
/// assert!(request.stop_sequences.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_builder::Builder)]
pub struct GenerateRequest {
    /// The conversation messages to send
    #[builder(setter(into))]
    pub messages: Vec<ChatMessage>,
    /// Sampling temperature
    #[builder(default = "0.7")]
    pub temperature: f32,
    /// Maximum number of tokens to generate
    #[builder(default = "1024")]
    pub max_tokens: u32,
    /// Sequences at which generation stops
    #[builder(default, setter(strip_option))]
    pub stop_sequences: Option<Vec<String>>,
}

impl GenerateRequest {
    /// Creates a new request builder.
    pub fn builder() -> GenerateRequestBuilder {
        GenerateRequestBuilder::default()
    }
}

/// Token accounting reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Usage {
    /// Tokens in the prompt
    pub prompt_tokens: u32,
    /// Tokens in the completion
    pub completion_tokens: u32,
}

/// The unified response object.
///
/// # Examples
///
/// ```
/// use odyssey_core::GenerateResponse;
///
/// let response = GenerateResponse::text("The door creaks open.");
/// assert_eq!(response.content, "The door creaks open.");
/// assert!(response.usage.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateResponse {
    /// Generated text
    pub content: String,
    /// Token usage, when the provider reports it
    pub usage: Option<Usage>,
}

impl GenerateResponse {
    /// Response carrying only text.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            usage: None,
        }
    }
}
