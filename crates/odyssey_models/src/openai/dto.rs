//! Wire types for the OpenAI-compatible API.

use odyssey_core::{GenerateRequest, GenerateResponse, Usage};
use odyssey_error::{GenerationError, GenerationErrorKind};
use serde::{Deserialize, Serialize};

/// Chat completion request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<WireMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<Vec<String>>,
}

impl ChatCompletionRequest {
    pub(crate) fn from_request(model: &str, req: &GenerateRequest) -> Self {
        Self {
            model: model.to_string(),
            messages: req
                .messages
                .iter()
                .map(|m| WireMessage {
                    role: m.role.as_str().to_string(),
                    content: m.content.clone(),
                })
                .collect(),
            temperature: req.temperature,
            max_tokens: req.max_tokens,
            stop: req.stop_sequences.clone(),
        }
    }
}

/// A message in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct WireMessage {
    pub role: String,
    pub content: String,
}

/// Chat completion response body.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<WireChoice>,
    pub usage: Option<WireUsage>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WireChoice {
    pub message: WireReply,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WireReply {
    pub content: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub(crate) struct WireUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl ChatCompletionResponse {
    /// Convert into the unified response, rejecting empty content.
    pub(crate) fn into_response(self) -> Result<GenerateResponse, GenerationError> {
        let content = self
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| GenerationError::new(GenerationErrorKind::EmptyContent))?;

        Ok(GenerateResponse {
            content,
            usage: self.usage.map(|u| Usage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
            }),
        })
    }
}

/// Transcription response body.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TranscriptionResponse {
    pub text: String,
}

/// Speech synthesis request body.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct SpeechRequest<'a> {
    pub model: &'a str,
    pub input: &'a str,
    pub voice: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use odyssey_core::ChatMessage;

    #[test]
    fn request_uses_wire_role_names() {
        let req = GenerateRequest::builder()
            .messages(vec![
                ChatMessage::system("narrate"),
                ChatMessage::user("look around"),
                ChatMessage::assistant("You see a door."),
            ])
            .build()
            .unwrap();

        let wire = ChatCompletionRequest::from_request("gpt-4o-mini", &req);
        let roles: Vec<_> = wire.messages.iter().map(|m| m.role.as_str()).collect();
        assert_eq!(roles, ["system", "user", "assistant"]);

        let json = serde_json::to_value(&wire).unwrap();
        assert!(json.get("stop").is_none());
    }

    #[test]
    fn response_takes_first_choice_and_usage() {
        let body = r#"{
            "choices": [{ "message": { "role": "assistant", "content": "Hello" } }],
            "usage": { "prompt_tokens": 12, "completion_tokens": 3, "total_tokens": 15 }
        }"#;
        let parsed: ChatCompletionResponse = serde_json::from_str(body).unwrap();
        let response = parsed.into_response().unwrap();
        assert_eq!(response.content, "Hello");
        assert_eq!(response.usage.unwrap().completion_tokens, 3);
    }

    #[test]
    fn blank_content_is_empty_content_error() {
        let body = r#"{ "choices": [{ "message": { "content": "   " } }] }"#;
        let parsed: ChatCompletionResponse = serde_json::from_str(body).unwrap();
        let err = parsed.into_response().unwrap_err();
        assert_eq!(err.kind, GenerationErrorKind::EmptyContent);

        let parsed: ChatCompletionResponse = serde_json::from_str(r#"{ "choices": [] }"#).unwrap();
        assert!(parsed.into_response().is_err());
    }
}
