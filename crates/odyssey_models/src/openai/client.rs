//! reqwest client for OpenAI-compatible endpoints.

use super::dto::{
    ChatCompletionRequest, ChatCompletionResponse, SpeechRequest, TranscriptionResponse,
};
use crate::ProviderConfig;
use async_trait::async_trait;
use odyssey_core::{GenerateRequest, GenerateResponse};
use odyssey_error::{ConfigError, GenerationError, GenerationErrorKind, OdysseyResult};
use odyssey_interface::{SpeechToText, TextGeneration, TextToSpeech};
use std::time::Duration;
use tracing::instrument;

/// Client for an OpenAI-compatible provider.
///
/// One client serves all three modalities; register it in a
/// [`ProviderRegistry`](odyssey_interface::ProviderRegistry) once per modality
/// the deployment needs.
#[derive(Debug, Clone)]
pub struct OpenAiCompatClient {
    config: ProviderConfig,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl OpenAiCompatClient {
    /// Create a client, reading the API key from the configured variable.
    #[instrument(skip(config), fields(base_url = %config.base_url, model = %config.model))]
    pub fn new(config: ProviderConfig) -> OdysseyResult<Self> {
        let api_key = config.api_key();
        if api_key.is_none() {
            tracing::warn!(
                env = %config.api_key_env,
                "No API key found, sending unauthenticated requests"
            );
        }
        Self::with_api_key(config, api_key)
    }

    /// Create a client with an explicit API key.
    pub fn with_api_key(config: ProviderConfig, api_key: Option<String>) -> OdysseyResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ConfigError::new(format!("Failed to build HTTP client: {}", e)))?;

        tracing::debug!("Created OpenAI-compatible client");
        Ok(Self {
            config,
            api_key,
            client,
        })
    }

    /// The provider configuration.
    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    /// Send a request, mapping transport faults and non-success statuses.
    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::Response, GenerationError> {
        let response = self
            .authorized(builder)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), "Provider returned error");
            return Err(GenerationError::new(GenerationErrorKind::HttpStatus {
                status_code: status.as_u16(),
                message: if body.is_empty() {
                    status.to_string()
                } else {
                    body
                },
            }));
        }
        Ok(response)
    }

    #[track_caller]
    fn transport_error(&self, error: reqwest::Error) -> GenerationError {
        if error.is_timeout() {
            tracing::error!(timeout_secs = self.config.timeout_secs, "Request timed out");
            GenerationError::new(GenerationErrorKind::Timeout(
                self.config.timeout_secs.saturating_mul(1000),
            ))
        } else {
            tracing::error!(error = %error, "Request failed");
            GenerationError::new(GenerationErrorKind::Transport(error.to_string()))
        }
    }
}

#[async_trait]
impl TextGeneration for OpenAiCompatClient {
    #[instrument(
        skip(self, req),
        fields(provider = %self.config.provider_name, model = %self.config.model, messages = req.messages.len())
    )]
    async fn generate(&self, req: &GenerateRequest) -> OdysseyResult<GenerateResponse> {
        let url = self.config.endpoint("/v1/chat/completions");
        let body = ChatCompletionRequest::from_request(&self.config.model, req);
        tracing::debug!(url = %url, "Sending chat completion request");

        let response = self.send(self.client.post(&url).json(&body)).await?;
        let parsed: ChatCompletionResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to parse chat completion");
            GenerationError::new(GenerationErrorKind::MalformedResponse(e.to_string()))
        })?;

        let result = parsed.into_response()?;
        tracing::debug!(chars = result.content.len(), "Chat completion successful");
        Ok(result)
    }

    fn provider_name(&self) -> &str {
        &self.config.provider_name
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[async_trait]
impl SpeechToText for OpenAiCompatClient {
    #[instrument(skip(self, audio), fields(bytes = audio.len()))]
    async fn transcribe(&self, audio: Vec<u8>, mime_type: &str) -> OdysseyResult<String> {
        let url = self.config.endpoint("/v1/audio/transcriptions");
        let part = reqwest::multipart::Part::bytes(audio)
            .file_name("audio")
            .mime_str(mime_type)
            .map_err(|e| {
                GenerationError::new(GenerationErrorKind::Transport(format!(
                    "Invalid audio MIME type '{}': {}",
                    mime_type, e
                )))
            })?;
        let form = reqwest::multipart::Form::new()
            .text("model", self.config.transcription_model.clone())
            .part("file", part);

        let response = self.send(self.client.post(&url).multipart(form)).await?;
        let parsed: TranscriptionResponse = response.json().await.map_err(|e| {
            GenerationError::new(GenerationErrorKind::MalformedResponse(e.to_string()))
        })?;

        if parsed.text.trim().is_empty() {
            return Err(GenerationError::new(GenerationErrorKind::EmptyContent).into());
        }
        Ok(parsed.text)
    }
}

#[async_trait]
impl TextToSpeech for OpenAiCompatClient {
    #[instrument(skip(self, text), fields(chars = text.len()))]
    async fn synthesize(&self, text: &str, voice: Option<&str>) -> OdysseyResult<Vec<u8>> {
        let url = self.config.endpoint("/v1/audio/speech");
        let body = SpeechRequest {
            model: &self.config.speech_model,
            input: text,
            voice: voice.unwrap_or(&self.config.default_voice),
        };

        let response = self.send(self.client.post(&url).json(&body)).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(e))?;

        if bytes.is_empty() {
            return Err(GenerationError::new(GenerationErrorKind::EmptyContent).into());
        }
        Ok(bytes.to_vec())
    }
}
