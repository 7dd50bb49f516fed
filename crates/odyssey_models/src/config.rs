//! Provider connection settings.

use serde::{Deserialize, Serialize};

fn default_provider_name() -> String {
    "openai".to_string()
}

fn default_base_url() -> String {
    "https://api.openai.com".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_transcription_model() -> String {
    "whisper-1".to_string()
}

fn default_speech_model() -> String {
    "tts-1".to_string()
}

fn default_voice() -> String {
    "alloy".to_string()
}

/// Connection settings for an OpenAI-compatible endpoint.
///
/// The API key itself is never part of the configuration; only the name of
/// the environment variable holding it is.
///
/// # Examples
///
/// ```
/// use odyssey_models::ProviderConfig;
///
/// let config = ProviderConfig::default();
/// assert_eq!(config.base_url, "https://api.openai.com");
/// assert_eq!(config.timeout_secs, 60);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Name reported in logs
    #[serde(default = "default_provider_name")]
    pub provider_name: String,
    /// Endpoint root, without the `/v1/...` path
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Chat model identifier
    #[serde(default = "default_model")]
    pub model: String,
    /// Environment variable holding the bearer token
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Transcription model identifier
    #[serde(default = "default_transcription_model")]
    pub transcription_model: String,
    /// Speech synthesis model identifier
    #[serde(default = "default_speech_model")]
    pub speech_model: String,
    /// Voice used when the caller names none
    #[serde(default = "default_voice")]
    pub default_voice: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider_name: default_provider_name(),
            base_url: default_base_url(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
            transcription_model: default_transcription_model(),
            speech_model: default_speech_model(),
            default_voice: default_voice(),
        }
    }
}

impl ProviderConfig {
    /// Read the API key from the configured environment variable.
    ///
    /// Local servers often need no key, so absence is not an error.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }

    /// Full URL for an API path such as `/v1/chat/completions`.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}
