//! Modality-keyed provider registry.

use crate::{SpeechToText, TextGeneration, TextToSpeech};
use odyssey_error::{ConfigError, OdysseyResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A kind of generation capability.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Modality {
    /// Text in, text out
    Text,
    /// Audio in, text out
    SpeechToText,
    /// Text in, audio out
    TextToSpeech,
}

/// Providers resolved once at configuration time.
///
/// Asking for a modality nobody registered is a configuration error, never a
/// runtime check of what a provider happens to support.
///
/// # Examples
///
/// ```
/// use odyssey_interface::{Modality, ProviderRegistry};
///
/// let registry = ProviderRegistry::builder().build();
/// assert!(registry.modalities().is_empty());
/// assert!(registry.require(&[Modality::Text]).is_err());
/// assert!(registry.text_generation().is_err());
/// ```
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    text: Option<Arc<dyn TextGeneration>>,
    speech_to_text: Option<Arc<dyn SpeechToText>>,
    text_to_speech: Option<Arc<dyn TextToSpeech>>,
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("modalities", &self.modalities())
            .finish()
    }
}

impl ProviderRegistry {
    /// Start building a registry.
    pub fn builder() -> ProviderRegistryBuilder {
        ProviderRegistryBuilder::default()
    }

    /// Registered modalities.
    pub fn modalities(&self) -> Vec<Modality> {
        let mut modalities = Vec::new();
        if self.text.is_some() {
            modalities.push(Modality::Text);
        }
        if self.speech_to_text.is_some() {
            modalities.push(Modality::SpeechToText);
        }
        if self.text_to_speech.is_some() {
            modalities.push(Modality::TextToSpeech);
        }
        modalities
    }

    /// Fail unless every listed modality has a provider.
    pub fn require(&self, modalities: &[Modality]) -> OdysseyResult<()> {
        let registered = self.modalities();
        for modality in modalities {
            if !registered.contains(modality) {
                return Err(missing(*modality).into());
            }
        }
        Ok(())
    }

    /// The text-generation provider.
    pub fn text_generation(&self) -> OdysseyResult<Arc<dyn TextGeneration>> {
        self.text
            .clone()
            .ok_or_else(|| missing(Modality::Text).into())
    }

    /// The speech-to-text provider.
    pub fn speech_to_text(&self) -> OdysseyResult<Arc<dyn SpeechToText>> {
        self.speech_to_text
            .clone()
            .ok_or_else(|| missing(Modality::SpeechToText).into())
    }

    /// The text-to-speech provider.
    pub fn text_to_speech(&self) -> OdysseyResult<Arc<dyn TextToSpeech>> {
        self.text_to_speech
            .clone()
            .ok_or_else(|| missing(Modality::TextToSpeech).into())
    }
}

#[track_caller]
fn missing(modality: Modality) -> ConfigError {
    ConfigError::missing_provider(modality)
}

/// Builder for [`ProviderRegistry`].
#[derive(Default)]
pub struct ProviderRegistryBuilder {
    registry: ProviderRegistry,
}

impl ProviderRegistryBuilder {
    /// Register the text-generation provider.
    pub fn text(mut self, provider: Arc<dyn TextGeneration>) -> Self {
        tracing::debug!(
            provider = provider.provider_name(),
            model = provider.model_name(),
            "Registered text generation provider"
        );
        self.registry.text = Some(provider);
        self
    }

    /// Register the speech-to-text provider.
    pub fn speech_to_text(mut self, provider: Arc<dyn SpeechToText>) -> Self {
        self.registry.speech_to_text = Some(provider);
        self
    }

    /// Register the text-to-speech provider.
    pub fn text_to_speech(mut self, provider: Arc<dyn TextToSpeech>) -> Self {
        self.registry.text_to_speech = Some(provider);
        self
    }

    /// Finish the registry.
    pub fn build(self) -> ProviderRegistry {
        self.registry
    }
}
