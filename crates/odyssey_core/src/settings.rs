//! Tunables for the narrative stages.

use serde::{Deserialize, Serialize};

/// Sampling settings for one generation stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StageSettings {
    /// Sampling temperature
    pub temperature: f32,
    /// Token budget for the reply
    pub max_tokens: u32,
}

impl StageSettings {
    /// Create stage settings.
    pub fn new(temperature: f32, max_tokens: u32) -> Self {
        Self {
            temperature,
            max_tokens,
        }
    }
}

fn default_recent_window() -> usize {
    6
}

fn default_max_input_chars() -> usize {
    2000
}

fn default_optimizer() -> StageSettings {
    StageSettings::new(0.3, 300)
}

fn default_narrator() -> StageSettings {
    StageSettings::new(0.8, 1200)
}

fn default_predictor() -> StageSettings {
    StageSettings::new(0.5, 2000)
}

/// Settings shared by every turn.
///
/// # Examples
///
/// ```
/// use odyssey_core::NarrativeSettings;
///
/// let settings: NarrativeSettings = serde_json::from_str(r#"{ "recent_window": 10 }"#).unwrap();
/// assert_eq!(settings.recent_window, 10);
/// assert_eq!(settings.max_input_chars, 2000);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrativeSettings {
    /// Number of recent messages shown to the pacing and planning stages
    #[serde(default = "default_recent_window")]
    pub recent_window: usize,
    /// Longest accepted player message, in characters
    #[serde(default = "default_max_input_chars")]
    pub max_input_chars: usize,
    /// Pacing stage sampling
    #[serde(default = "default_optimizer")]
    pub optimizer: StageSettings,
    /// Narration stage sampling
    #[serde(default = "default_narrator")]
    pub narrator: StageSettings,
    /// Forward-planning stage sampling
    #[serde(default = "default_predictor")]
    pub predictor: StageSettings,
}

impl Default for NarrativeSettings {
    fn default() -> Self {
        Self {
            recent_window: default_recent_window(),
            max_input_chars: default_max_input_chars(),
            optimizer: default_optimizer(),
            narrator: default_narrator(),
            predictor: default_predictor(),
        }
    }
}
