//! Layered server configuration.
//!
//! Sources, later ones overriding earlier:
//! 1. Bundled defaults (`include_str!` from `odyssey.toml`)
//! 2. `~/.config/odyssey/odyssey.toml`
//! 3. `./odyssey.toml`
//! 4. An explicit file passed on the command line
//! 5. `ODYSSEY__<SECTION>__<KEY>` environment variables
//!
//! Every user source is optional except an explicit file, which must exist.

use config::{Config, Environment, File, FileFormat};
use odyssey_core::{NarrativeSettings, StageSettings};
use odyssey_error::{ConfigError, OdysseyResult};
use odyssey_models::{ProviderConfig, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use tracing::{debug, instrument};

const DEFAULT_CONFIG: &str = include_str!("../odyssey.toml");

/// HTTP listener and logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSection {
    /// Address the HTTP server binds to
    pub bind: String,
    /// Emit JSON log lines instead of human-readable ones
    #[serde(default)]
    pub json_logs: bool,
    /// Log filter used when `RUST_LOG` is unset
    pub log_level: String,
}

impl ServerSection {
    /// Parse the bind address.
    pub fn bind_addr(&self) -> OdysseyResult<SocketAddr> {
        self.bind.parse().map_err(|e| {
            ConfigError::invalid(
                "server.bind",
                format!("is not a valid bind address: '{}' ({})", self.bind, e),
            )
            .into()
        })
    }
}

/// Conversation window and input limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NarrativeSection {
    /// Messages of recent history the pacing stage sees
    pub recent_window: usize,
    /// Longest player message accepted, in characters
    pub max_input_chars: usize,
}

/// Per-stage sampling settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StagesSection {
    /// Pacing stage
    pub optimizer: StageSettings,
    /// Narration stage
    pub narrator: StageSettings,
    /// Forward-planning stage
    pub predictor: StageSettings,
}

/// Which persistence gateway backs the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// PostgreSQL through diesel
    Postgres,
    /// Process-local store, lost on exit
    Memory,
}

/// Persistence settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageSection {
    /// Backend selection
    pub backend: StorageBackend,
    /// Connection pool size for the Postgres backend
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    8
}

/// How deferred turn work is run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeferredMode {
    /// Tracked on a join set and drained on shutdown
    Tracked,
    /// Fire-and-forget
    Detached,
}

/// Deferred task settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeferredSection {
    /// Runner selection
    pub mode: DeferredMode,
}

/// Complete server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OdysseyConfig {
    /// HTTP and logging
    pub server: ServerSection,
    /// Text-generation provider
    pub provider: ProviderConfig,
    /// Retry policy for generation calls
    pub retry: RetryPolicy,
    /// Conversation window and limits
    pub narrative: NarrativeSection,
    /// Sampling settings per stage
    pub stages: StagesSection,
    /// Persistence
    pub storage: StorageSection,
    /// Deferred work
    pub deferred: DeferredSection,
}

impl OdysseyConfig {
    /// Load configuration from every layer.
    ///
    /// A `.env` file in the working directory is read first so its variables
    /// take part in the environment layer.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the explicit file is missing or any layer
    /// fails to parse.
    #[instrument]
    pub fn load(explicit: Option<&Path>) -> OdysseyResult<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!(path = %path.display(), "Loaded .env file");
        }

        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/odyssey/odyssey.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = builder.add_source(File::with_name("odyssey").required(false));

        if let Some(path) = explicit {
            debug!(path = %path.display(), "Adding explicit configuration file");
            builder = builder.add_source(File::from(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("ODYSSEY")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        Self::finish(builder.build())
    }

    /// Load only the bundled defaults overlaid with a TOML string.
    ///
    /// Used by tests and tooling that must not see user files or the environment.
    pub fn from_toml(overrides: &str) -> OdysseyResult<Self> {
        Self::finish(
            Config::builder()
                .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
                .add_source(File::from_str(overrides, FileFormat::Toml))
                .build(),
        )
    }

    fn finish(built: Result<Config, config::ConfigError>) -> OdysseyResult<Self> {
        let config: Self = built
            .map_err(|e| ConfigError::new(format!("Failed to build configuration: {}", e)))?
            .try_deserialize()
            .map_err(|e| ConfigError::new(format!("Failed to parse configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> OdysseyResult<()> {
        if self.retry.max_attempts == 0 {
            Err(ConfigError::invalid("retry.max_attempts", "must be at least 1"))?
        }
        if self.narrative.max_input_chars == 0 {
            Err(ConfigError::invalid("narrative.max_input_chars", "must be at least 1"))?
        }
        self.server.bind_addr()?;
        Ok(())
    }

    /// Turn settings assembled from the narrative and stage sections.
    pub fn narrative_settings(&self) -> NarrativeSettings {
        NarrativeSettings {
            recent_window: self.narrative.recent_window,
            max_input_chars: self.narrative.max_input_chars,
            optimizer: self.stages.optimizer,
            narrator: self.stages.narrator,
            predictor: self.stages.predictor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_defaults_match_engine_defaults() {
        let config = OdysseyConfig::from_toml("").unwrap();
        assert_eq!(config.narrative_settings(), NarrativeSettings::default());
        assert_eq!(config.retry, RetryPolicy::default());
        assert_eq!(config.provider, ProviderConfig::default());
        assert_eq!(config.storage.backend, StorageBackend::Postgres);
        assert_eq!(config.deferred.mode, DeferredMode::Tracked);
    }

    #[test]
    fn later_layers_override_defaults() {
        let config = OdysseyConfig::from_toml(
            r#"
            [storage]
            backend = "memory"

            [stages.narrator]
            temperature = 1.0
            max_tokens = 800
            "#,
        )
        .unwrap();
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.stages.narrator.max_tokens, 800);
        assert_eq!(config.stages.optimizer.max_tokens, 300);
    }

    #[test]
    fn invalid_bind_is_rejected() {
        let err = OdysseyConfig::from_toml("[server]\nbind = \"not an address\"").unwrap_err();
        assert!(err.to_string().contains("bind address"));
    }

    #[test]
    fn zero_attempts_is_rejected() {
        assert!(OdysseyConfig::from_toml("[retry]\nmax_attempts = 0").is_err());
    }
}
