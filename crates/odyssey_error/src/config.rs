//! Configuration and provider wiring errors.

use std::fmt::Display;

/// A configuration layer failed to load, a setting is out of range, or a
/// required provider was never registered.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Configuration Error: {} at line {} in {}", message, line, file)]
pub struct ConfigError {
    /// Which setting or layer is wrong, and how
    pub message: String,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl ConfigError {
    /// Create a ConfigError at the caller's location.
    ///
    /// # Examples
    ///
    /// ```
    /// use odyssey_error::ConfigError;
    ///
    /// let err = ConfigError::new("Failed to parse configuration: missing field `bind`");
    /// assert!(err.to_string().starts_with("Configuration Error: Failed to parse"));
    /// ```
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: location.line(),
            file: location.file(),
        }
    }

    /// A setting holds a value the engine cannot run with.
    ///
    /// # Examples
    ///
    /// ```
    /// use odyssey_error::ConfigError;
    ///
    /// let err = ConfigError::invalid("retry.max_attempts", "must be at least 1");
    /// assert_eq!(err.message, "retry.max_attempts must be at least 1");
    /// ```
    #[track_caller]
    pub fn invalid(key: &str, reason: impl Display) -> Self {
        Self::new(format!("{} {}", key, reason))
    }

    /// No provider serves the named modality.
    #[track_caller]
    pub fn missing_provider(modality: impl Display) -> Self {
        Self::new(format!("No provider registered for {}", modality))
    }
}
