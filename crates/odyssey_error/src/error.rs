//! Top-level error wrapper types.

use crate::{
    ConfigError, ExtractionError, GenerationError, HttpError, LifecycleError, RetryableError,
    StorageError, ValidationError,
};

/// Every error family the engine can raise.
///
/// # Examples
///
/// ```
/// use odyssey_error::{OdysseyError, ValidationError};
///
/// let err: OdysseyError = ValidationError::new("empty message").into();
/// assert!(format!("{}", err).contains("Validation Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum OdysseyErrorKind {
    /// Malformed caller input
    #[from(ValidationError)]
    Validation(ValidationError),
    /// Text-generation service failure
    #[from(GenerationError)]
    Generation(GenerationError),
    /// Reply could not be parsed into the required shape
    #[from(ExtractionError)]
    Extraction(ExtractionError),
    /// Session has no chapter to narrate
    #[from(LifecycleError)]
    Lifecycle(LifecycleError),
    /// Persistence failure
    #[from(StorageError)]
    Storage(StorageError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// HTTP surface error
    #[from(HttpError)]
    Http(HttpError),
}

/// Odyssey error with kind discrimination.
///
/// # Examples
///
/// ```
/// use odyssey_error::{OdysseyErrorKind, OdysseyResult, LifecycleError, LifecycleErrorKind};
///
/// fn next_chapter() -> OdysseyResult<u32> {
///     Err(LifecycleError::new(LifecycleErrorKind::StoryExhausted("s-1".into())))?
/// }
///
/// let err = next_chapter().unwrap_err();
/// assert!(matches!(err.kind(), OdysseyErrorKind::Lifecycle(_)));
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Odyssey Error: {}", _0)]
pub struct OdysseyError(Box<OdysseyErrorKind>);

impl OdysseyError {
    /// Create a new error from a kind.
    pub fn new(kind: OdysseyErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &OdysseyErrorKind {
        &self.0
    }
}

// Generic From implementation for any type that converts to OdysseyErrorKind
impl<T> From<T> for OdysseyError
where
    T: Into<OdysseyErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

impl RetryableError for OdysseyError {
    fn is_retryable(&self) -> bool {
        match self.kind() {
            OdysseyErrorKind::Generation(e) => e.is_retryable(),
            _ => false,
        }
    }
}

/// Result type for Odyssey operations.
pub type OdysseyResult<T> = std::result::Result<T, OdysseyError>;
