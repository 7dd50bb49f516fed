//! Text-generation errors and retry classification.

/// Conditions under which a generation call fails.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum GenerationErrorKind {
    /// Provider answered with a non-success HTTP status
    #[display("HTTP {} error: {}", status_code, message)]
    HttpStatus {
        /// HTTP status code
        status_code: u16,
        /// Body or reason returned by the provider
        message: String,
    },
    /// Request never reached the provider or the connection dropped
    #[display("Transport failure: {}", _0)]
    Transport(String),
    /// Provider did not answer within the configured timeout
    #[display("Request timed out after {}ms", _0)]
    Timeout(u64),
    /// Provider answered successfully but with no content
    #[display("Provider returned empty content")]
    EmptyContent,
    /// Provider response body did not match its documented shape
    #[display("Malformed provider response: {}", _0)]
    MalformedResponse(String),
    /// The pacing reply carried no next-beat line
    #[display("Pacing reply did not contain a next beat")]
    MissingBeat,
}

impl GenerationErrorKind {
    /// Check if this error type should be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            GenerationErrorKind::HttpStatus { status_code, .. } => {
                matches!(*status_code, 408 | 429 | 500 | 502 | 503 | 504)
            }
            GenerationErrorKind::Transport(_) => true,
            GenerationErrorKind::Timeout(_) => true,
            GenerationErrorKind::EmptyContent => true,
            GenerationErrorKind::MalformedResponse(_) => false,
            GenerationErrorKind::MissingBeat => false,
        }
    }
}

/// Generation error with source location tracking.
///
/// # Examples
///
/// ```
/// use odyssey_error::{GenerationError, GenerationErrorKind, RetryableError};
///
/// let err = GenerationError::new(GenerationErrorKind::HttpStatus {
///     status_code: 503,
///     message: "overloaded".to_string(),
/// });
/// assert!(err.is_retryable());
///
/// let err = GenerationError::new(GenerationErrorKind::HttpStatus {
///     status_code: 401,
///     message: "bad key".to_string(),
/// });
/// assert!(!err.is_retryable());
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Generation Error: {} at line {} in {}", kind, line, file)]
pub struct GenerationError {
    /// The kind of error that occurred
    pub kind: GenerationErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl GenerationError {
    /// Create a new GenerationError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: GenerationErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}

/// Trait for errors that support retry logic.
///
/// Transient failures (timeouts, dropped connections, 429/5xx) return true.
/// Permanent failures (401, 400, unparseable replies) return false and are
/// surfaced on the first attempt.
pub trait RetryableError {
    /// Returns true if this error should trigger a retry.
    fn is_retryable(&self) -> bool;
}

impl RetryableError for GenerationError {
    fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}
