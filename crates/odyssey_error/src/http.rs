//! Errors from the server's own listener.

use std::fmt::Display;

/// The HTTP listener could not bind or stopped serving.
///
/// Request-level failures never use this type; they are mapped to status
/// codes from the error that caused them.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("HTTP Error: {} at line {} in {}", message, line, file)]
pub struct HttpError {
    /// What went wrong with the listener
    pub message: String,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl HttpError {
    /// Create an HttpError at the caller's location.
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: location.line(),
            file: location.file(),
        }
    }

    /// The listener could not bind `addr`.
    ///
    /// # Examples
    ///
    /// ```
    /// use odyssey_error::HttpError;
    ///
    /// let err = HttpError::bind("0.0.0.0:8080", "address in use");
    /// assert_eq!(err.message, "Failed to bind 0.0.0.0:8080: address in use");
    /// ```
    #[track_caller]
    pub fn bind(addr: impl Display, cause: impl Display) -> Self {
        Self::new(format!("Failed to bind {}: {}", addr, cause))
    }

    /// The server loop exited with an error.
    #[track_caller]
    pub fn serve(cause: impl Display) -> Self {
        Self::new(format!("Server error: {}", cause))
    }
}
