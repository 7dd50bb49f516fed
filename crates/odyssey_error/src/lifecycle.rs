//! Chapter lifecycle errors.

/// Conditions under which a session has nothing to narrate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum LifecycleErrorKind {
    /// No story parameters exist for the session
    #[display("Unknown session {}", _0)]
    UnknownSession(String),
    /// The session exists but its roadmap was never installed
    #[display("Session {} has no chapters yet", _0)]
    NotInitialized(String),
    /// Every planned chapter has been narrated
    #[display("Story exhausted for session {}: no chapter remains", _0)]
    StoryExhausted(String),
    /// No world exists with the given id
    #[display("Unknown world {}", _0)]
    UnknownWorld(String),
    /// A transition was requested while no chapter is current
    #[display("Session {} has no current chapter to complete", _0)]
    NoCurrentChapter(String),
}

/// Lifecycle error with source location tracking.
///
/// # Examples
///
/// ```
/// use odyssey_error::{LifecycleError, LifecycleErrorKind};
///
/// let err = LifecycleError::new(LifecycleErrorKind::StoryExhausted("abc".to_string()));
/// assert!(format!("{}", err).contains("exhausted"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Lifecycle Error: {} at line {} in {}", kind, line, file)]
pub struct LifecycleError {
    /// The specific error condition
    pub kind: LifecycleErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl LifecycleError {
    /// Create a new LifecycleError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: LifecycleErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
