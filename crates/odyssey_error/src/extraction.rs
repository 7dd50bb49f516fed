//! Errors raised while recovering structured data from model replies.

/// Ways a model reply can fail to match the shape a stage requires.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum ExtractionErrorKind {
    /// No strategy recovered a JSON value from the reply
    #[display("No JSON found in reply (length: {})", _0)]
    NoJson(usize),
    /// JSON was found but does not deserialize into the expected shape
    #[display("Reply has the wrong shape: {}", _0)]
    InvalidShape(String),
    /// A required field is missing or empty
    #[display("Missing or empty field '{}'", _0)]
    MissingField(String),
    /// Narration must offer exactly three choices
    #[display("Expected exactly {} choices, found {}", expected, found)]
    ChoiceCount {
        /// Required number of choices
        expected: usize,
        /// Number of choices in the reply
        found: usize,
    },
    /// Planning reply contained no chapters
    #[display("Planned chapter list is empty")]
    EmptyRoadmap,
    /// A planned chapter lacks a title or description
    #[display("Planned chapter {} is missing its {}", index, field)]
    IncompleteChapter {
        /// Position of the chapter in the reply
        index: usize,
        /// The missing field
        field: String,
    },
}

/// Extraction error with source location tracking.
///
/// # Examples
///
/// ```
/// use odyssey_error::{ExtractionError, ExtractionErrorKind};
///
/// let err = ExtractionError::new(ExtractionErrorKind::ChoiceCount { expected: 3, found: 2 });
/// assert!(format!("{}", err).contains("exactly 3 choices"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Extraction Error: {} at line {} in {}", kind, line, file)]
pub struct ExtractionError {
    /// The specific error condition
    pub kind: ExtractionErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl ExtractionError {
    /// Create a new ExtractionError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ExtractionErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
