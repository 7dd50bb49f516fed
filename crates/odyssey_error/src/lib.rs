//! Error types for the Odyssey story engine.
//!
//! # Error Hierarchy
//!
//! Every error family follows the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum names the specific condition
//! - `*Error` struct wraps the kind with the source location that raised it
//! - constructors use `#[track_caller]` so the location is captured for free
//!
//! The families map onto how a turn can fail:
//! - [`ValidationError`]: malformed input, rejected before any stage runs
//! - [`GenerationError`]: the text-generation service failed (retried, then surfaced)
//! - [`ExtractionError`]: a reply could not be parsed into the required shape
//! - [`LifecycleError`]: the session has no chapter to narrate
//! - [`StorageError`]: persistence failed or returned inconsistent data
//!
//! # Examples
//!
//! ```
//! use odyssey_error::{OdysseyResult, ValidationError};
//!
//! fn check(message: &str) -> OdysseyResult<()> {
//!     if message.trim().is_empty() {
//!         Err(ValidationError::new("message must not be empty"))?
//!     }
//!     Ok(())
//! }
//!
//! assert!(check("   ").is_err());
//! assert!(check("open the door").is_ok());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod extraction;
mod generation;
mod http;
mod lifecycle;
mod storage;
mod validation;

pub use config::ConfigError;
pub use error::{OdysseyError, OdysseyErrorKind, OdysseyResult};
pub use extraction::{ExtractionError, ExtractionErrorKind};
pub use generation::{GenerationError, GenerationErrorKind, RetryableError};
pub use http::HttpError;
pub use lifecycle::{LifecycleError, LifecycleErrorKind};
pub use storage::{StorageError, StorageErrorKind};
pub use validation::ValidationError;
