//! HTTP server and command-line entry point for the Odyssey story engine.
//!
//! - [`config`]: layered configuration
//! - [`observability`]: tracing subscriber setup
//! - [`api`]: the axum router over a [`StoryOrchestrator`](odyssey_narrative::StoryOrchestrator)
//!   and the speech providers
//! - [`server`]: wiring configuration into a running server

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod api;
pub mod cli;
pub mod config;
pub mod observability;
pub mod server;

pub use api::{
    ApiError, ApiState, DemoWorldList, InteractRequest, InteractResponse, SessionRequest,
    SessionResponse, SynthesisRequest, TranscriptionResponse, WorldList, create_router,
};
pub use cli::{Cli, Commands};
pub use config::{
    DeferredMode, DeferredSection, NarrativeSection, OdysseyConfig, ServerSection, StagesSection,
    StorageBackend, StorageSection,
};
pub use observability::init_logging;
pub use server::{build_context, build_registry, build_store, build_tasks, migrate, serve};
