//! PostgreSQL persistence for the Odyssey story engine.
//!
//! This crate provides the diesel schema, row models and the
//! [`PostgresStoryStore`] implementation of the story persistence gateway.
//!
//! # Example
//!
//! ```rust,ignore
//! use odyssey_database::{database_url_from_env, establish_pool, run_migrations, PostgresStoryStore};
//!
//! # fn example() -> odyssey_error::OdysseyResult<()> {
//! let pool = establish_pool(&database_url_from_env()?, 8)?;
//! run_migrations(&pool)?;
//! let store = PostgresStoryStore::new(pool);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod connection;
mod models;
mod story_repository;

/// Diesel table definitions.
#[allow(missing_docs)]
pub mod schema;

pub use connection::{PgPool, database_url_from_env, establish_pool, run_migrations};
pub use story_repository::PostgresStoryStore;
