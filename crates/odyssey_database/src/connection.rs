//! Connection pool and migrations.

use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use odyssey_error::{OdysseyResult, StorageError, StorageErrorKind};

/// Pooled PostgreSQL connections.
pub type PgPool = Pool<ConnectionManager<PgConnection>>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Read the connection string from `DATABASE_URL`.
///
/// # Errors
///
/// Returns an error if the variable is not set.
pub fn database_url_from_env() -> OdysseyResult<String> {
    std::env::var("DATABASE_URL").map_err(|_| {
        StorageError::new(StorageErrorKind::Connection(
            "DATABASE_URL environment variable not set".to_string(),
        ))
        .into()
    })
}

/// Build a connection pool for the given database.
///
/// # Errors
///
/// Returns an error if no connection can be established.
#[tracing::instrument(skip(database_url))]
pub fn establish_pool(database_url: &str, max_size: u32) -> OdysseyResult<PgPool> {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    let pool = Pool::builder()
        .max_size(max_size)
        .build(manager)
        .map_err(|e| StorageError::new(StorageErrorKind::Connection(e.to_string())))?;
    tracing::info!("Database pool established");
    Ok(pool)
}

/// Run pending migrations, returning how many were applied.
#[tracing::instrument(skip(pool))]
pub fn run_migrations(pool: &PgPool) -> OdysseyResult<usize> {
    let mut conn = pool
        .get()
        .map_err(|e| StorageError::new(StorageErrorKind::Connection(e.to_string())))?;

    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| StorageError::new(StorageErrorKind::Migration(e.to_string())))?;

    for version in &applied {
        tracing::info!(version = %version, "Applied migration");
    }
    Ok(applied.len())
}
