//! Wiring configuration into a running server.

use crate::api::{ApiState, create_router};
use crate::config::{DeferredMode, OdysseyConfig, StorageBackend};
use odyssey_database::{PostgresStoryStore, database_url_from_env, establish_pool, run_migrations};
use odyssey_error::{HttpError, OdysseyResult};
use odyssey_interface::{Modality, ProviderRegistry, StoryStore};
use odyssey_models::OpenAiCompatClient;
use odyssey_narrative::{
    DeferredTasks, DetachedTasks, InMemoryStoryStore, StoryContext, StoryOrchestrator,
    TrackedTasks,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Register the configured provider for every modality it serves.
///
/// Only text generation is required; the speech routes report a missing
/// provider per request.
pub fn build_registry(config: &OdysseyConfig) -> OdysseyResult<ProviderRegistry> {
    let client = Arc::new(OpenAiCompatClient::new(config.provider.clone())?);
    let registry = ProviderRegistry::builder()
        .text(client.clone())
        .speech_to_text(client.clone())
        .text_to_speech(client)
        .build();
    registry.require(&[Modality::Text])?;
    Ok(registry)
}

/// Open the configured persistence gateway.
pub fn build_store(config: &OdysseyConfig) -> OdysseyResult<Arc<dyn StoryStore>> {
    match config.storage.backend {
        StorageBackend::Postgres => {
            let pool = establish_pool(&database_url_from_env()?, config.storage.max_connections)?;
            Ok(Arc::new(PostgresStoryStore::new(pool)))
        }
        StorageBackend::Memory => {
            warn!("Using the in-memory store: sessions are lost when the server stops");
            Ok(Arc::new(InMemoryStoryStore::new()))
        }
    }
}

/// Create the configured deferred task runner.
pub fn build_tasks(mode: DeferredMode) -> Arc<dyn DeferredTasks> {
    match mode {
        DeferredMode::Tracked => Arc::new(TrackedTasks::new()),
        DeferredMode::Detached => Arc::new(DetachedTasks::new()),
    }
}

/// Build the shared story context from configuration and a registry.
pub fn build_context(
    config: &OdysseyConfig,
    registry: &ProviderRegistry,
) -> OdysseyResult<Arc<StoryContext>> {
    let store = build_store(config)?;
    Ok(Arc::new(StoryContext::new(
        store,
        registry.text_generation()?,
        config.retry,
        build_tasks(config.deferred.mode),
        config.narrative_settings(),
    )))
}

/// Serve the API until Ctrl-C, then drain deferred work.
#[instrument(skip(config))]
pub async fn serve(config: &OdysseyConfig, bind: SocketAddr) -> OdysseyResult<()> {
    let registry = Arc::new(build_registry(config)?);
    let ctx = build_context(config, &registry)?;
    let router = create_router(ApiState::new(
        StoryOrchestrator::new(Arc::clone(&ctx)),
        registry,
    ));

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .map_err(|e| HttpError::bind(bind, e))?;
    info!(%bind, "Odyssey server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(HttpError::serve)?;

    info!("Server stopped, draining deferred tasks");
    let report = ctx.tasks().drain().await;
    info!(
        succeeded = report.succeeded,
        failed = report.failed,
        aborted = report.aborted,
        "Shutdown complete"
    );
    Ok(())
}

/// Apply pending database migrations.
#[instrument(skip(config))]
pub fn migrate(config: &OdysseyConfig) -> OdysseyResult<usize> {
    let pool = establish_pool(&database_url_from_env()?, config.storage.max_connections)?;
    let applied = run_migrations(&pool)?;
    info!(applied, "Migrations complete");
    Ok(applied)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C, shutting down");
    }
}
