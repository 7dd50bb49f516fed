//! HTTP API for sessions, turns, worlds and speech.

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Utc;
use odyssey_core::{Chapter, ChapterSet, NewStoryParameters, NewWorld, World};
use odyssey_error::{LifecycleErrorKind, OdysseyError, OdysseyErrorKind, ValidationError};
use odyssey_interface::ProviderRegistry;
use odyssey_narrative::StoryOrchestrator;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

/// Encoding of synthesized speech.
const SPEECH_CONTENT_TYPE: &str = "audio/mpeg";

/// Router state shared by every request.
#[derive(Debug, Clone)]
pub struct ApiState {
    orchestrator: StoryOrchestrator,
    registry: Arc<ProviderRegistry>,
}

impl ApiState {
    /// Creates API state around an orchestrator and the provider registry
    /// the speech routes resolve against.
    pub fn new(orchestrator: StoryOrchestrator, registry: Arc<ProviderRegistry>) -> Self {
        Self {
            orchestrator,
            registry,
        }
    }
}

/// Creates the story API router.
pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/sessions", post(start_session))
        .route("/sessions/:id/interact", post(interact))
        .route("/sessions/:id/chapters", get(chapters))
        .route("/worlds", post(create_world).get(worlds))
        .route("/demo-worlds", get(demo_worlds))
        .route("/speech/transcriptions", post(transcribe))
        .route("/speech/synthesis", post(synthesize))
        .with_state(state)
}

/// Body of `POST /sessions`: a stored world or a custom story.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SessionRequest {
    /// Start from a world in the catalog
    FromWorld {
        /// The world to play
        world_id: Uuid,
    },
    /// Start from caller-supplied parameters
    Custom(NewStoryParameters),
}

/// Body of `POST /sessions/:id/interact`.
#[derive(Debug, Clone, Deserialize)]
pub struct InteractRequest {
    /// The player's message
    pub message: String,
}

/// Reply to `POST /sessions/:id/interact`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractResponse {
    /// Narration followed by the numbered choices
    pub response: String,
}

/// Reply to `POST /sessions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    /// The new session
    pub session_id: Uuid,
    /// Opening narration with its choices
    pub opening: String,
    /// Chapter 1
    pub current_chapter: Chapter,
    /// Planned chapters after the first
    pub future_chapters: Vec<Chapter>,
}

/// Reply to `GET /worlds`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldList {
    /// Public worlds, newest first
    pub worlds: Vec<World>,
}

/// Reply to `GET /demo-worlds`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemoWorldList {
    /// Demo worlds, newest first
    pub demo_worlds: Vec<World>,
}

/// Reply to `POST /speech/transcriptions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionResponse {
    /// The recognized text
    pub text: String,
}

/// Body of `POST /speech/synthesis`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisRequest {
    /// Text to speak
    pub text: String,
    /// Provider voice; the configured default when absent
    #[serde(default)]
    pub voice: Option<String>,
}

/// Error reply: an [`OdysseyError`] mapped to a status code.
#[derive(Debug)]
pub struct ApiError(OdysseyError);

impl From<OdysseyError> for ApiError {
    fn from(err: OdysseyError) -> Self {
        Self(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self.0.kind() {
            OdysseyErrorKind::Validation(_) => StatusCode::BAD_REQUEST,
            OdysseyErrorKind::Lifecycle(e) => match e.kind {
                LifecycleErrorKind::UnknownSession(_) | LifecycleErrorKind::UnknownWorld(_) => {
                    StatusCode::NOT_FOUND
                }
                _ => StatusCode::CONFLICT,
            },
            OdysseyErrorKind::Generation(_) | OdysseyErrorKind::Extraction(_) => {
                StatusCode::BAD_GATEWAY
            }
            OdysseyErrorKind::Storage(_)
            | OdysseyErrorKind::Config(_)
            | OdysseyErrorKind::Http(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self.0, "Request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self.0, "Request rejected");
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

/// Health check endpoint.
async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "service": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "timestamp": Utc::now().to_rfc3339(),
        })),
    )
}

/// Create a session and narrate its opening.
#[instrument(skip_all)]
async fn start_session(
    State(state): State<ApiState>,
    Json(request): Json<SessionRequest>,
) -> Result<(StatusCode, Json<SessionResponse>), ApiError> {
    let opening = match request {
        SessionRequest::FromWorld { world_id } => {
            state.orchestrator.start_session_from_world(world_id).await?
        }
        SessionRequest::Custom(input) => state.orchestrator.start_session(input).await?,
    };
    Ok((
        StatusCode::CREATED,
        Json(SessionResponse {
            session_id: opening.session_id,
            opening: opening.response,
            current_chapter: opening.current_chapter,
            future_chapters: opening.future_chapters,
        }),
    ))
}

/// Run one player turn.
#[instrument(skip_all, fields(session_id = %id))]
async fn interact(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
    Json(request): Json<InteractRequest>,
) -> Result<Json<InteractResponse>, ApiError> {
    let turn = state.orchestrator.interact(id, &request.message).await?;
    Ok(Json(InteractResponse {
        response: turn.response,
    }))
}

/// Every chapter of a session.
#[instrument(skip_all, fields(session_id = %id))]
async fn chapters(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ChapterSet>, ApiError> {
    Ok(Json(state.orchestrator.chapters(id).await?))
}

/// Publish a world.
#[instrument(skip_all)]
async fn create_world(
    State(state): State<ApiState>,
    Json(input): Json<NewWorld>,
) -> Result<(StatusCode, Json<World>), ApiError> {
    let world = state.orchestrator.create_world(input).await?;
    Ok((StatusCode::CREATED, Json(world)))
}

/// The public world catalog.
async fn worlds(State(state): State<ApiState>) -> Result<Json<WorldList>, ApiError> {
    Ok(Json(WorldList {
        worlds: state.orchestrator.worlds().await?,
    }))
}

/// Worlds offered for instant play.
async fn demo_worlds(State(state): State<ApiState>) -> Result<Json<DemoWorldList>, ApiError> {
    Ok(Json(DemoWorldList {
        demo_worlds: state.orchestrator.demo_worlds().await?,
    }))
}

/// Transcribe a raw audio body; its `Content-Type` names the encoding.
#[instrument(skip_all, fields(bytes = body.len()))]
async fn transcribe(
    State(state): State<ApiState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<TranscriptionResponse>, ApiError> {
    if body.is_empty() {
        return Err(OdysseyError::from(ValidationError::new("audio body must not be empty")).into());
    }
    let mime_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("application/octet-stream");

    let stt = state.registry.speech_to_text()?;
    let text = stt.transcribe(body.to_vec(), mime_type).await?;
    Ok(Json(TranscriptionResponse { text }))
}

/// Speak text, replying with encoded audio.
#[instrument(skip_all, fields(chars = request.text.chars().count()))]
async fn synthesize(
    State(state): State<ApiState>,
    Json(request): Json<SynthesisRequest>,
) -> Result<Response, ApiError> {
    if request.text.trim().is_empty() {
        return Err(OdysseyError::from(ValidationError::new("text must not be empty")).into());
    }

    let tts = state.registry.text_to_speech()?;
    let audio = tts.synthesize(&request.text, request.voice.as_deref()).await?;
    Ok(([(header::CONTENT_TYPE, SPEECH_CONTENT_TYPE)], audio).into_response())
}
