//! Shared fixtures for router tests.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use odyssey_core::{GenerateRequest, GenerateResponse, NarrativeSettings};
use odyssey_error::{GenerationError, GenerationErrorKind, OdysseyResult};
use odyssey_interface::{ProviderRegistry, SpeechToText, TextGeneration, TextToSpeech};
use odyssey_models::RetryPolicy;
use odyssey_narrative::{InMemoryStoryStore, StoryContext, StoryOrchestrator, TrackedTasks};
use odyssey_server::{ApiState, create_router};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

/// Generator that answers every stage with a valid reply, unless the
/// narrator has been told to fail.
#[derive(Default)]
pub struct StoryTeller {
    narrator_failure: Mutex<Option<GenerationErrorKind>>,
}

impl StoryTeller {
    pub fn fail_narration(&self, kind: GenerationErrorKind) {
        *self.narrator_failure.lock().unwrap() = Some(kind);
    }
}

#[async_trait]
impl TextGeneration for StoryTeller {
    async fn generate(&self, req: &GenerateRequest) -> OdysseyResult<GenerateResponse> {
        let system = req
            .messages
            .first()
            .map(|m| m.content.as_str())
            .unwrap_or_default();

        let reply = if system.starts_with("You are the narrator") {
            if let Some(kind) = self.narrator_failure.lock().unwrap().clone() {
                return Err(GenerationError::new(kind).into());
            }
            json!({
                "text": "Rain hammers the harbour.",
                "choices": ["Run for cover", "Call out", "Stand still"],
                "should_transition": false,
            })
            .to_string()
        } else if system.starts_with("You are the pacing editor") {
            "NEXT_BEAT: A bell rings across the water.\nTRANSITION: no\nPHASE: introduction"
                .to_string()
        } else if system.contains("Plan the story") {
            json!({ "chapters": [
                { "title": "Landfall", "description": "The keeper arrives." },
                { "title": "Undertow", "description": "The rival appears." },
            ]})
            .to_string()
        } else {
            json!({
                "current": { "title": "Landfall", "description": "The keeper arrives." },
                "future": [],
                "modifications": {
                    "current_chapter_modified": false,
                    "future_chapters_modified": false,
                    "new_chapters_added": false,
                    "reasoning": "on track",
                }
            })
            .to_string()
        };
        Ok(GenerateResponse::text(reply))
    }

    fn provider_name(&self) -> &str {
        "story-teller"
    }

    fn model_name(&self) -> &str {
        "fixture"
    }
}

/// Speech provider that hears a fixed line and "speaks" by echoing the
/// voice and text back as bytes.
#[derive(Default)]
pub struct EchoSpeech {
    mime_types: Mutex<Vec<String>>,
}

impl EchoSpeech {
    pub const HEARD: &'static str = "I light the lamp";

    pub fn mime_types(&self) -> Vec<String> {
        self.mime_types.lock().unwrap().clone()
    }
}

#[async_trait]
impl SpeechToText for EchoSpeech {
    async fn transcribe(&self, _audio: Vec<u8>, mime_type: &str) -> OdysseyResult<String> {
        self.mime_types.lock().unwrap().push(mime_type.to_string());
        Ok(Self::HEARD.to_string())
    }
}

#[async_trait]
impl TextToSpeech for EchoSpeech {
    async fn synthesize(&self, text: &str, voice: Option<&str>) -> OdysseyResult<Vec<u8>> {
        Ok(format!("{}:{}", voice.unwrap_or("default"), text).into_bytes())
    }
}

pub struct TestApp {
    pub router: Router,
    pub teller: Arc<StoryTeller>,
    pub speech: Arc<EchoSpeech>,
    pub tasks: Arc<TrackedTasks>,
}

/// App with text and both speech modalities registered.
pub fn test_app() -> TestApp {
    build_app(true)
}

/// App with only text generation registered.
pub fn text_only_app() -> TestApp {
    build_app(false)
}

fn build_app(with_speech: bool) -> TestApp {
    let teller = Arc::new(StoryTeller::default());
    let tasks = Arc::new(TrackedTasks::new());
    let ctx = StoryContext::new(
        Arc::new(InMemoryStoryStore::new()),
        teller.clone(),
        RetryPolicy {
            max_attempts: 1,
            ..RetryPolicy::default()
        },
        tasks.clone(),
        NarrativeSettings::default(),
    );
    let orchestrator = StoryOrchestrator::new(Arc::new(ctx));

    let speech = Arc::new(EchoSpeech::default());
    let mut registry = ProviderRegistry::builder().text(teller.clone());
    if with_speech {
        registry = registry
            .speech_to_text(speech.clone())
            .text_to_speech(speech.clone());
    }
    TestApp {
        router: create_router(ApiState::new(orchestrator, Arc::new(registry.build()))),
        teller,
        speech,
        tasks,
    }
}

pub async fn send(router: &Router, request: Request<Body>) -> anyhow::Result<(StatusCode, Value)> {
    let response: Response<Body> = router.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };
    Ok((status, body))
}

/// Send a request and return the status, content type and raw body.
pub async fn send_raw(
    router: &Router,
    request: Request<Body>,
) -> anyhow::Result<(StatusCode, Option<String>, Vec<u8>)> {
    let response: Response<Body> = router.clone().oneshot(request).await?;
    let status = response.status();
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    Ok((status, content_type, bytes.to_vec()))
}

pub fn post_bytes(uri: &str, content_type: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", content_type)
        .body(Body::from(body))
        .expect("valid request")
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("valid request")
}

pub fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("valid request")
}

pub fn new_story_body() -> Value {
    json!({
        "theme": "redemption",
        "setting": "a drowned city",
        "protagonist": "a disgraced lighthouse keeper",
    })
}
