//! Router tests against the in-memory store and a fixture generator.

mod test_utils;

use axum::http::StatusCode;
use odyssey_error::GenerationErrorKind;
use odyssey_narrative::DeferredTasks;
use serde_json::json;
use test_utils::{
    EchoSpeech, get, new_story_body, post_bytes, post_json, send, send_raw, test_app,
    text_only_app,
};
use uuid::Uuid;

#[tokio::test]
async fn health_reports_service() -> anyhow::Result<()> {
    let app = test_app();
    let (status, body) = send(&app.router, get("/health")).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "odyssey_server");
    assert!(body["version"].is_string());
    assert!(body["timestamp"].is_string());
    Ok(())
}

#[tokio::test]
async fn session_then_turn_then_chapters() -> anyhow::Result<()> {
    let app = test_app();

    let (status, session) = send(&app.router, post_json("/sessions", new_story_body())).await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(session["current_chapter"]["number"], 1);
    assert_eq!(session["current_chapter"]["status"], "current");
    assert_eq!(session["future_chapters"].as_array().map(Vec::len), Some(1));
    assert!(
        session["opening"]
            .as_str()
            .is_some_and(|s| s.ends_with("3. Stand still"))
    );
    let id = session["session_id"].as_str().unwrap_or_default().to_string();

    let (status, turn) = send(
        &app.router,
        post_json(
            &format!("/sessions/{id}/interact"),
            json!({ "message": "I light the lamp" }),
        ),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        turn["response"],
        "Rain hammers the harbour.\n\n1. Run for cover\n2. Call out\n3. Stand still"
    );

    app.tasks.drain().await;

    let (status, chapters) = send(&app.router, get(&format!("/sessions/{id}/chapters"))).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(chapters["history"], json!([]));
    assert_eq!(chapters["current"]["title"], "Landfall");
    assert_eq!(chapters["future"][0]["title"], "Undertow");
    assert_eq!(chapters["future"][0]["number"], 2);
    Ok(())
}

#[tokio::test]
async fn empty_message_is_bad_request() -> anyhow::Result<()> {
    let app = test_app();
    let (_, session) = send(&app.router, post_json("/sessions", new_story_body())).await?;
    let id = session["session_id"].as_str().unwrap_or_default().to_string();

    let (status, body) = send(
        &app.router,
        post_json(&format!("/sessions/{id}/interact"), json!({ "message": "   " })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
    Ok(())
}

#[tokio::test]
async fn empty_theme_is_bad_request() -> anyhow::Result<()> {
    let app = test_app();
    let (status, _) = send(
        &app.router,
        post_json("/sessions", json!({ "theme": "", "setting": "a drowned city" })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn unknown_session_is_not_found() -> anyhow::Result<()> {
    let app = test_app();
    let id = Uuid::new_v4();

    let (status, _) = send(
        &app.router,
        post_json(&format!("/sessions/{id}/interact"), json!({ "message": "hello" })),
    )
    .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app.router, get(&format!("/sessions/{id}/chapters"))).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn generation_failure_is_bad_gateway_without_narration() -> anyhow::Result<()> {
    let app = test_app();
    let (_, session) = send(&app.router, post_json("/sessions", new_story_body())).await?;
    let id = session["session_id"].as_str().unwrap_or_default().to_string();
    app.teller.fail_narration(GenerationErrorKind::HttpStatus {
        status_code: 503,
        message: "Service Unavailable".into(),
    });

    let (status, body) = send(
        &app.router,
        post_json(&format!("/sessions/{id}/interact"), json!({ "message": "hello" })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body.get("response").is_none());
    assert!(body["error"].as_str().is_some_and(|e| e.contains("503")));
    assert_eq!(app.tasks.drain().await.total(), 0);
    Ok(())
}

#[tokio::test]
async fn worlds_are_published_listed_and_played() -> anyhow::Result<()> {
    let app = test_app();
    let mut body = new_story_body();
    body["title"] = json!("The Drowned City");
    body["demo"] = json!(true);
    body["preview_content"] = json!("The bells still ring under the water.");

    let (status, world) = send(&app.router, post_json("/worlds", body)).await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(world["genre"], "adventure");
    assert_eq!(world["theme"], "redemption");
    let world_id = world["id"].as_str().unwrap_or_default().to_string();

    let (status, listing) = send(&app.router, get("/worlds")).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listing["worlds"][0]["id"], world_id.as_str());

    let (status, demos) = send(&app.router, get("/demo-worlds")).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        demos["demo_worlds"][0]["preview_content"],
        "The bells still ring under the water."
    );

    let (status, session) = send(
        &app.router,
        post_json("/sessions", json!({ "world_id": world_id })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(session["current_chapter"]["title"], "Landfall");
    Ok(())
}

#[tokio::test]
async fn unknown_world_is_not_found() -> anyhow::Result<()> {
    let app = test_app();
    let (status, body) = send(
        &app.router,
        post_json("/sessions", json!({ "world_id": Uuid::new_v4() })),
    )
    .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().is_some_and(|e| e.contains("Unknown world")));
    Ok(())
}

#[tokio::test]
async fn world_without_theme_is_bad_request() -> anyhow::Result<()> {
    let app = test_app();
    let (status, _) = send(
        &app.router,
        post_json("/worlds", json!({ "theme": " ", "setting": "a drowned city" })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, listing) = send(&app.router, get("/worlds")).await?;
    assert_eq!(listing["worlds"], json!([]));
    Ok(())
}

#[tokio::test]
async fn speech_round_trips_through_providers() -> anyhow::Result<()> {
    let app = test_app();

    let (status, body) = send(
        &app.router,
        post_bytes("/speech/transcriptions", "audio/wav", vec![0x52, 0x49, 0x46, 0x46]),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["text"], EchoSpeech::HEARD);
    assert_eq!(app.speech.mime_types(), vec!["audio/wav".to_string()]);

    let (status, content_type, audio) = send_raw(
        &app.router,
        post_json("/speech/synthesis", json!({ "text": "Welcome back", "voice": "nova" })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("audio/mpeg"));
    assert_eq!(audio, b"nova:Welcome back".to_vec());
    Ok(())
}

#[tokio::test]
async fn empty_speech_input_is_bad_request() -> anyhow::Result<()> {
    let app = test_app();

    let (status, _) = send(
        &app.router,
        post_bytes("/speech/transcriptions", "audio/wav", Vec::new()),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app.router, post_json("/speech/synthesis", json!({ "text": "" }))).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(app.speech.mime_types().is_empty());
    Ok(())
}

#[tokio::test]
async fn missing_speech_provider_is_server_error() -> anyhow::Result<()> {
    let app = text_only_app();

    let (status, body) = send(
        &app.router,
        post_bytes("/speech/transcriptions", "audio/wav", vec![1, 2, 3]),
    )
    .await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().is_some_and(|e| e.contains("No provider registered")));

    let (status, _) = send(&app.router, post_json("/speech/synthesis", json!({ "text": "hi" }))).await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    Ok(())
}
