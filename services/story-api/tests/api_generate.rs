//! Story generation through the HTTP API

mod common;

use std::time::Duration;

use axum::http::{header, StatusCode};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use common::*;

fn emma(customization: Option<&str>) -> serde_json::Value {
    json!({
        "childName": "Emma",
        "childAge": 6,
        "theme": "dinosaures",
        "customization": customization,
    })
}

#[tokio::test]
async fn test_generation_requires_authentication() {
    let app = TestApp::spawn().await;

    let res = app.post("/api/v1/stories/generate", None, emma(None)).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.body["error"]["message"], "Authentication required");

    let res = app
        .post("/api/v1/stories/generate", Some("not-a-token"), emma(None))
        .await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.body["error"]["message"], "Authentication required");
}

#[tokio::test]
async fn test_story_is_generated_saved_and_counted() {
    let app = TestApp::spawn().await;
    mount_moderation(&app.openai).await;
    mount_completion(&app.openai, EMMA_STORY, 1).await;
    let (_, token) = new_user();

    let res = app
        .post("/api/v1/stories/generate", Some(&token), emma(None))
        .await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["blocked"], false);
    assert!(res.body["title"].as_str().unwrap().contains("Emma"));
    assert!(res.body["story"].as_str().unwrap().starts_with("Emma marche"));
    assert_eq!(res.body["metadata"]["ageBracket"], "middle");
    assert_eq!(res.body["usage"]["storiesCount"], 1);
    assert_eq!(app.store.story_count(), 1);

    // Saved privately and readable page by page by its owner
    let id = res.body["storyId"].as_str().unwrap().to_string();
    let pages = app
        .get(&format!("/api/v1/stories/{id}/pages"), Some(&token))
        .await;
    assert_eq!(pages.status, StatusCode::OK);
    assert_eq!(pages.body["pageCount"], 2);
    assert_eq!(pages.body["pages"][0]["index"], 0);

    let anonymous = app.get(&format!("/api/v1/stories/{id}"), None).await;
    assert_eq!(anonymous.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_flagged_input_is_refused_and_free() {
    let app = TestApp::spawn().await;
    mount_moderation(&app.openai).await;
    mount_completion(&app.openai, EMMA_STORY, 0).await;
    let (_, token) = new_user();

    let res = app
        .post(
            "/api/v1/stories/generate",
            Some(&token),
            emma(Some(FLAG_MARKER)),
        )
        .await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["blocked"], true);
    assert_eq!(res.body["title"], "Une nouvelle aventure pour Emma");
    assert_eq!(res.body["story"], histoires_story_core::REFUSAL_MESSAGE);
    assert!(res.body.get("storyId").is_none());
    assert_eq!(app.store.story_count(), 0);

    let usage = app.get("/api/v1/usage", Some(&token)).await;
    assert_eq!(usage.body["storiesCount"], 0);
}

#[tokio::test]
async fn test_free_user_at_limit_is_rejected_before_any_provider_call() {
    let app = TestApp::spawn().await;
    let (user, token) = new_user();
    app.set_usage(user, 10, 0, 0);

    let usage = app.get("/api/v1/usage", Some(&token)).await;
    assert_eq!(usage.body["canCreateStory"], false);

    let res = app
        .post("/api/v1/stories/generate", Some(&token), emma(None))
        .await;

    assert_eq!(res.status, StatusCode::FORBIDDEN);
    assert_eq!(res.error_code(), "QUOTA_EXCEEDED");
    assert_eq!(res.body["error"]["details"]["limit"], 10);
    assert!(app.openai.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn test_missing_fields_are_bad_requests() {
    let app = TestApp::spawn().await;
    let (_, token) = new_user();

    let res = app
        .post(
            "/api/v1/stories/generate",
            Some(&token),
            json!({ "childAge": 6, "theme": "espace" }),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["error"]["message"], "childName is required");

    let res = app
        .post(
            "/api/v1/stories/generate",
            Some(&token),
            json!({ "childName": "Léo", "theme": "espace" }),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    assert!(app.openai.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn test_missing_openai_key_is_reported_with_category() {
    let app = TestApp::spawn_with(|config| {
        config.openai = histoires_story_core::OpenAiConfig::new(None);
    })
    .await;
    let (_, token) = new_user();

    let res = app
        .post("/api/v1/stories/generate", Some(&token), emma(None))
        .await;

    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.error_code(), "PROVIDER_ERROR");
    assert_eq!(res.body["error"]["message"], "OPENAI_API_KEY is not set");
    assert_eq!(res.body["error"]["details"]["category"], "api_key_missing");
}

#[tokio::test]
async fn test_generation_is_rate_limited_per_user() {
    let app = TestApp::spawn_with(|config| config.story_rate_limit = 1).await;
    mount_moderation(&app.openai).await;
    mount_completion(&app.openai, EMMA_STORY, 2).await;
    let (_, token) = new_user();
    let (_, other) = new_user();

    let first = app
        .post("/api/v1/stories/generate", Some(&token), emma(None))
        .await;
    assert_eq!(first.status, StatusCode::OK);

    let second = app
        .post("/api/v1/stories/generate", Some(&token), emma(None))
        .await;
    assert_eq!(second.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(second.error_code(), "RATE_LIMITED");
    assert!(second.headers.contains_key(header::RETRY_AFTER));

    let other = app
        .post("/api/v1/stories/generate", Some(&other), emma(None))
        .await;
    assert_eq!(other.status, StatusCode::OK);
}

#[tokio::test]
async fn test_slow_provider_times_out_without_consuming_quota() {
    let app = TestApp::spawn_with(|config| {
        config.request_timeout = Duration::from_millis(200);
    })
    .await;
    Mock::given(method("POST"))
        .and(path("/moderations"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "results": [{ "flagged": false, "categories": {} }] }))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&app.openai)
        .await;
    let (_, token) = new_user();

    let res = app
        .post("/api/v1/stories/generate", Some(&token), emma(None))
        .await;
    assert_eq!(res.status, StatusCode::REQUEST_TIMEOUT);

    let usage = app.get("/api/v1/usage", Some(&token)).await;
    assert_eq!(usage.body["storiesCount"], 0);
}
