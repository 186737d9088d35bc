//! Subscription, usage and provider-backed media through the HTTP API

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::*;
use histoires_types::UserId;

#[tokio::test]
async fn test_subscription_check_upgrades_limits() {
    let app = TestApp::spawn().await;
    mount_customer_lookup(&app.stripe, true).await;
    mount_active_subscription(&app.stripe, 1_999).await;
    let (_, token) = new_user();

    let res = app
        .post("/api/v1/billing/subscription/check", Some(&token), json!({}))
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["subscribed"], true);
    assert_eq!(res.body["subscriptionTier"], "premium");
    assert_eq!(res.body["tierLabel"], "Premium");

    let usage = app.get("/api/v1/usage", Some(&token)).await;
    assert_eq!(usage.body["tier"], "premium");
    assert_eq!(usage.body["limits"]["stories"], 100);
    assert!(usage.body["limits"]["downloads"].is_null());
    assert!(usage.body["remaining"]["downloads"].is_null());

    let stored = app.get("/api/v1/billing/subscription", Some(&token)).await;
    assert_eq!(stored.body["subscribed"], true);
}

#[tokio::test]
async fn test_unknown_customer_is_free() {
    let app = TestApp::spawn().await;
    mount_customer_lookup(&app.stripe, false).await;
    let (_, token) = new_user();

    let res = app
        .post("/api/v1/billing/subscription/check", Some(&token), json!({}))
        .await;
    assert_eq!(res.body["subscribed"], false);
    assert_eq!(res.body["tier"], "free");
    assert_eq!(res.body["tierLabel"], "Gratuit");

    let res = app.post("/api/v1/billing/portal", Some(&token), json!({})).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_checkout_returns_session_url() {
    let app = TestApp::spawn().await;
    mount_customer_lookup(&app.stripe, true).await;
    mount_checkout(&app.stripe).await;
    let (_, token) = new_user();

    let res = app.post("/api/v1/billing/checkout", Some(&token), json!({})).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["sessionId"], "cs_test");
    assert_eq!(res.body["url"], "https://checkout.stripe.test/cs_test");
}

#[tokio::test]
async fn test_billing_needs_an_email() {
    let app = TestApp::spawn().await;
    let token = token_for(UserId::new(), None);

    let res = app.post("/api/v1/billing/checkout", Some(&token), json!({})).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(app.stripe.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn test_missing_stripe_key_is_reported_with_category() {
    let app = TestApp::spawn_with(|config| {
        config.billing = histoires_billing_core::BillingConfig::new(None);
    })
    .await;
    let (_, token) = new_user();

    let res = app.post("/api/v1/billing/portal", Some(&token), json!({})).await;
    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.body["error"]["message"], "STRIPE_SECRET_KEY is not set");
    assert_eq!(res.body["error"]["details"]["category"], "api_key_missing");
}

#[tokio::test]
async fn test_downloads_are_counted_up_to_the_free_limit() {
    let app = TestApp::spawn().await;
    let (user, token) = new_user();
    app.set_usage(user, 0, 4, 0);

    let res = app.post("/api/v1/usage/downloads", Some(&token), json!({})).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["downloadsCount"], 5);
    assert_eq!(res.body["canDownload"], false);
    assert_eq!(res.body["remaining"]["downloads"], 0);

    let res = app.post("/api/v1/usage/downloads", Some(&token), json!({})).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    assert_eq!(res.error_code(), "QUOTA_EXCEEDED");
}

#[tokio::test]
async fn test_audio_is_synthesized_and_counted() {
    let app = TestApp::spawn().await;
    mount_speech(&app.elevenlabs, 1).await;
    let (user, token) = new_user();
    app.set_usage(user, 0, 0, 2);

    let res = app
        .post("/api/v1/audio", Some(&token), json!({ "text": "Il était une fois." }))
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["audioContent"], "AQIDBA==");
    assert_eq!(res.body["contentType"], "audio/mpeg");
    assert_eq!(res.body["usage"]["audioCount"], 3);

    // Free audio limit reached: rejected without calling the provider again
    let res = app
        .post("/api/v1/audio", Some(&token), json!({ "text": "Encore !" }))
        .await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    let res = app.post("/api/v1/audio", Some(&token), json!({ "text": "  " })).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_illustration_is_cached_and_attached() {
    let app = TestApp::spawn().await;
    mount_image(&app.openai, "https://images.test/emma.png", 1).await;
    let (owner, token) = new_user();
    let (_, stranger) = new_user();
    let id = app.insert_story(owner, "Mine", "Emma rencontre un dinosaure.", false);

    let body = json!({ "text": "Emma rencontre un dinosaure.", "storyId": id });
    let res = app.post("/api/v1/illustrations", Some(&token), body.clone()).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["imageUrl"], "https://images.test/emma.png");
    assert_eq!(res.body["cached"], false);
    assert_eq!(res.body["attached"], true);

    let res = app.post("/api/v1/illustrations", Some(&stranger), body).await;
    assert_eq!(res.body["cached"], true);
    assert_eq!(res.body["attached"], false);

    let story = app.get(&format!("/api/v1/stories/{id}"), Some(&token)).await;
    assert_eq!(story.body["illustrationUrl"], "https://images.test/emma.png");
}
