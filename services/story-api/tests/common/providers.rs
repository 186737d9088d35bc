//! Provider mocks (OpenAI, ElevenLabs, Stripe)

use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::app::{TEST_CUSTOMER, TEST_EMAIL, TEST_VOICE};

/// Moderation flags any input containing this marker
pub const FLAG_MARKER: &str = "CONTENU_INTERDIT";

pub const EMMA_STORY: &str = "Titre : Emma et le petit tricératops\n\
Emma marche dans la forêt. Elle trouve un œuf ! Un bébé tricératops en sort. \
Ils deviennent amis.";

/// Moderation endpoint flagging [`FLAG_MARKER`]
pub async fn mount_moderation(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/moderations"))
        .and(body_string_contains(FLAG_MARKER))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{ "flagged": true, "categories": { "violence": true } }]
        })))
        .with_priority(1)
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/moderations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{ "flagged": false, "categories": {} }]
        })))
        .mount(server)
        .await;
}

/// Chat completion returning `text`, expected `calls` times
pub async fn mount_completion(server: &MockServer, text: &str, calls: u64) {
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "gpt-4o-mini",
            "choices": [{ "message": { "role": "assistant", "content": text } }]
        })))
        .expect(calls)
        .mount(server)
        .await;
}

/// Image generation returning `url`, expected `calls` times
pub async fn mount_image(server: &MockServer, url: &str, calls: u64) {
    Mock::given(method("POST"))
        .and(path("/images/generations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{ "url": url }]
        })))
        .expect(calls)
        .mount(server)
        .await;
}

/// Text-to-speech on the default voice returning four bytes of MP3
pub async fn mount_speech(server: &MockServer, calls: u64) {
    Mock::given(method("POST"))
        .and(path(format!("/text-to-speech/{TEST_VOICE}")))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "audio/mpeg")
                .set_body_bytes(vec![1u8, 2, 3, 4]),
        )
        .expect(calls)
        .mount(server)
        .await;
}

/// Stripe customer lookup by [`TEST_EMAIL`]
pub async fn mount_customer_lookup(server: &MockServer, found: bool) {
    let data = if found {
        json!([{ "id": TEST_CUSTOMER, "email": TEST_EMAIL }])
    } else {
        json!([])
    };
    Mock::given(method("GET"))
        .and(path("/customers"))
        .and(query_param("email", TEST_EMAIL))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "list",
            "data": data,
            "has_more": false
        })))
        .mount(server)
        .await;
}

/// One active subscription priced at `amount` cents
pub async fn mount_active_subscription(server: &MockServer, amount: i64) {
    Mock::given(method("GET"))
        .and(path("/subscriptions"))
        .and(query_param("customer", TEST_CUSTOMER))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "list",
            "data": [{
                "id": "sub_test",
                "status": "active",
                "current_period_end": 1_900_000_000,
                "items": {
                    "object": "list",
                    "data": [{ "price": { "id": "price_x", "unit_amount": amount } }],
                    "has_more": false
                }
            }],
            "has_more": false
        })))
        .mount(server)
        .await;
}

/// Checkout session creation
pub async fn mount_checkout(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/checkout/sessions"))
        .and(body_string_contains("mode=subscription"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "cs_test",
            "url": "https://checkout.stripe.test/cs_test"
        })))
        .mount(server)
        .await;
}
