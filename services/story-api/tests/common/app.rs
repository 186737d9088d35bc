//! In-process test application

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;
use wiremock::MockServer;

use histoires_billing_core::BillingConfig;
use histoires_db::memory::MemoryStore;
use histoires_db::StoryRow;
use histoires_story_core::{ElevenLabsConfig, OpenAiConfig};
use histoires_types::{usage_period, PriceId, UserId};
use story_api::{build_router, AppState, Config};

pub const JWT_SECRET: &str = "test-secret-that-is-long-enough-0123456789";
pub const TEST_EMAIL: &str = "parent@example.com";
pub const TEST_CUSTOMER: &str = "cus_test123";
pub const TEST_VOICE: &str = "voice-default";

/// Router over in-memory stores with mocked providers
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub openai: MockServer,
    pub elevenlabs: MockServer,
    pub stripe: MockServer,
}

/// A decoded response
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    pub fn error_code(&self) -> &str {
        self.body["error"]["code"].as_str().unwrap_or_default()
    }
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(|_| {}).await
    }

    /// Spawn after adjusting the configuration
    pub async fn spawn_with(configure: impl FnOnce(&mut Config)) -> Self {
        Self::build(configure, None).await
    }

    /// Spawn serving an SPA index document
    pub async fn spawn_with_spa(index: &str) -> Self {
        Self::build(|_| {}, Some(index)).await
    }

    async fn build(configure: impl FnOnce(&mut Config), spa_index: Option<&str>) -> Self {
        let openai = MockServer::start().await;
        let elevenlabs = MockServer::start().await;
        let stripe = MockServer::start().await;

        let mut config = Config::new("postgres://unused", JWT_SECRET);
        config.openai = OpenAiConfig::new(Some("sk-test".to_string())).with_base_url(openai.uri());
        config.elevenlabs = ElevenLabsConfig::new(Some("el-test".to_string()), TEST_VOICE)
            .with_base_url(elevenlabs.uri());
        config.billing = BillingConfig::new(Some("sk_test_mock".to_string()))
            .with_api_base(stripe.uri())
            .with_app_url("https://histoires.example")
            .with_default_price(Some(PriceId::new("price_default")));
        configure(&mut config);

        let (store, stores) = MemoryStore::new();
        let mut state = AppState::new(config, stores).expect("valid test config");
        if let Some(index) = spa_index {
            state = state.with_spa_index(index);
        }

        Self {
            router: build_router(state, None),
            store,
            openai,
            elevenlabs,
            stripe,
        }
    }

    /// Send a request, optionally authenticated and with a JSON body
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.send(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.send(Method::POST, uri, token, Some(body)).await
    }

    /// Set the caller's counters for the current period
    pub fn set_usage(&self, user: UserId, stories: i32, downloads: i32, audio: i32) {
        self.store
            .set_usage(user.0, &usage_period(Utc::now()), stories, downloads, audio);
    }

    /// Insert a story owned by `owner`
    pub fn insert_story(&self, owner: UserId, title: &str, content: &str, is_public: bool) -> Uuid {
        let id = Uuid::new_v4();
        let now = Utc::now();
        self.store.insert_story(StoryRow {
            id,
            owner_id: owner.0,
            title: title.to_string(),
            theme: "dinosaures".to_string(),
            tone: None,
            child_name: "Emma".to_string(),
            child_age: 6,
            content: content.to_string(),
            illustration_url: None,
            audio_url: None,
            is_public,
            created_at: now,
            updated_at: now,
        });
        id
    }
}

/// A signed access token for `user`
pub fn token_for(user: UserId, email: Option<&str>) -> String {
    let claims = json!({
        "sub": user.to_string(),
        "email": email,
        "exp": (Utc::now() + Duration::hours(1)).timestamp(),
        "aud": "authenticated",
        "role": "authenticated",
    });
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap()
}

/// A new user and their token
pub fn new_user() -> (UserId, String) {
    let user = UserId::new();
    (user, token_for(user, Some(TEST_EMAIL)))
}
