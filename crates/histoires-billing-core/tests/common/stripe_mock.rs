//! Mock Stripe API for integration testing

use serde_json::json;
use wiremock::matchers::{body_string_contains, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use histoires_billing_core::BillingConfig;
use histoires_types::PriceId;

pub const TEST_EMAIL: &str = "parent@example.com";
pub const TEST_CUSTOMER: &str = "cus_test123";

/// Mock Stripe server
pub struct StripeMockServer {
    pub server: MockServer,
}

impl StripeMockServer {
    /// Start a mock server with no routes mounted
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Billing config pointing at this server
    pub fn config(&self) -> BillingConfig {
        BillingConfig::new(Some("sk_test_mock".to_string()))
            .with_api_base(self.server.uri())
            .with_app_url("https://histoires.example")
            .with_default_price(Some(PriceId::new("price_default")))
    }

    /// `GET /customers?email=` returns the given customer, or none
    pub async fn mount_customer_lookup(&self, customer: Option<&str>) {
        let data = match customer {
            Some(id) => json!([{ "id": id, "email": TEST_EMAIL }]),
            None => json!([]),
        };
        Mock::given(method("GET"))
            .and(path("/customers"))
            .and(query_param("email", TEST_EMAIL))
            .and(header_exists("authorization"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "object": "list",
                "data": data,
                "has_more": false
            })))
            .mount(&self.server)
            .await;
    }

    /// `GET /subscriptions` returns one active subscription at `amount` cents, or none
    pub async fn mount_active_subscription(&self, amount: Option<i64>) {
        let data = match amount {
            Some(amount) => json!([{
                "id": "sub_test",
                "status": "active",
                "current_period_end": 1_900_000_000,
                "items": {
                    "object": "list",
                    "data": [{ "price": { "id": "price_x", "unit_amount": amount } }],
                    "has_more": false
                }
            }]),
            None => json!([]),
        };
        Mock::given(method("GET"))
            .and(path("/subscriptions"))
            .and(query_param("customer", TEST_CUSTOMER))
            .and(query_param("status", "active"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "object": "list",
                "data": data,
                "has_more": false
            })))
            .mount(&self.server)
            .await;
    }

    /// `POST /customers` creates [`TEST_CUSTOMER`]
    pub async fn mount_create_customer(&self) {
        Mock::given(method("POST"))
            .and(path("/customers"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "id": TEST_CUSTOMER, "email": TEST_EMAIL })),
            )
            .expect(1)
            .mount(&self.server)
            .await;
    }

    /// `POST /checkout/sessions` for the given price
    pub async fn mount_checkout(&self, price: &str) {
        Mock::given(method("POST"))
            .and(path("/checkout/sessions"))
            .and(body_string_contains("mode=subscription"))
            .and(body_string_contains(format!("line_items%5B0%5D%5Bprice%5D={price}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "cs_test",
                "url": "https://checkout.stripe.test/cs_test"
            })))
            .mount(&self.server)
            .await;
    }

    /// `POST /billing_portal/sessions`
    pub async fn mount_portal(&self) {
        Mock::given(method("POST"))
            .and(path("/billing_portal/sessions"))
            .and(body_string_contains(format!("customer={TEST_CUSTOMER}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "bps_test",
                "url": "https://billing.stripe.test/session"
            })))
            .mount(&self.server)
            .await;
    }

    /// Every request fails with Stripe's invalid key error
    pub async fn mount_invalid_key(&self) {
        Mock::given(wiremock::matchers::any())
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": {
                    "type": "invalid_request_error",
                    "message": "Invalid API Key provided: sk_test_****mock"
                }
            })))
            .mount(&self.server)
            .await;
    }
}
