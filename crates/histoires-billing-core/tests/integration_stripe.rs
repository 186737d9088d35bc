//! Integration tests for subscription resolution against a mock Stripe API

mod common;

use std::sync::Arc;

use common::stripe_mock::{TEST_CUSTOMER, TEST_EMAIL};
use common::StripeMockServer;
use histoires_billing_core::{BillingConfig, BillingError, StripeProvider, SubscriptionService};
use histoires_db::memory::MemoryStore;
use histoires_types::{PriceId, Tier, UserId};

fn service(config: BillingConfig) -> SubscriptionService {
    let (_, stores) = MemoryStore::new();
    SubscriptionService::new(
        Arc::new(StripeProvider::new(config.clone())),
        stores.subscribers,
        config,
    )
}

#[tokio::test]
async fn test_no_customer_is_free() {
    let mock = StripeMockServer::start().await;
    mock.mount_customer_lookup(None).await;
    let service = service(mock.config());
    let user = UserId::new();

    let state = service.check(&user, TEST_EMAIL).await.unwrap();

    assert!(!state.subscribed);
    assert_eq!(state.effective_tier(), Tier::Free);
    assert_eq!(service.tier(&user).await.unwrap(), Tier::Free);
}

#[tokio::test]
async fn test_active_subscription_maps_amount_to_tier() {
    for (amount, expected) in [(499, Tier::Basic), (1_499, Tier::Premium), (4_999, Tier::Enterprise)] {
        let mock = StripeMockServer::start().await;
        mock.mount_customer_lookup(Some(TEST_CUSTOMER)).await;
        mock.mount_active_subscription(Some(amount)).await;
        let service = service(mock.config());
        let user = UserId::new();

        let state = service.check(&user, TEST_EMAIL).await.unwrap();

        assert!(state.subscribed);
        assert_eq!(state.tier, Some(expected));
        assert_eq!(state.customer_id.as_ref().map(|c| c.as_str()), Some(TEST_CUSTOMER));
        assert!(state.subscription_end.is_some());
        assert_eq!(service.tier(&user).await.unwrap(), expected);
    }
}

#[tokio::test]
async fn test_customer_without_active_subscription_is_free() {
    let mock = StripeMockServer::start().await;
    mock.mount_customer_lookup(Some(TEST_CUSTOMER)).await;
    mock.mount_active_subscription(None).await;
    let service = service(mock.config());
    let user = UserId::new();

    let state = service.check(&user, TEST_EMAIL).await.unwrap();

    assert!(!state.subscribed);
    assert_eq!(state.customer_id.as_ref().map(|c| c.as_str()), Some(TEST_CUSTOMER));
    let cached = service.cached_state(&user).await.unwrap().unwrap();
    assert_eq!(cached.email, TEST_EMAIL);
}

#[tokio::test]
async fn test_checkout_creates_missing_customer() {
    let mock = StripeMockServer::start().await;
    mock.mount_customer_lookup(None).await;
    mock.mount_create_customer().await;
    mock.mount_checkout("price_default").await;
    let service = service(mock.config());

    let session = service.checkout(TEST_EMAIL, None).await.unwrap();

    assert_eq!(session.session_id, "cs_test");
    assert_eq!(session.url, "https://checkout.stripe.test/cs_test");
}

#[tokio::test]
async fn test_checkout_with_requested_price() {
    let mock = StripeMockServer::start().await;
    mock.mount_customer_lookup(Some(TEST_CUSTOMER)).await;
    mock.mount_checkout("price_premium").await;
    let service = service(mock.config());

    let session = service
        .checkout(TEST_EMAIL, Some(PriceId::new("price_premium")))
        .await
        .unwrap();
    assert_eq!(session.session_id, "cs_test");
}

#[tokio::test]
async fn test_portal_requires_customer() {
    let mock = StripeMockServer::start().await;
    mock.mount_customer_lookup(None).await;
    let service = service(mock.config());

    let err = service.portal(TEST_EMAIL).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_portal_session() {
    let mock = StripeMockServer::start().await;
    mock.mount_customer_lookup(Some(TEST_CUSTOMER)).await;
    mock.mount_portal().await;
    let service = service(mock.config());

    let portal = service.portal(TEST_EMAIL).await.unwrap();
    assert_eq!(portal.url, "https://billing.stripe.test/session");
}

#[tokio::test]
async fn test_provider_error_keeps_stripe_message() {
    let mock = StripeMockServer::start().await;
    mock.mount_invalid_key().await;
    let service = service(mock.config());

    let err = service.check(&UserId::new(), TEST_EMAIL).await.unwrap_err();
    assert!(err.is_provider_error());
    assert!(err.to_string().contains("Invalid API Key"));
}

#[tokio::test]
async fn test_missing_key_fails_before_any_request() {
    let mock = StripeMockServer::start().await;
    let config = BillingConfig::new(None).with_api_base(mock.server.uri());
    let service = service(config);

    let err = service.portal(TEST_EMAIL).await.unwrap_err();
    assert!(matches!(err, BillingError::MissingApiKey));
    assert!(mock.server.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn test_checkout_without_price_fails() {
    let mock = StripeMockServer::start().await;
    let config = mock.config().with_default_price(None);
    let service = service(config);

    let err = service.checkout(TEST_EMAIL, None).await.unwrap_err();
    assert!(matches!(err, BillingError::MissingPrice));
}
