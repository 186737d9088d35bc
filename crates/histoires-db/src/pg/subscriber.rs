//! PostgreSQL subscriber repository implementation

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::SubscriberRow;
use crate::repo::{SubscriberRepository, UpsertSubscriber};

/// PostgreSQL subscriber repository
#[derive(Clone)]
pub struct PgSubscriberRepository {
    pool: PgPool,
}

impl PgSubscriberRepository {
    /// Create a new subscriber repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriberRepository for PgSubscriberRepository {
    async fn find_by_email(&self, email: &str) -> DbResult<Option<SubscriberRow>> {
        let row = sqlx::query_as::<_, SubscriberRow>(
            r#"
            SELECT email, user_id, subscribed, subscription_tier, subscription_end,
                   stripe_customer_id, updated_at
            FROM subscribers
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn find_by_user_id(&self, user_id: Uuid) -> DbResult<Option<SubscriberRow>> {
        let row = sqlx::query_as::<_, SubscriberRow>(
            r#"
            SELECT email, user_id, subscribed, subscription_tier, subscription_end,
                   stripe_customer_id, updated_at
            FROM subscribers
            WHERE user_id = $1
            ORDER BY updated_at DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn upsert(&self, sub: UpsertSubscriber) -> DbResult<SubscriberRow> {
        let row = sqlx::query_as::<_, SubscriberRow>(
            r#"
            INSERT INTO subscribers (email, user_id, subscribed, subscription_tier,
                                     subscription_end, stripe_customer_id, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, NOW())
            ON CONFLICT (email) DO UPDATE SET
                user_id = COALESCE(EXCLUDED.user_id, subscribers.user_id),
                subscribed = EXCLUDED.subscribed,
                subscription_tier = EXCLUDED.subscription_tier,
                subscription_end = EXCLUDED.subscription_end,
                stripe_customer_id = EXCLUDED.stripe_customer_id,
                updated_at = NOW()
            RETURNING email, user_id, subscribed, subscription_tier, subscription_end,
                      stripe_customer_id, updated_at
            "#,
        )
        .bind(&sub.email)
        .bind(sub.user_id)
        .bind(sub.subscribed)
        .bind(&sub.subscription_tier)
        .bind(sub.subscription_end)
        .bind(&sub.stripe_customer_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }
}
