use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;

/// Newsletter subscription keyed by case-insensitive email
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub email: String,
    pub subscribed_at: DateTime<Utc>,
}

impl Subscription {
    /// Returns `None` if the email is already subscribed.
    pub async fn create(pool: &SqlitePool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Subscription>(
            r#"INSERT INTO newsletter_subscriptions (email, subscribed_at)
               VALUES (?, ?)
               ON CONFLICT (email) DO NOTHING
               RETURNING email, subscribed_at"#,
        )
        .bind(email)
        .bind(Utc::now())
        .fetch_optional(pool)
        .await
    }

    pub async fn count(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM newsletter_subscriptions")
            .fetch_one(pool)
            .await
    }
}
