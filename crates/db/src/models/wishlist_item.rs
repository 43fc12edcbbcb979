use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;

use super::product::ProductKind;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq, TS)]
#[serde(rename_all = "camelCase")]
pub struct WishlistItem {
    #[serde(skip)]
    #[ts(skip)]
    pub session_id: String,
    pub product_id: i64,
    #[serde(rename = "type")]
    pub kind: ProductKind,
    pub added_at: DateTime<Utc>,
}

impl WishlistItem {
    /// Returns `None` when the product is already on the session's wishlist.
    pub async fn create(
        pool: &SqlitePool,
        session_id: &str,
        product_id: i64,
        kind: ProductKind,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, WishlistItem>(
            r#"INSERT INTO wishlist_items (session_id, product_id, kind, added_at)
               VALUES (?, ?, ?, ?)
               ON CONFLICT (session_id, product_id, kind) DO NOTHING
               RETURNING session_id, product_id, kind, added_at"#,
        )
        .bind(session_id)
        .bind(product_id)
        .bind(kind)
        .bind(Utc::now())
        .fetch_optional(pool)
        .await
    }

    pub async fn find_by_session(
        pool: &SqlitePool,
        session_id: &str,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, WishlistItem>(
            r#"SELECT session_id, product_id, kind, added_at
               FROM wishlist_items
               WHERE session_id = ?
               ORDER BY added_at DESC"#,
        )
        .bind(session_id)
        .fetch_all(pool)
        .await
    }

    pub async fn delete(
        pool: &SqlitePool,
        session_id: &str,
        product_id: i64,
        kind: ProductKind,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM wishlist_items WHERE session_id = ? AND product_id = ? AND kind = ?",
        )
        .bind(session_id)
        .bind(product_id)
        .bind(kind)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
