use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;

use super::product::ProductKind;

/// Largest quantity a single line item may hold.
pub const MAX_LINE_QUANTITY: i64 = 1_000_000;

/// One cart entry for a (product, size, color) combination
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq, TS)]
#[serde(rename_all = "camelCase")]
pub struct CartLineItem {
    pub composite_id: String,
    #[serde(skip)]
    #[ts(skip)]
    pub session_id: String,
    pub product_id: i64,
    pub title: String,
    pub image: String,
    pub price_display: String,
    pub price_value: f64,
    pub size: String,
    pub color: String,
    pub quantity: i64,
    #[serde(rename = "type")]
    pub kind: ProductKind,
    pub added_at: DateTime<Utc>,
}

impl CartLineItem {
    pub fn line_total(&self) -> f64 {
        self.price_value * self.quantity as f64
    }

    pub fn matches(&self, key: &CompositeKey) -> bool {
        self.product_id == key.product_id && self.size == key.size && self.color == key.color
    }
}

/// Identity used to decide whether an add merges into an existing line item
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompositeKey {
    pub product_id: i64,
    pub size: String,
    pub color: String,
}

/// Everything needed to create a line item; the store assigns nothing else
#[derive(Debug, Clone)]
pub struct NewCartLineItem {
    pub product_id: i64,
    pub title: String,
    pub image: String,
    pub price_display: String,
    pub price_value: f64,
    pub size: String,
    pub color: String,
    pub quantity: i64,
    pub kind: ProductKind,
    pub added_at: DateTime<Utc>,
}

impl NewCartLineItem {
    pub fn key(&self) -> CompositeKey {
        CompositeKey {
            product_id: self.product_id,
            size: self.size.clone(),
            color: self.color.clone(),
        }
    }

    /// `{productId}-{size}-{color}-{addedAtMillis}`. Dashes inside size and
    /// color are escaped so that distinct keys never produce the same id.
    pub fn composite_id(&self) -> String {
        format!(
            "{}-{}-{}-{}",
            self.product_id,
            escape_id_part(&self.size),
            escape_id_part(&self.color),
            self.added_at.timestamp_millis()
        )
    }

    pub fn into_line_item(self, session_id: &str) -> CartLineItem {
        CartLineItem {
            composite_id: self.composite_id(),
            session_id: session_id.to_string(),
            product_id: self.product_id,
            title: self.title,
            image: self.image,
            price_display: self.price_display,
            price_value: self.price_value,
            size: self.size,
            color: self.color,
            quantity: self.quantity,
            kind: self.kind,
            added_at: self.added_at,
        }
    }
}

fn escape_id_part(part: &str) -> String {
    let mut escaped = String::with_capacity(part.len());
    for c in part.chars() {
        match c {
            '~' => escaped.push_str("~~"),
            '-' => escaped.push_str("~d"),
            c => escaped.push(c),
        }
    }
    escaped
}

const CART_COLUMNS: &str = "composite_id, session_id, product_id, title, image, price_display, \
     price_value, size, color, quantity, kind, added_at";

impl CartLineItem {
    /// Insert `item`, or add its quantity to the row with the same composite
    /// key. Runs as a single statement, so concurrent calls never lose an
    /// increment.
    ///
    /// Returns `None` when the merged quantity would exceed
    /// [`MAX_LINE_QUANTITY`]; the stored row is left unchanged.
    pub async fn upsert(
        pool: &SqlitePool,
        session_id: &str,
        item: &NewCartLineItem,
    ) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!(
            r#"INSERT INTO cart_items ({CART_COLUMNS})
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
               ON CONFLICT (session_id, product_id, size, color)
               DO UPDATE SET quantity = cart_items.quantity + excluded.quantity
               WHERE cart_items.quantity + excluded.quantity <= {MAX_LINE_QUANTITY}
               RETURNING {CART_COLUMNS}"#
        );
        sqlx::query_as::<_, CartLineItem>(&sql)
            .bind(item.composite_id())
            .bind(session_id)
            .bind(item.product_id)
            .bind(&item.title)
            .bind(&item.image)
            .bind(&item.price_display)
            .bind(item.price_value)
            .bind(&item.size)
            .bind(&item.color)
            .bind(item.quantity)
            .bind(item.kind)
            .bind(item.added_at)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_key(
        pool: &SqlitePool,
        session_id: &str,
        key: &CompositeKey,
    ) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!(
            "SELECT {CART_COLUMNS} FROM cart_items
             WHERE session_id = ? AND product_id = ? AND size = ? AND color = ?"
        );
        sqlx::query_as::<_, CartLineItem>(&sql)
            .bind(session_id)
            .bind(key.product_id)
            .bind(&key.size)
            .bind(&key.color)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_session(
        pool: &SqlitePool,
        session_id: &str,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let sql = format!(
            "SELECT {CART_COLUMNS} FROM cart_items
             WHERE session_id = ?
             ORDER BY added_at ASC, composite_id ASC"
        );
        sqlx::query_as::<_, CartLineItem>(&sql)
            .bind(session_id)
            .fetch_all(pool)
            .await
    }

    pub async fn update_quantity(
        pool: &SqlitePool,
        session_id: &str,
        composite_id: &str,
        quantity: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!(
            "UPDATE cart_items SET quantity = ?
             WHERE session_id = ? AND composite_id = ?
             RETURNING {CART_COLUMNS}"
        );
        sqlx::query_as::<_, CartLineItem>(&sql)
            .bind(quantity)
            .bind(session_id)
            .bind(composite_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(
        pool: &SqlitePool,
        session_id: &str,
        composite_id: &str,
    ) -> Result<u64, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM cart_items WHERE session_id = ? AND composite_id = ?")
                .bind(session_id)
                .bind(composite_id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete_by_session(pool: &SqlitePool, session_id: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM cart_items WHERE session_id = ?")
            .bind(session_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
