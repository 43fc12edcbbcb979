//! Storage seam for cart line items.

use std::collections::HashMap;

use async_trait::async_trait;
use db::models::cart_item::{CartLineItem, CompositeKey, MAX_LINE_QUANTITY, NewCartLineItem};
use sqlx::SqlitePool;
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Debug, Error)]
pub enum CartStoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("line item quantity cannot exceed {MAX_LINE_QUANTITY}")]
    QuantityLimit,
}

/// Result of an upsert
#[derive(Debug, Clone)]
pub struct Upserted {
    pub item: CartLineItem,
    /// True when the quantity was added to an existing line item.
    pub merged: bool,
}

/// Session-scoped cart storage.
///
/// `upsert` must merge atomically: two concurrent calls for the same composite
/// key end with the sum of both quantities. A merge that would take a line past
/// [`MAX_LINE_QUANTITY`] fails with [`CartStoreError::QuantityLimit`] and
/// leaves the line unchanged.
#[async_trait]
pub trait CartStore: Send + Sync {
    async fn upsert(
        &self,
        session_id: &str,
        item: NewCartLineItem,
    ) -> Result<Upserted, CartStoreError>;

    async fn find(
        &self,
        session_id: &str,
        key: &CompositeKey,
    ) -> Result<Option<CartLineItem>, CartStoreError>;

    async fn list(&self, session_id: &str) -> Result<Vec<CartLineItem>, CartStoreError>;

    async fn set_quantity(
        &self,
        session_id: &str,
        composite_id: &str,
        quantity: i64,
    ) -> Result<Option<CartLineItem>, CartStoreError>;

    async fn remove(&self, session_id: &str, composite_id: &str) -> Result<bool, CartStoreError>;

    async fn clear(&self, session_id: &str) -> Result<u64, CartStoreError>;
}

/// SQLite-backed store; the merge is a single `INSERT .. ON CONFLICT` statement.
#[derive(Debug, Clone)]
pub struct SqliteCartStore {
    pool: SqlitePool,
}

impl SqliteCartStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CartStore for SqliteCartStore {
    async fn upsert(
        &self,
        session_id: &str,
        item: NewCartLineItem,
    ) -> Result<Upserted, CartStoreError> {
        let stored = CartLineItem::upsert(&self.pool, session_id, &item)
            .await?
            .ok_or(CartStoreError::QuantityLimit)?;
        // A fresh row holds exactly the requested quantity.
        let merged = stored.quantity > item.quantity;
        Ok(Upserted {
            item: stored,
            merged,
        })
    }

    async fn find(
        &self,
        session_id: &str,
        key: &CompositeKey,
    ) -> Result<Option<CartLineItem>, CartStoreError> {
        Ok(CartLineItem::find_by_key(&self.pool, session_id, key).await?)
    }

    async fn list(&self, session_id: &str) -> Result<Vec<CartLineItem>, CartStoreError> {
        Ok(CartLineItem::find_by_session(&self.pool, session_id).await?)
    }

    async fn set_quantity(
        &self,
        session_id: &str,
        composite_id: &str,
        quantity: i64,
    ) -> Result<Option<CartLineItem>, CartStoreError> {
        Ok(CartLineItem::update_quantity(&self.pool, session_id, composite_id, quantity).await?)
    }

    async fn remove(&self, session_id: &str, composite_id: &str) -> Result<bool, CartStoreError> {
        Ok(CartLineItem::delete(&self.pool, session_id, composite_id).await? > 0)
    }

    async fn clear(&self, session_id: &str) -> Result<u64, CartStoreError> {
        Ok(CartLineItem::delete_by_session(&self.pool, session_id).await?)
    }
}

/// Process-local store. Every operation runs under one mutex, which makes the
/// read-modify-write in `upsert` atomic.
#[derive(Debug, Default)]
pub struct InMemoryCartStore {
    sessions: Mutex<HashMap<String, Vec<CartLineItem>>>,
}

impl InMemoryCartStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CartStore for InMemoryCartStore {
    async fn upsert(
        &self,
        session_id: &str,
        item: NewCartLineItem,
    ) -> Result<Upserted, CartStoreError> {
        let mut sessions = self.sessions.lock().await;
        let items = sessions.entry(session_id.to_string()).or_default();

        let key = item.key();
        if let Some(existing) = items.iter_mut().find(|i| i.matches(&key)) {
            existing.quantity = existing
                .quantity
                .checked_add(item.quantity)
                .filter(|q| *q <= MAX_LINE_QUANTITY)
                .ok_or(CartStoreError::QuantityLimit)?;
            return Ok(Upserted {
                item: existing.clone(),
                merged: true,
            });
        }

        let created = item.into_line_item(session_id);
        items.push(created.clone());
        Ok(Upserted {
            item: created,
            merged: false,
        })
    }

    async fn find(
        &self,
        session_id: &str,
        key: &CompositeKey,
    ) -> Result<Option<CartLineItem>, CartStoreError> {
        let sessions = self.sessions.lock().await;
        Ok(sessions
            .get(session_id)
            .and_then(|items| items.iter().find(|i| i.matches(key)).cloned()))
    }

    async fn list(&self, session_id: &str) -> Result<Vec<CartLineItem>, CartStoreError> {
        let sessions = self.sessions.lock().await;
        Ok(sessions.get(session_id).cloned().unwrap_or_default())
    }

    async fn set_quantity(
        &self,
        session_id: &str,
        composite_id: &str,
        quantity: i64,
    ) -> Result<Option<CartLineItem>, CartStoreError> {
        let mut sessions = self.sessions.lock().await;
        Ok(sessions.get_mut(session_id).and_then(|items| {
            items
                .iter_mut()
                .find(|i| i.composite_id == composite_id)
                .map(|item| {
                    item.quantity = quantity;
                    item.clone()
                })
        }))
    }

    async fn remove(&self, session_id: &str, composite_id: &str) -> Result<bool, CartStoreError> {
        let mut sessions = self.sessions.lock().await;
        let Some(items) = sessions.get_mut(session_id) else {
            return Ok(false);
        };
        let before = items.len();
        items.retain(|i| i.composite_id != composite_id);
        Ok(items.len() != before)
    }

    async fn clear(&self, session_id: &str) -> Result<u64, CartStoreError> {
        let mut sessions = self.sessions.lock().await;
        Ok(sessions
            .remove(session_id)
            .map(|items| items.len() as u64)
            .unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;
    use db::{DBService, models::product::ProductKind};

    use super::*;

    fn draft(product_id: i64, size: &str, color: &str) -> NewCartLineItem {
        NewCartLineItem {
            product_id,
            title: "Classic Cotton Tee".to_string(),
            image: "/images/tee.jpg".to_string(),
            price_display: "$24.99".to_string(),
            price_value: 24.99,
            size: size.to_string(),
            color: color.to_string(),
            quantity: 1,
            kind: ProductKind::Product,
            added_at: Utc::now(),
        }
    }

    async fn stores() -> Vec<Arc<dyn CartStore>> {
        let db = DBService::new_in_memory().await.unwrap();
        vec![
            Arc::new(InMemoryCartStore::new()),
            Arc::new(SqliteCartStore::new(db.pool)),
        ]
    }

    #[tokio::test]
    async fn upsert_reports_merge() {
        for store in stores().await {
            let first = store.upsert("s", draft(1, "M", "White")).await.unwrap();
            let second = store.upsert("s", draft(1, "M", "White")).await.unwrap();
            let other_color = store.upsert("s", draft(1, "M", "Black")).await.unwrap();

            assert!(!first.merged);
            assert!(second.merged);
            assert!(!other_color.merged);
            assert_eq!(second.item.composite_id, first.item.composite_id);
            assert_eq!(second.item.quantity, 2);
            assert_eq!(store.list("s").await.unwrap().len(), 2);
        }
    }

    #[tokio::test]
    async fn sessions_are_isolated() {
        for store in stores().await {
            store.upsert("alice", draft(1, "M", "")).await.unwrap();
            store.upsert("bob", draft(2, "L", "")).await.unwrap();

            let alice = store.list("alice").await.unwrap();
            assert_eq!(alice.len(), 1);
            assert_eq!(alice[0].product_id, 1);
            assert!(store.find("bob", &draft(1, "M", "").key()).await.unwrap().is_none());
            assert_eq!(store.clear("alice").await.unwrap(), 1);
            assert_eq!(store.list("bob").await.unwrap().len(), 1);
        }
    }

    #[tokio::test]
    async fn remove_and_set_quantity() {
        for store in stores().await {
            let item = store.upsert("s", draft(3, "S", "Sage")).await.unwrap().item;

            let updated = store.set_quantity("s", &item.composite_id, 4).await.unwrap();
            assert_eq!(updated.map(|i| i.quantity), Some(4));
            assert!(store.set_quantity("s", "missing", 4).await.unwrap().is_none());

            assert!(store.remove("s", &item.composite_id).await.unwrap());
            assert!(!store.remove("s", &item.composite_id).await.unwrap());
            assert!(store.list("s").await.unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn merge_past_the_limit_is_rejected() {
        for store in stores().await {
            let full = NewCartLineItem {
                quantity: MAX_LINE_QUANTITY,
                ..draft(1, "M", "White")
            };
            store.upsert("s", full).await.unwrap();

            let over = NewCartLineItem {
                quantity: i64::MAX,
                ..draft(1, "M", "White")
            };
            assert!(matches!(
                store.upsert("s", over).await,
                Err(CartStoreError::QuantityLimit)
            ));
            assert!(matches!(
                store.upsert("s", draft(1, "M", "White")).await,
                Err(CartStoreError::QuantityLimit)
            ));

            let items = store.list("s").await.unwrap();
            assert_eq!(items.len(), 1);
            assert_eq!(items[0].quantity, MAX_LINE_QUANTITY);
        }
    }

    #[tokio::test]
    async fn dashed_sizes_and_colors_get_distinct_ids() {
        for store in stores().await {
            let left = store.upsert("s", draft(1, "M", "Red-X")).await.unwrap().item;
            let right = store.upsert("s", draft(1, "M-Red", "X")).await.unwrap().item;
            assert_ne!(left.composite_id, right.composite_id);

            assert!(store.remove("s", &left.composite_id).await.unwrap());
            let remaining = store.list("s").await.unwrap();
            assert_eq!(remaining.len(), 1);
            assert_eq!(remaining[0].size, "M-Red");
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_upserts_never_lose_increments() {
        for store in stores().await {
            let handles: Vec<_> = (0..32)
                .map(|_| {
                    let store = store.clone();
                    tokio::spawn(async move { store.upsert("s", draft(1, "M", "Navy")).await })
                })
                .collect();
            for handle in handles {
                handle.await.unwrap().unwrap();
            }

            let items = store.list("s").await.unwrap();
            assert_eq!(items.len(), 1);
            assert_eq!(items[0].quantity, 32);
        }
    }
}
