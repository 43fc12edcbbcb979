//! Session wishlist. Entries hold product ids; metadata is joined from the
//! catalog when listing.

use std::{collections::HashMap, sync::Arc};

use db::models::{
    product::{Product, ProductKind},
    wishlist_item::WishlistItem,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{info, warn};
use ts_rs::TS;

use super::catalog::{CatalogError, ProductCatalog};

#[derive(Debug, Error)]
pub enum WishlistError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("catalog unavailable: {0}")]
    Catalog(#[from] CatalogError),
    #[error("Product ID is required")]
    MissingProductId,
    #[error("Product not found")]
    ProductNotFound,
    #[error("Product is already in your wishlist")]
    AlreadyExists,
    #[error("Product is not in your wishlist")]
    NotInWishlist,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct AddToWishlist {
    pub product_id: Option<i64>,
    #[serde(rename = "type")]
    pub kind: Option<ProductKind>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct WishlistEntry {
    #[serde(flatten)]
    #[ts(flatten)]
    pub item: WishlistItem,
    /// `None` when the product has since disappeared from the catalog
    pub product: Option<Product>,
}

#[derive(Clone)]
pub struct WishlistService {
    pool: SqlitePool,
    catalog: Arc<dyn ProductCatalog>,
}

impl WishlistService {
    pub fn new(pool: SqlitePool, catalog: Arc<dyn ProductCatalog>) -> Self {
        Self { pool, catalog }
    }

    pub async fn list(&self, session_id: &str) -> Result<Vec<WishlistEntry>, WishlistError> {
        let items = WishlistItem::find_by_session(&self.pool, session_id).await?;

        // One listing fetch per kind, however many entries share it.
        let mut listings: HashMap<ProductKind, HashMap<i64, Product>> = HashMap::new();
        for item in &items {
            if listings.contains_key(&item.kind) {
                continue;
            }
            let listing = match self.catalog.list(item.kind).await {
                Ok(products) => products.into_iter().map(|p| (p.id, p)).collect(),
                Err(e) => {
                    warn!(kind = %item.kind, error = %e, "Wishlist product lookup failed");
                    HashMap::new()
                }
            };
            listings.insert(item.kind, listing);
        }

        Ok(items
            .into_iter()
            .map(|item| {
                let product = listings
                    .get(&item.kind)
                    .and_then(|listing| listing.get(&item.product_id))
                    .cloned();
                WishlistEntry { item, product }
            })
            .collect())
    }

    pub async fn add(
        &self,
        session_id: &str,
        request: AddToWishlist,
    ) -> Result<WishlistEntry, WishlistError> {
        let product_id = request.product_id.ok_or(WishlistError::MissingProductId)?;
        let kind = request.kind.unwrap_or_default();

        let product = self
            .catalog
            .find(kind, product_id)
            .await?
            .ok_or(WishlistError::ProductNotFound)?;

        let item = WishlistItem::create(&self.pool, session_id, product_id, kind)
            .await?
            .ok_or(WishlistError::AlreadyExists)?;

        info!(session_id, product_id, kind = %kind, "Added to wishlist");
        Ok(WishlistEntry {
            item,
            product: Some(product),
        })
    }

    pub async fn remove(
        &self,
        session_id: &str,
        product_id: i64,
        kind: ProductKind,
    ) -> Result<(), WishlistError> {
        match WishlistItem::delete(&self.pool, session_id, product_id, kind).await? {
            0 => Err(WishlistError::NotInWishlist),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use db::DBService;

    use super::*;
    use crate::services::catalog::StaticCatalog;

    struct CountingCatalog {
        inner: StaticCatalog,
        lists: AtomicUsize,
    }

    #[async_trait]
    impl ProductCatalog for CountingCatalog {
        async fn list(&self, kind: ProductKind) -> Result<Vec<Product>, CatalogError> {
            self.lists.fetch_add(1, Ordering::SeqCst);
            self.inner.list(kind).await
        }
    }

    async fn service() -> WishlistService {
        let db = DBService::new_in_memory().await.unwrap();
        WishlistService::new(db.pool, Arc::new(StaticCatalog::load().unwrap()))
    }

    #[tokio::test]
    async fn add_list_remove() {
        let wishlist = service().await;
        let request = AddToWishlist {
            product_id: Some(202),
            kind: Some(ProductKind::Top),
        };

        let entry = wishlist.add("s", request.clone()).await.unwrap();
        assert_eq!(entry.product.unwrap().title, "Cropped Cardigan");
        assert!(matches!(
            wishlist.add("s", request).await,
            Err(WishlistError::AlreadyExists)
        ));

        let listed = wishlist.list("s").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert!(listed[0].product.is_some());

        wishlist.remove("s", 202, ProductKind::Top).await.unwrap();
        assert!(matches!(
            wishlist.remove("s", 202, ProductKind::Top).await,
            Err(WishlistError::NotInWishlist)
        ));
    }

    #[tokio::test]
    async fn unknown_product_is_not_found() {
        let wishlist = service().await;
        let result = wishlist
            .add(
                "s",
                AddToWishlist {
                    product_id: Some(5000),
                    kind: None,
                },
            )
            .await;
        assert!(matches!(result, Err(WishlistError::ProductNotFound)));
    }

    #[tokio::test]
    async fn list_fetches_each_listing_once() {
        let db = DBService::new_in_memory().await.unwrap();
        let catalog = Arc::new(CountingCatalog {
            inner: StaticCatalog::load().unwrap(),
            lists: AtomicUsize::new(0),
        });
        let wishlist = WishlistService::new(db.pool, catalog.clone());

        for (id, kind) in [
            (201, ProductKind::Top),
            (202, ProductKind::Top),
            (203, ProductKind::Top),
            (1, ProductKind::Product),
            (2, ProductKind::Product),
        ] {
            WishlistItem::create(&wishlist.pool, "s", id, kind).await.unwrap();
        }

        let listed = wishlist.list("s").await.unwrap();
        assert_eq!(listed.len(), 5);
        assert!(listed.iter().all(|e| e.product.is_some()));
        assert_eq!(catalog.lists.load(Ordering::SeqCst), 2);
    }
}
