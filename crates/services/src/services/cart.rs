//! Cart aggregation: validates adds, resolves product metadata and merges line
//! items through the injected [`CartStore`].

use std::sync::Arc;

use chrono::Utc;
use db::models::{
    cart_item::{CartLineItem, MAX_LINE_QUANTITY, NewCartLineItem},
    product::{Product, ProductKind},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};
use ts_rs::TS;

use super::{
    cart_store::{CartStore, CartStoreError},
    catalog::ProductCatalog,
    config::LookupFailurePolicy,
};

pub const PLACEHOLDER_IMAGE: &str = "/images/placeholder.jpg";
pub const PLACEHOLDER_PRICE: &str = "$0.00";

#[derive(Debug, Error)]
pub enum CartError {
    #[error("Product ID and size are required")]
    MissingFields,
    #[error("Product ID is required")]
    MissingProductId,
    #[error("Quantity must be at least 1")]
    InvalidQuantity,
    #[error("Quantity cannot exceed {MAX_LINE_QUANTITY} per item")]
    QuantityLimit,
    #[error("Size {size} is not available for this product")]
    SizeUnavailable { size: String },
    #[error("This product has no selectable sizes")]
    NoSizes,
    #[error("Product not found")]
    ProductNotFound,
    #[error("Cart item not found")]
    ItemNotFound,
    #[error("cart store error: {0}")]
    Store(CartStoreError),
}

impl From<CartStoreError> for CartError {
    fn from(err: CartStoreError) -> Self {
        match err {
            CartStoreError::QuantityLimit => CartError::QuantityLimit,
            err => CartError::Store(err),
        }
    }
}

/// Body of `POST /cart/add`. Required fields are optional here so that their
/// absence is reported as a validation error.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct AddToCart {
    pub product_id: Option<i64>,
    pub quantity: Option<i64>,
    pub size: Option<String>,
    pub color: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<ProductKind>,
}

/// Body of `POST /cart/quick-add`
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct QuickAdd {
    pub product_id: Option<i64>,
    pub size: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<ProductKind>,
}

#[derive(Debug, Clone)]
pub struct Added {
    pub item: CartLineItem,
    pub merged: bool,
    /// Total quantity across the session's cart after the add
    pub cart_count: i64,
}

impl Added {
    pub fn message(&self) -> &'static str {
        if self.merged {
            "Cart item quantity updated"
        } else {
            "Item added to cart"
        }
    }
}

#[derive(Debug, Clone)]
pub enum QuickAddOutcome {
    Added(Added),
    /// The product has several sizes and none was chosen. Not an error: the
    /// client is expected to prompt for a size.
    SizeSelectionRequired { product: Product, sizes: Vec<String> },
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct CartSummary {
    pub items: Vec<CartLineItem>,
    pub total_items: i64,
    pub total_value: String,
}

pub fn count(items: &[CartLineItem]) -> i64 {
    items.iter().fold(0, |acc, i| acc.saturating_add(i.quantity))
}

/// Sum of quantity times unit price, with two decimals and no currency sign.
pub fn total(items: &[CartLineItem]) -> String {
    let value = items.iter().fold(0.0, |acc, i| acc + i.line_total());
    format!("{:.2}", value)
}

#[derive(Clone)]
pub struct CartService {
    store: Arc<dyn CartStore>,
    catalog: Arc<dyn ProductCatalog>,
    policy: LookupFailurePolicy,
}

impl CartService {
    pub fn new(
        store: Arc<dyn CartStore>,
        catalog: Arc<dyn ProductCatalog>,
        policy: LookupFailurePolicy,
    ) -> Self {
        Self {
            store,
            catalog,
            policy,
        }
    }

    pub fn policy(&self) -> LookupFailurePolicy {
        self.policy
    }

    pub async fn add(&self, session_id: &str, request: AddToCart) -> Result<Added, CartError> {
        let (product_id, size) = match (request.product_id, non_blank(request.size.as_deref())) {
            (Some(id), Some(size)) => (id, size.to_string()),
            _ => return Err(CartError::MissingFields),
        };
        let quantity = validate_quantity(request.quantity.unwrap_or(1))?;
        let kind = request.kind.unwrap_or_default();

        let product = self.resolve(kind, product_id).await?;
        self.add_resolved(
            session_id,
            LineRequest {
                product_id,
                kind,
                size,
                color: request.color,
                quantity,
            },
            product.as_ref(),
        )
        .await
    }

    pub async fn quick_add(
        &self,
        session_id: &str,
        request: QuickAdd,
    ) -> Result<QuickAddOutcome, CartError> {
        let product_id = request.product_id.ok_or(CartError::MissingProductId)?;
        let kind = request.kind.unwrap_or_default();
        let requested_size = non_blank(request.size.as_deref()).map(str::to_string);

        let product = self.resolve(kind, product_id).await?;

        let size = match (requested_size, &product) {
            (Some(size), _) => size,
            // Without metadata there is no size list to choose from.
            (None, None) => return Err(CartError::ProductNotFound),
            (None, Some(product)) => match product.sizes.as_slice() {
                [only] => {
                    debug!(product_id, size = %only, "Quick add auto-selected the only size");
                    only.clone()
                }
                [] => return Err(CartError::NoSizes),
                sizes => {
                    return Ok(QuickAddOutcome::SizeSelectionRequired {
                        sizes: sizes.to_vec(),
                        product: product.clone(),
                    });
                }
            },
        };

        let added = self
            .add_resolved(
                session_id,
                LineRequest {
                    product_id,
                    kind,
                    size,
                    color: None,
                    quantity: 1,
                },
                product.as_ref(),
            )
            .await?;
        Ok(QuickAddOutcome::Added(added))
    }

    pub async fn summary(&self, session_id: &str) -> Result<CartSummary, CartError> {
        let items = self.store.list(session_id).await?;
        Ok(CartSummary {
            total_items: count(&items),
            total_value: total(&items),
            items,
        })
    }

    pub async fn count(&self, session_id: &str) -> Result<i64, CartError> {
        Ok(count(&self.store.list(session_id).await?))
    }

    pub async fn update_quantity(
        &self,
        session_id: &str,
        composite_id: &str,
        quantity: i64,
    ) -> Result<CartLineItem, CartError> {
        let quantity = validate_quantity(quantity)?;
        self.store
            .set_quantity(session_id, composite_id, quantity)
            .await?
            .ok_or(CartError::ItemNotFound)
    }

    pub async fn remove(&self, session_id: &str, composite_id: &str) -> Result<(), CartError> {
        if self.store.remove(session_id, composite_id).await? {
            info!(session_id, composite_id, "Removed cart item");
            Ok(())
        } else {
            Err(CartError::ItemNotFound)
        }
    }

    pub async fn clear(&self, session_id: &str) -> Result<u64, CartError> {
        Ok(self.store.clear(session_id).await?)
    }

    /// Look the product up and apply the lookup-failure policy. `Ok(None)`
    /// means "continue without metadata".
    async fn resolve(&self, kind: ProductKind, product_id: i64) -> Result<Option<Product>, CartError> {
        let failure = match self.catalog.find(kind, product_id).await {
            Ok(Some(product)) => return Ok(Some(product)),
            Ok(None) => "not listed".to_string(),
            Err(e) => e.to_string(),
        };

        match self.policy {
            LookupFailurePolicy::ProceedDegraded => {
                warn!(
                    product_id,
                    kind = %kind,
                    reason = %failure,
                    "Product lookup failed, continuing without metadata"
                );
                Ok(None)
            }
            LookupFailurePolicy::Fail => {
                warn!(product_id, kind = %kind, reason = %failure, "Product lookup failed");
                Err(CartError::ProductNotFound)
            }
        }
    }

    async fn add_resolved(
        &self,
        session_id: &str,
        line: LineRequest,
        product: Option<&Product>,
    ) -> Result<Added, CartError> {
        let draft = match product {
            Some(product) => {
                let size = product.canonical_size(&line.size).ok_or_else(|| {
                    CartError::SizeUnavailable {
                        size: line.size.clone(),
                    }
                })?;
                let color = non_blank(line.color.as_deref())
                    .or(product.default_color())
                    .unwrap_or_default();
                let price_value = product.price_value().unwrap_or_else(|| {
                    warn!(product_id = product.id, price = %product.price, "Unparseable price, using 0");
                    0.0
                });

                NewCartLineItem {
                    product_id: line.product_id,
                    title: product.title.clone(),
                    image: product.image.clone(),
                    price_display: product.price.clone(),
                    price_value,
                    size: size.to_string(),
                    color: color.to_string(),
                    quantity: line.quantity,
                    kind: line.kind,
                    added_at: Utc::now(),
                }
            }
            None => NewCartLineItem {
                product_id: line.product_id,
                title: format!("Product {}", line.product_id),
                image: PLACEHOLDER_IMAGE.to_string(),
                price_display: PLACEHOLDER_PRICE.to_string(),
                price_value: 0.0,
                size: line.size,
                color: non_blank(line.color.as_deref()).unwrap_or_default().to_string(),
                quantity: line.quantity,
                kind: line.kind,
                added_at: Utc::now(),
            },
        };

        let upserted = self.store.upsert(session_id, draft).await?;
        let cart_count = self.count(session_id).await?;

        info!(
            session_id,
            product_id = upserted.item.product_id,
            size = %upserted.item.size,
            quantity = upserted.item.quantity,
            merged = upserted.merged,
            cart_count,
            "Cart updated"
        );

        Ok(Added {
            item: upserted.item,
            merged: upserted.merged,
            cart_count,
        })
    }
}

struct LineRequest {
    product_id: i64,
    kind: ProductKind,
    size: String,
    color: Option<String>,
    quantity: i64,
}

fn validate_quantity(quantity: i64) -> Result<i64, CartError> {
    match quantity {
        q if q < 1 => Err(CartError::InvalidQuantity),
        q if q > MAX_LINE_QUANTITY => Err(CartError::QuantityLimit),
        q => Ok(q),
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
