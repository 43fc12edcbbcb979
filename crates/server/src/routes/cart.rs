use axum::{
    Router,
    extract::State,
    response::Json as ResponseJson,
    routing::{get, patch, post},
};
use db::models::{cart_item::CartLineItem, product::Product};
use deployment::Deployment;
use serde::{Deserialize, Serialize};
use services::services::cart::{AddToCart, CartError, CartSummary, QuickAdd, QuickAddOutcome};
use ts_rs::TS;

use crate::{
    DeploymentImpl,
    error::ApiError,
    extract::{Json, Path, SessionId},
};

/// Body returned by every cart mutation.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct CartMutationResponse {
    pub success: bool,
    pub message: String,
    pub cart_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<CartLineItem>,
}

#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    pub success: bool,
    #[serde(flatten)]
    #[ts(flatten)]
    pub cart: CartSummary,
}

#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct CartCountResponse {
    pub success: bool,
    pub cart_count: i64,
}

#[derive(Debug, Serialize, TS)]
#[serde(untagged)]
pub enum QuickAddResponse {
    #[serde(rename_all = "camelCase")]
    Added {
        success: bool,
        message: String,
        item: CartLineItem,
        cart_count: i64,
    },
    #[serde(rename_all = "camelCase")]
    SizeSelectionRequired {
        success: bool,
        requires_size_selection: bool,
        message: String,
        product: Product,
        sizes: Vec<String>,
    },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct UpdateCartItem {
    pub quantity: Option<i64>,
}

/// POST /api/cart/add
pub async fn add_to_cart(
    State(deployment): State<DeploymentImpl>,
    session: SessionId,
    Json(payload): Json<AddToCart>,
) -> Result<ResponseJson<CartMutationResponse>, ApiError> {
    let added = deployment.cart().add(session.as_str(), payload).await?;

    deployment
        .track_if_analytics_allowed(
            "cart_item_added",
            serde_json::json!({
                "product_id": added.item.product_id,
                "size": added.item.size,
                "quantity": added.item.quantity,
                "merged": added.merged,
            }),
        )
        .await;

    Ok(ResponseJson(CartMutationResponse {
        success: true,
        message: added.message().to_string(),
        cart_count: added.cart_count,
        item: Some(added.item),
    }))
}

/// POST /api/cart/quick-add
/// Adds one unit, auto-selecting the size when the product has exactly one
pub async fn quick_add(
    State(deployment): State<DeploymentImpl>,
    session: SessionId,
    Json(payload): Json<QuickAdd>,
) -> Result<ResponseJson<QuickAddResponse>, ApiError> {
    let response = match deployment.cart().quick_add(session.as_str(), payload).await? {
        QuickAddOutcome::Added(added) => {
            deployment
                .track_if_analytics_allowed(
                    "cart_quick_add",
                    serde_json::json!({
                        "product_id": added.item.product_id,
                        "size": added.item.size,
                    }),
                )
                .await;

            QuickAddResponse::Added {
                success: true,
                message: added.message().to_string(),
                cart_count: added.cart_count,
                item: added.item,
            }
        }
        QuickAddOutcome::SizeSelectionRequired { product, sizes } => {
            QuickAddResponse::SizeSelectionRequired {
                success: false,
                requires_size_selection: true,
                message: "Please select a size".to_string(),
                product,
                sizes,
            }
        }
    };

    Ok(ResponseJson(response))
}

/// GET /api/cart
pub async fn get_cart(
    State(deployment): State<DeploymentImpl>,
    session: SessionId,
) -> Result<ResponseJson<CartResponse>, ApiError> {
    let cart = deployment.cart().summary(session.as_str()).await?;
    Ok(ResponseJson(CartResponse {
        success: true,
        cart,
    }))
}

/// GET /api/cart/count
pub async fn get_cart_count(
    State(deployment): State<DeploymentImpl>,
    session: SessionId,
) -> Result<ResponseJson<CartCountResponse>, ApiError> {
    let cart_count = deployment.cart().count(session.as_str()).await?;
    Ok(ResponseJson(CartCountResponse {
        success: true,
        cart_count,
    }))
}

/// PATCH /api/cart/{composite_id}
pub async fn update_cart_item(
    State(deployment): State<DeploymentImpl>,
    session: SessionId,
    Path(composite_id): Path<String>,
    Json(payload): Json<UpdateCartItem>,
) -> Result<ResponseJson<CartMutationResponse>, ApiError> {
    let quantity = payload.quantity.ok_or(CartError::InvalidQuantity)?;
    let cart = deployment.cart();
    let item = cart
        .update_quantity(session.as_str(), &composite_id, quantity)
        .await?;

    Ok(ResponseJson(CartMutationResponse {
        success: true,
        message: "Cart item quantity updated".to_string(),
        cart_count: cart.count(session.as_str()).await?,
        item: Some(item),
    }))
}

/// DELETE /api/cart/{composite_id}
pub async fn remove_cart_item(
    State(deployment): State<DeploymentImpl>,
    session: SessionId,
    Path(composite_id): Path<String>,
) -> Result<ResponseJson<CartMutationResponse>, ApiError> {
    let cart = deployment.cart();
    cart.remove(session.as_str(), &composite_id).await?;

    deployment
        .track_if_analytics_allowed(
            "cart_item_removed",
            serde_json::json!({ "composite_id": composite_id }),
        )
        .await;

    Ok(ResponseJson(CartMutationResponse {
        success: true,
        message: "Item removed from cart".to_string(),
        cart_count: cart.count(session.as_str()).await?,
        item: None,
    }))
}

/// DELETE /api/cart
pub async fn clear_cart(
    State(deployment): State<DeploymentImpl>,
    session: SessionId,
) -> Result<ResponseJson<CartMutationResponse>, ApiError> {
    let removed = deployment.cart().clear(session.as_str()).await?;

    Ok(ResponseJson(CartMutationResponse {
        success: true,
        message: format!("Removed {removed} item(s) from cart"),
        cart_count: 0,
        item: None,
    }))
}

pub fn router(_deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new().nest(
        "/cart",
        Router::new()
            .route("/", get(get_cart).delete(clear_cart))
            .route("/add", post(add_to_cart))
            .route("/quick-add", post(quick_add))
            .route("/count", get(get_cart_count))
            .route("/{composite_id}", patch(update_cart_item).delete(remove_cart_item)),
    )
}
