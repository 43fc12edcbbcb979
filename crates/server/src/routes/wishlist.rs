use axum::{
    Router,
    extract::State,
    response::Json as ResponseJson,
    routing::{delete, get},
};
use deployment::Deployment;
use services::services::wishlist::{AddToWishlist, WishlistEntry};
use utils::response::ApiResponse;

use super::catalog::ProductQuery;
use crate::{
    DeploymentImpl,
    error::ApiError,
    extract::{Json, Path, Query, SessionId},
};

/// GET /api/wishlist
pub async fn get_wishlist(
    State(deployment): State<DeploymentImpl>,
    session: SessionId,
) -> Result<ResponseJson<ApiResponse<Vec<WishlistEntry>>>, ApiError> {
    let entries = deployment.wishlist().list(session.as_str()).await?;
    Ok(ResponseJson(ApiResponse::success(entries)))
}

/// POST /api/wishlist
pub async fn add_to_wishlist(
    State(deployment): State<DeploymentImpl>,
    session: SessionId,
    Json(payload): Json<AddToWishlist>,
) -> Result<ResponseJson<ApiResponse<WishlistEntry>>, ApiError> {
    let entry = deployment.wishlist().add(session.as_str(), payload).await?;

    deployment
        .track_if_analytics_allowed(
            "wishlist_item_added",
            serde_json::json!({ "product_id": entry.item.product_id }),
        )
        .await;

    Ok(ResponseJson(ApiResponse::success_with_message(
        entry,
        "Added to wishlist",
    )))
}

/// DELETE /api/wishlist/{product_id}?type=
pub async fn remove_from_wishlist(
    State(deployment): State<DeploymentImpl>,
    session: SessionId,
    Path(product_id): Path<i64>,
    Query(query): Query<ProductQuery>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    deployment
        .wishlist()
        .remove(session.as_str(), product_id, query.kind.unwrap_or_default())
        .await?;
    Ok(ResponseJson(ApiResponse::success_with_message(
        (),
        "Removed from wishlist",
    )))
}

pub fn router(_deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new()
        .route("/wishlist", get(get_wishlist).post(add_to_wishlist))
        .route("/wishlist/{product_id}", delete(remove_from_wishlist))
}
