use axum::{Router, extract::State, response::Json as ResponseJson, routing::get};
use db::models::product::{Product, ProductKind};
use deployment::Deployment;
use serde::{Deserialize, Serialize};
use services::services::{catalog::ListingQuery, content::HomeContent};
use ts_rs::TS;
use utils::response::ApiResponse;

use crate::{
    DeploymentImpl,
    error::ApiError,
    extract::{Path, Query},
};

#[derive(Debug, Serialize, TS)]
pub struct DressesResponse {
    pub success: bool,
    pub products: Vec<Product>,
}

#[derive(Debug, Serialize, TS)]
pub struct TopsResponse {
    pub success: bool,
    pub tops: Vec<Product>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductQuery {
    #[serde(rename = "type")]
    pub kind: Option<ProductKind>,
}

fn listing(deployment: &DeploymentImpl, kind: ProductKind, query: &ListingQuery) -> Vec<Product> {
    query.apply(deployment.listings().listing(kind).to_vec())
}

/// GET /api/home
pub async fn get_home(
    State(deployment): State<DeploymentImpl>,
) -> ResponseJson<ApiResponse<HomeContent>> {
    ResponseJson(ApiResponse::success(deployment.content().home().clone()))
}

/// GET /api/products
/// Bare array, unlike the other listings
pub async fn get_products(
    State(deployment): State<DeploymentImpl>,
    Query(query): Query<ListingQuery>,
) -> ResponseJson<Vec<Product>> {
    ResponseJson(listing(&deployment, ProductKind::Product, &query))
}

/// GET /api/dresses
pub async fn get_dresses(
    State(deployment): State<DeploymentImpl>,
    Query(query): Query<ListingQuery>,
) -> ResponseJson<DressesResponse> {
    ResponseJson(DressesResponse {
        success: true,
        products: listing(&deployment, ProductKind::Dress, &query),
    })
}

/// GET /api/tops
pub async fn get_tops(
    State(deployment): State<DeploymentImpl>,
    Query(query): Query<ListingQuery>,
) -> ResponseJson<TopsResponse> {
    ResponseJson(TopsResponse {
        success: true,
        tops: listing(&deployment, ProductKind::Top, &query),
    })
}

/// GET /api/products/{id}?type=
pub async fn get_product(
    State(deployment): State<DeploymentImpl>,
    Path(id): Path<i64>,
    Query(query): Query<ProductQuery>,
) -> Result<ResponseJson<ApiResponse<Product>>, ApiError> {
    let kind = query.kind.unwrap_or_default();
    let product = deployment
        .listings()
        .listing(kind)
        .iter()
        .find(|p| p.id == id)
        .cloned()
        .ok_or_else(|| ApiError::NotFound("Product not found".to_string()))?;

    Ok(ResponseJson(ApiResponse::success(product)))
}

pub fn router(_deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new()
        .route("/home", get(get_home))
        .route("/products", get(get_products))
        .route("/products/{id}", get(get_product))
        .route("/dresses", get(get_dresses))
        .route("/tops", get(get_tops))
}
