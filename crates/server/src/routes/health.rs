use axum::{Router, extract::State, response::Json as ResponseJson, routing::get};
use deployment::Deployment;
use serde::Serialize;
use ts_rs::TS;
use utils::response::ApiResponse;

use crate::{DeploymentImpl, error::ApiError};

#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    pub cart_store: String,
    pub catalog_source: String,
}

pub async fn health_check(
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<HealthStatus>>, ApiError> {
    sqlx::query("SELECT 1")
        .execute(&deployment.db().pool)
        .await
        .map_err(|e| ApiError::Deployment(db::DBServiceError::from(e).into()))?;

    let config = deployment.config();
    Ok(ResponseJson(ApiResponse::success(HealthStatus {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        cart_store: config.cart_store.to_string(),
        catalog_source: config.catalog.source.to_string(),
    })))
}

pub fn router(_deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new().route("/health", get(health_check))
}
