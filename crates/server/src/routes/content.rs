use axum::{Router, extract::State, response::Json as ResponseJson, routing::get};
use deployment::Deployment;
use services::services::content::{Notification, Order, PolicyDocument};
use utils::response::ApiResponse;

use crate::DeploymentImpl;

pub async fn get_notifications(
    State(deployment): State<DeploymentImpl>,
) -> ResponseJson<ApiResponse<Vec<Notification>>> {
    ResponseJson(ApiResponse::success(deployment.content().notifications()))
}

pub async fn get_order_history(
    State(deployment): State<DeploymentImpl>,
) -> ResponseJson<ApiResponse<Vec<Order>>> {
    ResponseJson(ApiResponse::success(
        deployment.content().order_history().to_vec(),
    ))
}

pub async fn get_terms(
    State(deployment): State<DeploymentImpl>,
) -> ResponseJson<ApiResponse<PolicyDocument>> {
    ResponseJson(ApiResponse::success(deployment.content().terms().clone()))
}

pub async fn get_return_policy(
    State(deployment): State<DeploymentImpl>,
) -> ResponseJson<ApiResponse<PolicyDocument>> {
    ResponseJson(ApiResponse::success(
        deployment.content().return_policy().clone(),
    ))
}

pub fn router(_deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new()
        .route("/notifications", get(get_notifications))
        .route("/order-history", get(get_order_history))
        .route("/terms", get(get_terms))
        .route("/return-policy", get(get_return_policy))
}
