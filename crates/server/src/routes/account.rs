use axum::{
    Router,
    extract::State,
    response::Json as ResponseJson,
    routing::{delete, get, post},
};
use db::models::{
    address::{Address, CreateAddress},
    payment_method::{CreatePaymentMethod, PaymentMethod},
    subscription::Subscription,
};
use deployment::Deployment;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{
    DeploymentImpl,
    error::ApiError,
    extract::{Json, Path, SessionId},
};

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct SubscribeRequest {
    pub email: Option<String>,
}

pub async fn get_addresses(
    State(deployment): State<DeploymentImpl>,
    session: SessionId,
) -> Result<ResponseJson<ApiResponse<Vec<Address>>>, ApiError> {
    let addresses = deployment.account().addresses(session.as_str()).await?;
    Ok(ResponseJson(ApiResponse::success(addresses)))
}

pub async fn create_address(
    State(deployment): State<DeploymentImpl>,
    session: SessionId,
    Json(payload): Json<CreateAddress>,
) -> Result<ResponseJson<ApiResponse<Address>>, ApiError> {
    let address = deployment
        .account()
        .add_address(session.as_str(), payload)
        .await?;
    Ok(ResponseJson(ApiResponse::success(address)))
}

pub async fn delete_address(
    State(deployment): State<DeploymentImpl>,
    session: SessionId,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    deployment
        .account()
        .delete_address(session.as_str(), id)
        .await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

pub async fn get_payment_methods(
    State(deployment): State<DeploymentImpl>,
    session: SessionId,
) -> Result<ResponseJson<ApiResponse<Vec<PaymentMethod>>>, ApiError> {
    let methods = deployment
        .account()
        .payment_methods(session.as_str())
        .await?;
    Ok(ResponseJson(ApiResponse::success(methods)))
}

/// POST /api/payment-methods
/// Only the brand and last four digits of the card are kept
pub async fn create_payment_method(
    State(deployment): State<DeploymentImpl>,
    session: SessionId,
    Json(payload): Json<CreatePaymentMethod>,
) -> Result<ResponseJson<ApiResponse<PaymentMethod>>, ApiError> {
    let method = deployment
        .account()
        .add_payment_method(session.as_str(), payload)
        .await?;
    Ok(ResponseJson(ApiResponse::success(method)))
}

/// POST /api/notifications/subscribe
pub async fn subscribe(
    State(deployment): State<DeploymentImpl>,
    Json(payload): Json<SubscribeRequest>,
) -> Result<ResponseJson<ApiResponse<Subscription>>, ApiError> {
    let subscription = deployment.account().subscribe(payload.email).await?;

    deployment
        .track_if_analytics_allowed("newsletter_subscribed", serde_json::json!({}))
        .await;

    Ok(ResponseJson(ApiResponse::success_with_message(
        subscription,
        "Subscribed to the newsletter",
    )))
}

pub fn router(_deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new()
        .route("/addresses", get(get_addresses).post(create_address))
        .route("/addresses/{id}", delete(delete_address))
        .route(
            "/payment-methods",
            get(get_payment_methods).post(create_payment_method),
        )
        .route("/notifications/subscribe", post(subscribe))
}
