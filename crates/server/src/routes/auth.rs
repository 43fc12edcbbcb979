use axum::{
    Router,
    extract::State,
    response::Json as ResponseJson,
    routing::{get, post},
};
use deployment::Deployment;
use services::services::auth::{AuthSession, AuthUser, LoginRequest, RegisterRequest};
use utils::response::ApiResponse;

use crate::{
    DeploymentImpl,
    error::ApiError,
    extract::{BearerToken, Json},
};

pub async fn register(
    State(deployment): State<DeploymentImpl>,
    Json(payload): Json<RegisterRequest>,
) -> Result<ResponseJson<ApiResponse<AuthSession>>, ApiError> {
    let session = deployment.auth().register(payload)?;

    deployment
        .track_if_analytics_allowed(
            "account_registered",
            serde_json::json!({ "user_id": session.user.id.to_string() }),
        )
        .await;

    Ok(ResponseJson(ApiResponse::success(session)))
}

pub async fn login(
    State(deployment): State<DeploymentImpl>,
    Json(payload): Json<LoginRequest>,
) -> Result<ResponseJson<ApiResponse<AuthSession>>, ApiError> {
    let session = deployment.auth().login(payload)?;
    Ok(ResponseJson(ApiResponse::success(session)))
}

pub async fn get_session(
    State(deployment): State<DeploymentImpl>,
    token: BearerToken,
) -> Result<ResponseJson<ApiResponse<AuthUser>>, ApiError> {
    let user = deployment.auth().session(token.as_deref())?;
    Ok(ResponseJson(ApiResponse::success(user)))
}

pub async fn logout(
    State(deployment): State<DeploymentImpl>,
    token: BearerToken,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    deployment.auth().logout(token.as_deref())?;
    Ok(ResponseJson(ApiResponse::success_with_message((), "Signed out")))
}

pub fn router(_deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new().nest(
        "/auth",
        Router::new()
            .route("/register", post(register))
            .route("/login", post(login))
            .route("/session", get(get_session))
            .route("/logout", post(logout)),
    )
}
