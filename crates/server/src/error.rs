use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Json as ResponseJson, Response},
};
use deployment::DeploymentError;
use services::services::{
    account::AccountError, auth::AuthError, cart::CartError, wishlist::WishlistError,
};
use thiserror::Error;
use utils::response::ApiResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Cart(#[from] CartError),
    #[error(transparent)]
    Wishlist(#[from] WishlistError),
    #[error(transparent)]
    Account(#[from] AccountError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Deployment(#[from] DeploymentError),
    #[error("Invalid JSON body: {0}")]
    InvalidJson(#[from] JsonRejection),
    #[error("Invalid path: {0}")]
    InvalidPath(#[from] PathRejection),
    #[error("Invalid query: {0}")]
    InvalidQuery(#[from] QueryRejection),
    #[error("{0}")]
    NotFound(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Cart(err) => match err {
                CartError::MissingFields
                | CartError::MissingProductId
                | CartError::InvalidQuantity
                | CartError::QuantityLimit
                | CartError::SizeUnavailable { .. }
                | CartError::NoSizes => StatusCode::BAD_REQUEST,
                CartError::ProductNotFound | CartError::ItemNotFound => StatusCode::NOT_FOUND,
                CartError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Wishlist(err) => match err {
                WishlistError::MissingProductId => StatusCode::BAD_REQUEST,
                WishlistError::ProductNotFound | WishlistError::NotInWishlist => {
                    StatusCode::NOT_FOUND
                }
                WishlistError::AlreadyExists => StatusCode::CONFLICT,
                WishlistError::Database(_) | WishlistError::Catalog(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            ApiError::Account(err) => match err {
                AccountError::Validation(_) => StatusCode::BAD_REQUEST,
                AccountError::AddressNotFound => StatusCode::NOT_FOUND,
                AccountError::AlreadySubscribed => StatusCode::CONFLICT,
                AccountError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Auth(err) => match err {
                AuthError::Validation(_) => StatusCode::BAD_REQUEST,
                AuthError::EmailTaken => StatusCode::CONFLICT,
                AuthError::InvalidCredentials | AuthError::Unauthorized => {
                    StatusCode::UNAUTHORIZED
                }
            },
            ApiError::InvalidJson(_) | ApiError::InvalidPath(_) | ApiError::InvalidQuery(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Deployment(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
            "Internal server error".to_string()
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "Request rejected");
            self.to_string()
        };

        (status, ResponseJson(ApiResponse::<()>::error(message))).into_response()
    }
}
