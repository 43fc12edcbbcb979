use axum::Router;

use crate::DeploymentImpl;

pub mod account;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod content;
pub mod health;
pub mod wishlist;

/// All API routes, relative to `/api`.
pub fn router(deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new()
        .merge(health::router(deployment))
        .merge(cart::router(deployment))
        .merge(catalog::router(deployment))
        .merge(content::router(deployment))
        .merge(wishlist::router(deployment))
        .merge(account::router(deployment))
        .merge(auth::router(deployment))
}
