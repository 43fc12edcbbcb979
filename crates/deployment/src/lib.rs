use async_trait::async_trait;
use db::{DBService, DBServiceError};
use serde_json::Value;
use services::services::{
    account::AccountService,
    auth::AuthService,
    cart::CartService,
    catalog::{CatalogError, StaticCatalog},
    config::StorefrontConfig,
    content::{ContentError, ContentService},
    wishlist::WishlistService,
};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum DeploymentError {
    #[error(transparent)]
    Database(#[from] DBServiceError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Content(#[from] ContentError),
}

/// Everything a request handler can reach. Implementations are cheap to clone
/// and shared as axum state.
#[async_trait]
pub trait Deployment: Clone + Send + Sync + 'static {
    async fn new(config: StorefrontConfig) -> Result<Self, DeploymentError>;

    fn config(&self) -> &StorefrontConfig;

    fn db(&self) -> &DBService;

    /// Fixture listings served by the catalog routes.
    fn listings(&self) -> &StaticCatalog;

    fn cart(&self) -> &CartService;

    fn wishlist(&self) -> &WishlistService;

    fn account(&self) -> &AccountService;

    fn auth(&self) -> &AuthService;

    fn content(&self) -> &ContentService;

    async fn track_if_analytics_allowed(&self, event_name: &str, properties: Value) {
        if self.config().analytics_enabled {
            info!(target: "analytics", event = event_name, properties = %properties, "event");
        }
    }
}
