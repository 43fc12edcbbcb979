use std::sync::Arc;

use async_trait::async_trait;
use db::DBService;
use deployment::{Deployment, DeploymentError};
use services::services::{
    account::AccountService,
    auth::AuthService,
    cart::CartService,
    cart_store::{CartStore, InMemoryCartStore, SqliteCartStore},
    catalog::{HttpCatalog, ProductCatalog, StaticCatalog},
    config::{CartStoreKind, CatalogSource, StorefrontConfig},
    content::ContentService,
    wishlist::WishlistService,
};
use tracing::info;

/// Single-process deployment: SQLite (or memory) for state, fixtures or HTTP
/// for product metadata.
#[derive(Clone)]
pub struct LocalDeployment {
    config: Arc<StorefrontConfig>,
    db: DBService,
    listings: Arc<StaticCatalog>,
    cart: CartService,
    wishlist: WishlistService,
    account: AccountService,
    auth: Arc<AuthService>,
    content: Arc<ContentService>,
}

#[async_trait]
impl Deployment for LocalDeployment {
    async fn new(config: StorefrontConfig) -> Result<Self, DeploymentError> {
        let db = DBService::new(&config.database_url).await?;
        let listings = Arc::new(StaticCatalog::load()?);

        let catalog: Arc<dyn ProductCatalog> = match config.catalog.source {
            CatalogSource::Static => listings.clone(),
            CatalogSource::Http => Arc::new(HttpCatalog::new(
                &config.catalog_base_url(),
                config.catalog.timeout,
                config.catalog.retry_attempts,
            )?),
        };

        let store: Arc<dyn CartStore> = match config.cart_store {
            CartStoreKind::Sqlite => Arc::new(SqliteCartStore::new(db.pool.clone())),
            CartStoreKind::Memory => Arc::new(InMemoryCartStore::new()),
        };

        info!(
            cart_store = %config.cart_store,
            catalog = %config.catalog.source,
            on_lookup_failure = %config.on_lookup_failure,
            "Storefront deployment ready"
        );

        Ok(Self {
            cart: CartService::new(store, catalog.clone(), config.on_lookup_failure),
            wishlist: WishlistService::new(db.pool.clone(), catalog),
            account: AccountService::new(db.pool.clone()),
            auth: Arc::new(AuthService::with_demo_user()),
            content: Arc::new(ContentService::load(&listings)?),
            config: Arc::new(config),
            db,
            listings,
        })
    }

    fn config(&self) -> &StorefrontConfig {
        &self.config
    }

    fn db(&self) -> &DBService {
        &self.db
    }

    fn listings(&self) -> &StaticCatalog {
        &self.listings
    }

    fn cart(&self) -> &CartService {
        &self.cart
    }

    fn wishlist(&self) -> &WishlistService {
        &self.wishlist
    }

    fn account(&self) -> &AccountService {
        &self.account
    }

    fn auth(&self) -> &AuthService {
        &self.auth
    }

    fn content(&self) -> &ContentService {
        &self.content
    }
}
