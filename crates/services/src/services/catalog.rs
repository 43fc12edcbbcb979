//! Product lookup: resolves products by kind and id from the mock listings.

use std::{collections::HashMap, time::Duration};

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use db::models::product::{Product, ProductKind};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use strum_macros::{Display, EnumString};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

const PRODUCTS_FIXTURE: &str = include_str!("../../fixtures/products.json");
const DRESSES_FIXTURE: &str = include_str!("../../fixtures/dresses.json");
const TOPS_FIXTURE: &str = include_str!("../../fixtures/tops.json");

#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    #[error("network error: {0}")]
    Transport(String),
    #[error("timeout")]
    Timeout,
    #[error("http {status} from {url}")]
    Http { status: u16, url: String },
    #[error("invalid listing payload: {0}")]
    Payload(String),
    #[error("invalid catalog url: {0}")]
    InvalidUrl(String),
}

impl CatalogError {
    /// Returns true if the error is transient and should be retried.
    pub fn should_retry(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout => true,
            Self::Http { status, .. } => (500..=599).contains(status),
            _ => false,
        }
    }
}

/// Source of product listings.
///
/// `find` returns `Ok(None)` when the listing was fetched but does not contain
/// the id, and `Err` when the listing itself could not be obtained.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    async fn list(&self, kind: ProductKind) -> Result<Vec<Product>, CatalogError>;

    async fn find(&self, kind: ProductKind, id: i64) -> Result<Option<Product>, CatalogError> {
        Ok(self.list(kind).await?.into_iter().find(|p| p.id == id))
    }
}

/// Listing endpoints answer with one of these shapes.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ListingPayload {
    Bare(Vec<Product>),
    Products { products: Vec<Product> },
    Tops { tops: Vec<Product> },
}

impl ListingPayload {
    pub fn into_products(self) -> Vec<Product> {
        match self {
            Self::Bare(products) | Self::Products { products } | Self::Tops { tops: products } => {
                products
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, EnumString, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ListingSort {
    PriceAsc,
    PriceDesc,
    Title,
}

/// Optional narrowing applied to a listing before it is returned.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingQuery {
    pub size: Option<String>,
    pub sort: Option<ListingSort>,
}

impl ListingQuery {
    pub fn apply(&self, mut products: Vec<Product>) -> Vec<Product> {
        if let Some(size) = self.size.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            products.retain(|p| p.has_size(size));
        }

        // Unparseable prices sort last in either direction.
        let price = |p: &Product| p.price_value().unwrap_or(f64::NAN);
        match self.sort {
            Some(ListingSort::PriceAsc) => {
                products.sort_by(|a, b| price(a).total_cmp(&price(b)));
            }
            Some(ListingSort::PriceDesc) => {
                products.sort_by(|a, b| match (price(a).is_nan(), price(b).is_nan()) {
                    (false, false) => price(b).total_cmp(&price(a)),
                    (a_nan, b_nan) => a_nan.cmp(&b_nan),
                });
            }
            Some(ListingSort::Title) => {
                products.sort_by_key(|p| p.title.to_lowercase());
            }
            None => {}
        }
        products
    }
}

/// Catalog backed by the fixtures compiled into the binary
#[derive(Debug, Clone)]
pub struct StaticCatalog {
    listings: HashMap<ProductKind, Vec<Product>>,
}

impl StaticCatalog {
    pub fn load() -> Result<Self, CatalogError> {
        let mut listings = HashMap::new();
        for (kind, raw) in [
            (ProductKind::Product, PRODUCTS_FIXTURE),
            (ProductKind::Dress, DRESSES_FIXTURE),
            (ProductKind::Top, TOPS_FIXTURE),
        ] {
            let products: Vec<Product> =
                serde_json::from_str(raw).map_err(|e| CatalogError::Payload(e.to_string()))?;
            listings.insert(kind, products);
        }
        Ok(Self { listings })
    }

    pub fn from_listings(listings: HashMap<ProductKind, Vec<Product>>) -> Self {
        Self { listings }
    }

    pub fn listing(&self, kind: ProductKind) -> &[Product] {
        self.listings.get(&kind).map(Vec::as_slice).unwrap_or_default()
    }
}

#[async_trait]
impl ProductCatalog for StaticCatalog {
    async fn list(&self, kind: ProductKind) -> Result<Vec<Product>, CatalogError> {
        Ok(self.listing(kind).to_vec())
    }

    async fn find(&self, kind: ProductKind, id: i64) -> Result<Option<Product>, CatalogError> {
        Ok(self.listing(kind).iter().find(|p| p.id == id).cloned())
    }
}

/// Catalog that fetches the listing endpoints over HTTP
#[derive(Debug, Clone)]
pub struct HttpCatalog {
    http: Client,
    base_url: Url,
    retry_attempts: usize,
}

impl HttpCatalog {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        retry_attempts: usize,
    ) -> Result<Self, CatalogError> {
        let mut base_url =
            Url::parse(base_url).map_err(|e| CatalogError::InvalidUrl(format!("{base_url}: {e}")))?;
        // Url::join replaces the last path segment unless the base ends in '/'.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("storefront/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CatalogError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            base_url,
            retry_attempts,
        })
    }

    fn listing_url(&self, kind: ProductKind) -> Result<Url, CatalogError> {
        let path = format!("api{}", kind.listing_path());
        self.base_url
            .join(&path)
            .map_err(|e| CatalogError::InvalidUrl(e.to_string()))
    }

    async fn fetch_listing(&self, url: &Url) -> Result<Vec<Product>, CatalogError> {
        let res = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(map_reqwest_error)?;

        match res.status() {
            s if s.is_success() => {
                let payload = res
                    .json::<ListingPayload>()
                    .await
                    .map_err(|e| CatalogError::Payload(e.to_string()))?;
                Ok(payload.into_products())
            }
            StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => Err(CatalogError::Timeout),
            s => Err(CatalogError::Http {
                status: s.as_u16(),
                url: url.to_string(),
            }),
        }
    }
}

#[async_trait]
impl ProductCatalog for HttpCatalog {
    async fn list(&self, kind: ProductKind) -> Result<Vec<Product>, CatalogError> {
        let url = self.listing_url(kind)?;
        debug!(url = %url, "Fetching product listing");

        (|| async { self.fetch_listing(&url).await })
            .retry(
                ExponentialBuilder::default()
                    .with_min_delay(Duration::from_millis(100))
                    .with_max_delay(Duration::from_secs(2))
                    .with_max_times(self.retry_attempts)
                    .with_jitter(),
            )
            .when(|e: &CatalogError| e.should_retry())
            .notify(|e, dur| {
                warn!(
                    "Product listing fetch failed, retrying after {:.2}s: {}",
                    dur.as_secs_f64(),
                    e
                )
            })
            .await
    }
}

fn map_reqwest_error(e: reqwest::Error) -> CatalogError {
    if e.is_timeout() {
        CatalogError::Timeout
    } else {
        CatalogError::Transport(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_listing_shape() {
        let item = r#"{"id":9,"title":"Tee","image":"/t.jpg","price":"$10.00","sizes":["M"]}"#;

        let bare: ListingPayload = serde_json::from_str(&format!("[{item}]")).unwrap();
        let wrapped: ListingPayload =
            serde_json::from_str(&format!(r#"{{"success":true,"products":[{item}]}}"#)).unwrap();
        let tops: ListingPayload =
            serde_json::from_str(&format!(r#"{{"success":true,"tops":[{item}]}}"#)).unwrap();

        for payload in [bare, wrapped, tops] {
            let products = payload.into_products();
            assert_eq!(products.len(), 1);
            assert_eq!(products[0].id, 9);
        }
    }

    #[test]
    fn rejects_unrecognised_shape() {
        assert!(serde_json::from_str::<ListingPayload>(r#"{"items":[]}"#).is_err());
    }

    #[tokio::test]
    async fn static_catalog_finds_by_kind() {
        let catalog = StaticCatalog::load().unwrap();

        let dress = catalog.find(ProductKind::Dress, 101).await.unwrap().unwrap();
        assert_eq!(dress.kind, ProductKind::Dress);
        // Ids are only unique within a listing.
        assert!(catalog.find(ProductKind::Top, 101).await.unwrap().is_none());
        assert!(!catalog.list(ProductKind::Product).await.unwrap().is_empty());
    }

    #[test]
    fn fixture_prices_parse() {
        let catalog = StaticCatalog::load().unwrap();
        for kind in [ProductKind::Product, ProductKind::Dress, ProductKind::Top] {
            for product in catalog.listing(kind) {
                assert!(product.price_value().is_some(), "{} has a bad price", product.title);
                assert!(!product.sizes.is_empty(), "{} has no sizes", product.title);
            }
        }
    }

    #[test]
    fn listing_query_filters_and_sorts() {
        let catalog = StaticCatalog::load().unwrap();
        let dresses = catalog.listing(ProductKind::Dress).to_vec();

        let query = ListingQuery {
            size: Some("xs".to_string()),
            sort: Some(ListingSort::PriceDesc),
        };
        let filtered = query.apply(dresses.clone());
        assert!(!filtered.is_empty());
        assert!(filtered.iter().all(|p| p.has_size("XS")));
        assert!(
            filtered
                .windows(2)
                .all(|w| w[0].price_value() >= w[1].price_value())
        );

        let by_price = ListingQuery {
            size: None,
            sort: Some(ListingSort::PriceAsc),
        }
        .apply(dresses.clone());
        assert_eq!(by_price.len(), dresses.len());
        assert_eq!(by_price.last().unwrap().id, 106);
    }

    #[test]
    fn listing_sort_parses_query_values() {
        assert_eq!("price_asc".parse::<ListingSort>().unwrap(), ListingSort::PriceAsc);
        assert_eq!("title".parse::<ListingSort>().unwrap(), ListingSort::Title);
        assert!("cheapest".parse::<ListingSort>().is_err());
    }

    #[test]
    fn listing_url_is_under_api() {
        let catalog = HttpCatalog::new("http://127.0.0.1:3001", Duration::from_secs(1), 0).unwrap();
        assert_eq!(
            catalog.listing_url(ProductKind::Top).unwrap().as_str(),
            "http://127.0.0.1:3001/api/tops"
        );
    }

    #[test]
    fn listing_url_keeps_the_base_path() {
        for base in ["http://127.0.0.1:3001/shop", "http://127.0.0.1:3001/shop/"] {
            let catalog = HttpCatalog::new(base, Duration::from_secs(1), 0).unwrap();
            assert_eq!(
                catalog.listing_url(ProductKind::Top).unwrap().as_str(),
                "http://127.0.0.1:3001/shop/api/tops"
            );
        }
    }

    #[tokio::test]
    async fn unreachable_catalog_is_an_error() {
        // Port 9 (discard) is closed on loopback in test environments.
        let catalog = HttpCatalog::new("http://127.0.0.1:9", Duration::from_millis(500), 0).unwrap();
        let err = catalog.find(ProductKind::Product, 1).await.unwrap_err();
        assert!(err.should_retry());
    }
}
