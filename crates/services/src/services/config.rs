//! Runtime configuration, read from the environment.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use tracing::warn;
use utils::env;

/// What the cart does when product metadata cannot be resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display, Default)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LookupFailurePolicy {
    /// Continue without metadata, using placeholders
    #[default]
    ProceedDegraded,
    /// Treat the product as not found
    Fail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display, Default)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CartStoreKind {
    #[default]
    Sqlite,
    Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display, Default)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CatalogSource {
    #[default]
    Static,
    Http,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    pub source: CatalogSource,
    /// Origin the HTTP catalog fetches listings from. `None` means this server.
    pub base_url: Option<String>,
    #[serde(with = "duration_ms")]
    pub timeout: Duration,
    pub retry_attempts: usize,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            source: CatalogSource::Static,
            base_url: None,
            timeout: Duration::from_millis(3000),
            retry_attempts: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorefrontConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub cart_store: CartStoreKind,
    pub catalog: CatalogConfig,
    pub on_lookup_failure: LookupFailurePolicy,
    pub analytics_enabled: bool,
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3001,
            database_url: db::IN_MEMORY_URL.to_string(),
            cart_store: CartStoreKind::default(),
            catalog: CatalogConfig::default(),
            on_lookup_failure: LookupFailurePolicy::default(),
            analytics_enabled: false,
        }
    }
}

impl StorefrontConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let catalog_defaults = CatalogConfig::default();

        let config = Self {
            host: env::string_or("HOST", &defaults.host),
            port: env::parse_or("PORT", defaults.port),
            database_url: env::string_or("DATABASE_URL", &defaults.database_url),
            cart_store: env::parse_or("CART_STORE", defaults.cart_store),
            catalog: CatalogConfig {
                source: env::parse_or("CATALOG_SOURCE", catalog_defaults.source),
                base_url: env::optional_string("CATALOG_BASE_URL"),
                timeout: env::duration_ms_or(
                    "CATALOG_TIMEOUT_MS",
                    catalog_defaults.timeout.as_millis() as u64,
                ),
                retry_attempts: env::parse_or(
                    "CATALOG_RETRY_ATTEMPTS",
                    catalog_defaults.retry_attempts,
                ),
            },
            on_lookup_failure: env::parse_or("ON_LOOKUP_FAILURE", defaults.on_lookup_failure),
            analytics_enabled: env::bool_or("STOREFRONT_ANALYTICS", defaults.analytics_enabled),
        };

        if config.catalog.source == CatalogSource::Http && config.catalog.base_url.is_none() {
            warn!(
                "CATALOG_SOURCE=http without CATALOG_BASE_URL, fetching listings from {}",
                config.origin()
            );
        }
        config
    }

    /// Same-origin base URL of this server.
    pub fn origin(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    pub fn catalog_base_url(&self) -> String {
        self.catalog
            .base_url
            .clone()
            .unwrap_or_else(|| self.origin())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn policy_parses_from_snake_case() {
        assert_eq!(
            LookupFailurePolicy::from_str("proceed_degraded").unwrap(),
            LookupFailurePolicy::ProceedDegraded
        );
        assert_eq!(LookupFailurePolicy::from_str("fail").unwrap(), LookupFailurePolicy::Fail);
        assert!(LookupFailurePolicy::from_str("retry").is_err());
    }

    #[test]
    fn catalog_defaults_to_same_origin() {
        let config = StorefrontConfig {
            port: 8080,
            ..StorefrontConfig::default()
        };
        assert_eq!(config.catalog_base_url(), "http://127.0.0.1:8080");
    }

    #[test]
    fn config_round_trips_through_json() {
        let json = serde_json::to_value(StorefrontConfig::default()).unwrap();
        assert_eq!(json["on_lookup_failure"], "proceed_degraded");
        assert_eq!(json["catalog"]["timeout"], 3000);
        let back: StorefrontConfig = serde_json::from_value(json).unwrap();
        assert_eq!(back.cart_store, CartStoreKind::Sqlite);
    }
}
