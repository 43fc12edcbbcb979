use serde::{Deserialize, Serialize};
use sqlx::Type;
use strum_macros::{Display, EnumString};
use ts_rs::TS;

/// Catalog family a product is listed under
#[derive(
    Debug,
    Clone,
    Copy,
    Type,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    Hash,
    TS,
    EnumString,
    Display,
    Default,
)]
#[sqlx(type_name = "product_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ProductKind {
    Dress,
    Top,
    #[default]
    Product,
}

impl ProductKind {
    /// Path of the mock listing endpoint, relative to the API root.
    pub fn listing_path(self) -> &'static str {
        match self {
            Self::Dress => "/dresses",
            Self::Top => "/tops",
            Self::Product => "/products",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i64,
    pub title: String,
    pub image: String,
    /// Display price, e.g. `"$59.99"`
    pub price: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub sizes: Vec<String>,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(rename = "type", default)]
    pub kind: ProductKind,
}

impl Product {
    pub fn price_value(&self) -> Option<f64> {
        parse_price(&self.price)
    }

    pub fn has_size(&self, size: &str) -> bool {
        self.sizes.iter().any(|s| s.eq_ignore_ascii_case(size))
    }

    /// The declared size matching `size`, keeping the catalog's spelling.
    pub fn canonical_size(&self, size: &str) -> Option<&str> {
        self.sizes
            .iter()
            .find(|s| s.eq_ignore_ascii_case(size))
            .map(String::as_str)
    }

    pub fn default_color(&self) -> Option<&str> {
        self.colors.first().map(String::as_str)
    }
}

/// Parse a display price such as `"$1,299.50"` into a number.
pub fn parse_price(display: &str) -> Option<f64> {
    let cleaned: String = display
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Format a number the way catalog prices are displayed.
pub fn format_price(value: f64) -> String {
    format!("${:.2}", value)
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn kind_maps_to_listing_path() {
        assert_eq!(ProductKind::Dress.listing_path(), "/dresses");
        assert_eq!(ProductKind::Top.listing_path(), "/tops");
        assert_eq!(ProductKind::Product.listing_path(), "/products");
        assert_eq!(ProductKind::from_str("top").unwrap(), ProductKind::Top);
    }

    #[test]
    fn parses_display_prices() {
        assert_eq!(parse_price("$59.99"), Some(59.99));
        assert_eq!(parse_price("$1,299.50"), Some(1299.5));
        assert_eq!(parse_price("free"), None);
        assert_eq!(format_price(7.5), "$7.50");
    }

    #[test]
    fn product_json_uses_type_field() {
        let product: Product = serde_json::from_str(
            r#"{"id":3,"title":"Linen Shirt","image":"/img/3.jpg","price":"$40.00","sizes":["S","M"],"type":"top"}"#,
        )
        .unwrap();
        assert_eq!(product.kind, ProductKind::Top);
        assert!(product.colors.is_empty());
        assert_eq!(product.canonical_size("m"), Some("M"));
        assert!(!product.has_size("XL"));
    }
}
