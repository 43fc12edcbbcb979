//! Static storefront content: home page, notifications, order history and
//! policy pages.

use chrono::{DateTime, Utc};
use db::models::product::{Product, ProductKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

use super::catalog::StaticCatalog;

const NOTIFICATIONS_FIXTURE: &str = include_str!("../../fixtures/notifications.json");
const ORDERS_FIXTURE: &str = include_str!("../../fixtures/orders.json");
const TERMS_FIXTURE: &str = include_str!("../../fixtures/terms.json");
const RETURN_POLICY_FIXTURE: &str = include_str!("../../fixtures/return_policy.json");

const FEATURED_PER_KIND: usize = 4;

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("invalid {name} fixture: {source}")]
    Fixture {
        name: &'static str,
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: i64,
    pub title: String,
    pub body: String,
    pub category: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: i64,
    pub title: String,
    pub size: String,
    pub color: String,
    pub quantity: i64,
    pub price: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub order_number: String,
    pub placed_at: DateTime<Utc>,
    pub status: String,
    pub items: Vec<OrderLine>,
    pub total: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct PolicySection {
    pub heading: String,
    pub body: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct PolicyDocument {
    pub title: String,
    pub last_updated: String,
    pub sections: Vec<PolicySection>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct Banner {
    pub headline: String,
    pub subheadline: String,
    pub cta_label: String,
    pub cta_href: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct HomeContent {
    pub banner: Banner,
    pub featured_dresses: Vec<Product>,
    pub featured_tops: Vec<Product>,
}

fn parse<T: for<'de> Deserialize<'de>>(name: &'static str, raw: &str) -> Result<T, ContentError> {
    serde_json::from_str(raw).map_err(|source| ContentError::Fixture { name, source })
}

#[derive(Debug, Clone)]
pub struct ContentService {
    home: HomeContent,
    notifications: Vec<Notification>,
    orders: Vec<Order>,
    terms: PolicyDocument,
    return_policy: PolicyDocument,
}

impl ContentService {
    pub fn load(catalog: &StaticCatalog) -> Result<Self, ContentError> {
        let featured = |kind| {
            catalog
                .listing(kind)
                .iter()
                .take(FEATURED_PER_KIND)
                .cloned()
                .collect::<Vec<_>>()
        };

        Ok(Self {
            home: HomeContent {
                banner: Banner {
                    headline: "New Season, New Favourites".to_string(),
                    subheadline: "Dresses and tops made for warmer days.".to_string(),
                    cta_label: "Shop dresses".to_string(),
                    cta_href: "/dresses".to_string(),
                },
                featured_dresses: featured(ProductKind::Dress),
                featured_tops: featured(ProductKind::Top),
            },
            notifications: parse("notifications", NOTIFICATIONS_FIXTURE)?,
            orders: parse("orders", ORDERS_FIXTURE)?,
            terms: parse("terms", TERMS_FIXTURE)?,
            return_policy: parse("return policy", RETURN_POLICY_FIXTURE)?,
        })
    }

    pub fn home(&self) -> &HomeContent {
        &self.home
    }

    /// Newest first.
    pub fn notifications(&self) -> Vec<Notification> {
        let mut notifications = self.notifications.clone();
        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        notifications
    }

    pub fn order_history(&self) -> &[Order] {
        &self.orders
    }

    pub fn terms(&self) -> &PolicyDocument {
        &self.terms
    }

    pub fn return_policy(&self) -> &PolicyDocument {
        &self.return_policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content() -> ContentService {
        ContentService::load(&StaticCatalog::load().unwrap()).unwrap()
    }

    #[test]
    fn fixtures_load() {
        let content = content();
        assert_eq!(content.home().featured_dresses.len(), FEATURED_PER_KIND);
        assert!(content.home().featured_tops.iter().all(|p| p.kind == ProductKind::Top));
        assert_eq!(content.terms().title, "Terms of Service");
        assert!(!content.return_policy().sections.is_empty());
        assert_eq!(content.order_history()[0].order_number, "SF-10422");
    }

    #[test]
    fn notifications_are_newest_first() {
        let notifications = content().notifications();
        assert!(
            notifications
                .windows(2)
                .all(|pair| pair[0].created_at >= pair[1].created_at)
        );
    }
}
