//! Addresses, stored payment methods and newsletter subscriptions.

use chrono::{Datelike, Utc};
use db::models::{
    address::{Address, CreateAddress, NewAddress},
    payment_method::{CreatePaymentMethod, NewPaymentMethod, PaymentMethod},
    subscription::Subscription,
};
use once_cell::sync::Lazy;
use regex::Regex;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use super::auth::is_valid_email;

static POSTAL_CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9 -]{1,9}$").expect("valid regex"));
static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9 ()-]{7,20}$").expect("valid regex"));
static EXPIRY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(0[1-9]|1[0-2])/([0-9]{2})$").expect("valid regex"));

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("{0}")]
    Validation(String),
    #[error("Address not found")]
    AddressNotFound,
    #[error("Email is already subscribed")]
    AlreadySubscribed,
}

fn required(value: Option<String>, field: &str) -> Result<String, AccountError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AccountError::Validation(format!("{field} is required")))
}

fn optional(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

pub fn validate_address(data: CreateAddress) -> Result<NewAddress, AccountError> {
    let address = NewAddress {
        full_name: required(data.full_name, "Full name")?,
        line1: required(data.line1, "Address line 1")?,
        line2: optional(data.line2),
        city: required(data.city, "City")?,
        postal_code: required(data.postal_code, "Postal code")?,
        country: required(data.country, "Country")?,
        phone: optional(data.phone),
        is_default: data.is_default.unwrap_or(false),
    };

    if !POSTAL_CODE_RE.is_match(&address.postal_code) {
        return Err(AccountError::Validation("Postal code is invalid".to_string()));
    }
    if let Some(phone) = &address.phone {
        if !PHONE_RE.is_match(phone) {
            return Err(AccountError::Validation("Phone number is invalid".to_string()));
        }
    }
    Ok(address)
}

/// Luhn checksum over a digits-only card number.
pub fn luhn_valid(digits: &str) -> bool {
    let mut sum = 0;
    for (i, c) in digits.chars().rev().enumerate() {
        let Some(mut d) = c.to_digit(10) else {
            return false;
        };
        if i % 2 == 1 {
            d *= 2;
            if d > 9 {
                d -= 9;
            }
        }
        sum += d;
    }
    sum % 10 == 0
}

pub fn card_brand(digits: &str) -> &'static str {
    let prefix2: u32 = digits.get(..2).and_then(|p| p.parse().ok()).unwrap_or(0);
    let prefix4: u32 = digits.get(..4).and_then(|p| p.parse().ok()).unwrap_or(0);
    if digits.starts_with('4') {
        "Visa"
    } else if (51..=55).contains(&prefix2) || (2221..=2720).contains(&prefix4) {
        "Mastercard"
    } else if prefix2 == 34 || prefix2 == 37 {
        "Amex"
    } else if prefix4 == 6011 || prefix2 == 65 {
        "Discover"
    } else {
        "Card"
    }
}

pub fn validate_payment_method(data: CreatePaymentMethod) -> Result<NewPaymentMethod, AccountError> {
    let raw_number = required(data.card_number, "Card number")?;
    let digits: String = raw_number.chars().filter(|c| !c.is_whitespace()).collect();
    if !(13..=19).contains(&digits.len())
        || !digits.chars().all(|c| c.is_ascii_digit())
        || !luhn_valid(&digits)
    {
        return Err(AccountError::Validation("Card number is invalid".to_string()));
    }

    let expiry = required(data.expiry, "Expiry")?;
    let captures = EXPIRY_RE
        .captures(&expiry)
        .ok_or_else(|| AccountError::Validation("Expiry must be MM/YY".to_string()))?;
    let month: u32 = captures[1].parse().unwrap_or(0);
    let year: i32 = 2000 + captures[2].parse::<i32>().unwrap_or(0);
    let today = Utc::now().date_naive();
    if (year, month) < (today.year(), today.month()) {
        return Err(AccountError::Validation("Card has expired".to_string()));
    }

    Ok(NewPaymentMethod {
        brand: card_brand(&digits).to_string(),
        last4: digits[digits.len() - 4..].to_string(),
        expiry,
        holder_name: required(data.holder_name, "Cardholder name")?,
        is_default: data.is_default.unwrap_or(false),
    })
}

#[derive(Clone)]
pub struct AccountService {
    pool: SqlitePool,
}

impl AccountService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn addresses(&self, session_id: &str) -> Result<Vec<Address>, AccountError> {
        Ok(Address::find_by_session(&self.pool, session_id).await?)
    }

    pub async fn add_address(
        &self,
        session_id: &str,
        data: CreateAddress,
    ) -> Result<Address, AccountError> {
        let address = validate_address(data)?;
        let created = Address::create(&self.pool, session_id, &address).await?;
        info!(session_id, address_id = %created.id, "Address saved");
        Ok(created)
    }

    pub async fn delete_address(&self, session_id: &str, id: Uuid) -> Result<(), AccountError> {
        match Address::delete(&self.pool, session_id, id).await? {
            0 => Err(AccountError::AddressNotFound),
            _ => Ok(()),
        }
    }

    pub async fn payment_methods(
        &self,
        session_id: &str,
    ) -> Result<Vec<PaymentMethod>, AccountError> {
        Ok(PaymentMethod::find_by_session(&self.pool, session_id).await?)
    }

    pub async fn add_payment_method(
        &self,
        session_id: &str,
        data: CreatePaymentMethod,
    ) -> Result<PaymentMethod, AccountError> {
        let method = validate_payment_method(data)?;
        let created = PaymentMethod::create(&self.pool, session_id, &method).await?;
        info!(session_id, brand = %created.brand, last4 = %created.last4, "Payment method saved");
        Ok(created)
    }

    pub async fn subscribe(&self, email: Option<String>) -> Result<Subscription, AccountError> {
        let email = required(email, "Email")?.to_lowercase();
        if !is_valid_email(&email) {
            return Err(AccountError::Validation("Email address is invalid".to_string()));
        }
        Subscription::create(&self.pool, &email)
            .await?
            .ok_or(AccountError::AlreadySubscribed)
    }
}

#[cfg(test)]
mod tests {
    use db::DBService;

    use super::*;

    fn address() -> CreateAddress {
        CreateAddress {
            full_name: Some("Ana Lima".to_string()),
            line1: Some("12 Rue Haute".to_string()),
            city: Some("Lyon".to_string()),
            postal_code: Some("69001".to_string()),
            country: Some("FR".to_string()),
            ..CreateAddress::default()
        }
    }

    fn card(number: &str, expiry: &str) -> CreatePaymentMethod {
        CreatePaymentMethod {
            card_number: Some(number.to_string()),
            expiry: Some(expiry.to_string()),
            holder_name: Some("Ana Lima".to_string()),
            is_default: None,
        }
    }

    #[test]
    fn address_requires_fields() {
        let err = validate_address(CreateAddress {
            city: None,
            ..address()
        })
        .unwrap_err();
        assert_eq!(err.to_string(), "City is required");

        let err = validate_address(CreateAddress {
            phone: Some("call me".to_string()),
            ..address()
        })
        .unwrap_err();
        assert_eq!(err.to_string(), "Phone number is invalid");

        assert!(validate_address(address()).is_ok());
    }

    #[test]
    fn card_checks() {
        assert!(luhn_valid("4111111111111111"));
        assert!(!luhn_valid("4111111111111112"));
        assert_eq!(card_brand("5500000000000004"), "Mastercard");
        assert_eq!(card_brand("378282246310005"), "Amex");

        let method = validate_payment_method(card("4111 1111 1111 1111", "12/99")).unwrap();
        assert_eq!(method.brand, "Visa");
        assert_eq!(method.last4, "1111");

        assert!(validate_payment_method(card("4111 1111 1111 1112", "12/99")).is_err());
        assert!(validate_payment_method(card("4111111111111111", "13/99")).is_err());
        assert!(validate_payment_method(card("4111111111111111", "01/20")).is_err());
    }

    #[tokio::test]
    async fn duplicate_subscription_conflicts() {
        let db = DBService::new_in_memory().await.unwrap();
        let account = AccountService::new(db.pool);

        account.subscribe(Some("Ana@Example.com".to_string())).await.unwrap();
        assert!(matches!(
            account.subscribe(Some("ana@example.com".to_string())).await,
            Err(AccountError::AlreadySubscribed)
        ));
        assert!(matches!(
            account.subscribe(Some("not-an-email".to_string())).await,
            Err(AccountError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn delete_missing_address() {
        let db = DBService::new_in_memory().await.unwrap();
        let account = AccountService::new(db.pool);
        let saved = account.add_address("s", address()).await.unwrap();

        assert!(matches!(
            account.delete_address("other", saved.id).await,
            Err(AccountError::AddressNotFound)
        ));
        account.delete_address("s", saved.id).await.unwrap();
    }
}
