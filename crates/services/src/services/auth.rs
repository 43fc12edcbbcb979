//! Placeholder authentication: in-memory users and bearer tokens.
//!
//! Nothing here is meant to protect real accounts. Passwords are salted and
//! hashed so that they are never held in clear text, and tokens are random,
//! but there is no expiry, rate limiting or persistence.

use dashmap::{DashMap, mapref::entry::Entry};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, info};
use ts_rs::TS;
use uuid::Uuid;

pub const DEMO_EMAIL: &str = "demo@storefront.test";
pub const DEMO_PASSWORD: &str = "password123";
const MIN_PASSWORD_LEN: usize = 8;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("valid regex")
});

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),
    #[error("An account with this email already exists")]
    EmailTaken,
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Authentication required")]
    Unauthorized,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    pub token: String,
    pub user: AuthUser,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone)]
struct StoredUser {
    user: AuthUser,
    salt: String,
    password_hash: String,
}

fn hash_password(salt: &str, password: &str) -> String {
    let digest = Sha256::new()
        .chain_update(salt.as_bytes())
        .chain_update(b":")
        .chain_update(password.as_bytes())
        .finalize();
    format!("{:x}", digest)
}

fn credentials(email: Option<String>, password: Option<String>) -> Result<(String, String), AuthError> {
    let email = email
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty())
        .ok_or_else(|| AuthError::Validation("Email and password are required".to_string()))?;
    let password = password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AuthError::Validation("Email and password are required".to_string()))?;
    if !is_valid_email(&email) {
        return Err(AuthError::Validation("Email address is invalid".to_string()));
    }
    Ok((email, password))
}

#[derive(Debug, Default)]
pub struct AuthService {
    users: DashMap<String, StoredUser>,
    tokens: DashMap<String, String>,
}

impl AuthService {
    pub fn new() -> Self {
        Self::default()
    }

    /// A service with one demo account already registered.
    pub fn with_demo_user() -> Self {
        let service = Self::new();
        service.insert_user("Demo Shopper", DEMO_EMAIL, DEMO_PASSWORD);
        service
    }

    fn insert_user(&self, name: &str, email: &str, password: &str) -> Option<AuthUser> {
        match self.users.entry(email.to_string()) {
            Entry::Occupied(_) => None,
            Entry::Vacant(slot) => {
                let salt = Uuid::new_v4().simple().to_string();
                let user = AuthUser {
                    id: Uuid::new_v4(),
                    email: email.to_string(),
                    name: name.to_string(),
                };
                slot.insert(StoredUser {
                    user: user.clone(),
                    password_hash: hash_password(&salt, password),
                    salt,
                });
                Some(user)
            }
        }
    }

    fn issue_token(&self, user: AuthUser) -> AuthSession {
        let token = format!("sf_{}", Uuid::new_v4().simple());
        self.tokens.insert(token.clone(), user.email.clone());
        AuthSession { token, user }
    }

    pub fn register(&self, request: RegisterRequest) -> Result<AuthSession, AuthError> {
        let name = request
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| AuthError::Validation("Name is required".to_string()))?;
        let (email, password) = credentials(request.email, request.password)?;
        if password.len() < MIN_PASSWORD_LEN {
            return Err(AuthError::Validation(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        let user = self
            .insert_user(&name, &email, &password)
            .ok_or(AuthError::EmailTaken)?;
        info!(user_id = %user.id, "Registered account");
        Ok(self.issue_token(user))
    }

    pub fn login(&self, request: LoginRequest) -> Result<AuthSession, AuthError> {
        let (email, password) = credentials(request.email, request.password)?;

        let user = {
            let stored = self.users.get(&email).ok_or(AuthError::InvalidCredentials)?;
            if hash_password(&stored.salt, &password) != stored.password_hash {
                debug!("Rejected login with wrong password");
                return Err(AuthError::InvalidCredentials);
            }
            stored.user.clone()
        };

        info!(user_id = %user.id, "Signed in");
        Ok(self.issue_token(user))
    }

    /// Resolve the user behind `token`. Missing or unknown tokens are
    /// `Unauthorized`.
    pub fn session(&self, token: Option<&str>) -> Result<AuthUser, AuthError> {
        let token = token.ok_or(AuthError::Unauthorized)?;
        let email = self
            .tokens
            .get(token)
            .map(|e| e.value().clone())
            .ok_or(AuthError::Unauthorized)?;
        self.users
            .get(&email)
            .map(|stored| stored.user.clone())
            .ok_or(AuthError::Unauthorized)
    }

    pub fn logout(&self, token: Option<&str>) -> Result<AuthUser, AuthError> {
        let user = self.session(token)?;
        if let Some(token) = token {
            self.tokens.remove(token);
        }
        info!(user_id = %user.id, "Signed out");
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn login(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: Some(email.to_string()),
            password: Some(password.to_string()),
        }
    }

    #[test]
    fn email_validation() {
        assert!(is_valid_email("ana@example.com"));
        assert!(!is_valid_email("ana@example"));
        assert!(!is_valid_email("@example.com"));
    }

    #[test]
    fn demo_user_can_sign_in_and_out() {
        let auth = AuthService::with_demo_user();
        let session = auth.login(login("Demo@Storefront.test", DEMO_PASSWORD)).unwrap();

        assert_eq!(auth.session(Some(&session.token)).unwrap().email, DEMO_EMAIL);
        auth.logout(Some(&session.token)).unwrap();
        assert!(matches!(auth.session(Some(&session.token)), Err(AuthError::Unauthorized)));
        assert!(matches!(auth.logout(None), Err(AuthError::Unauthorized)));
    }

    #[test]
    fn wrong_password_is_rejected() {
        let auth = AuthService::with_demo_user();
        assert!(matches!(
            auth.login(login(DEMO_EMAIL, "nope-nope")),
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.login(login("", DEMO_PASSWORD)),
            Err(AuthError::Validation(_))
        ));
    }

    #[test]
    fn register_rejects_duplicates_and_short_passwords() {
        let auth = AuthService::new();
        let request = RegisterRequest {
            name: Some("Ana".to_string()),
            email: Some("ana@example.com".to_string()),
            password: Some("correct horse".to_string()),
        };

        auth.register(request.clone()).unwrap();
        assert!(matches!(auth.register(request.clone()), Err(AuthError::EmailTaken)));
        assert!(matches!(
            auth.register(RegisterRequest {
                email: Some("ben@example.com".to_string()),
                password: Some("short".to_string()),
                ..request
            }),
            Err(AuthError::Validation(_))
        ));
    }

    #[test]
    fn stored_hash_is_salted() {
        assert_ne!(hash_password("a", "secret"), hash_password("b", "secret"));
        assert_eq!(hash_password("a", "secret").len(), 64);
    }
}
