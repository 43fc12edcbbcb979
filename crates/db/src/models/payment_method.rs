use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

/// Stored card. Only the brand and last four digits are ever kept.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethod {
    pub id: Uuid,
    #[serde(skip)]
    #[ts(skip)]
    pub session_id: String,
    pub brand: String,
    pub last4: String,
    pub expiry: String,
    pub holder_name: String,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentMethod {
    pub card_number: Option<String>,
    pub expiry: Option<String>,
    pub holder_name: Option<String>,
    pub is_default: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct NewPaymentMethod {
    pub brand: String,
    pub last4: String,
    pub expiry: String,
    pub holder_name: String,
    pub is_default: bool,
}

const PAYMENT_COLUMNS: &str =
    "id, session_id, brand, last4, expiry, holder_name, is_default, created_at";

impl PaymentMethod {
    pub async fn create(
        pool: &SqlitePool,
        session_id: &str,
        data: &NewPaymentMethod,
    ) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let existing: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM payment_methods WHERE session_id = ?")
                .bind(session_id)
                .fetch_one(&mut *tx)
                .await?;
        let is_default = data.is_default || existing == 0;
        if is_default {
            sqlx::query("UPDATE payment_methods SET is_default = 0 WHERE session_id = ?")
                .bind(session_id)
                .execute(&mut *tx)
                .await?;
        }

        let sql = format!(
            "INSERT INTO payment_methods ({PAYMENT_COLUMNS})
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING {PAYMENT_COLUMNS}"
        );
        let method = sqlx::query_as::<_, PaymentMethod>(&sql)
            .bind(Uuid::new_v4())
            .bind(session_id)
            .bind(&data.brand)
            .bind(&data.last4)
            .bind(&data.expiry)
            .bind(&data.holder_name)
            .bind(is_default)
            .bind(Utc::now())
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(method)
    }

    pub async fn find_by_session(
        pool: &SqlitePool,
        session_id: &str,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let sql = format!(
            "SELECT {PAYMENT_COLUMNS} FROM payment_methods
             WHERE session_id = ?
             ORDER BY is_default DESC, created_at ASC"
        );
        sqlx::query_as::<_, PaymentMethod>(&sql)
            .bind(session_id)
            .fetch_all(pool)
            .await
    }
}
