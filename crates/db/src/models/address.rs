use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: Uuid,
    #[serde(skip)]
    #[ts(skip)]
    pub session_id: String,
    pub full_name: String,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub postal_code: String,
    pub country: String,
    pub phone: Option<String>,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

/// Request body for creating an address. Every field is optional on the wire
/// so missing values surface as validation errors rather than parse errors.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct CreateAddress {
    pub full_name: Option<String>,
    pub line1: Option<String>,
    pub line2: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub phone: Option<String>,
    pub is_default: Option<bool>,
}

/// A `CreateAddress` that passed validation
#[derive(Debug, Clone)]
pub struct NewAddress {
    pub full_name: String,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub postal_code: String,
    pub country: String,
    pub phone: Option<String>,
    pub is_default: bool,
}

const ADDRESS_COLUMNS: &str = "id, session_id, full_name, line1, line2, city, postal_code, \
     country, phone, is_default, created_at";

impl Address {
    pub async fn create(
        pool: &SqlitePool,
        session_id: &str,
        data: &NewAddress,
    ) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let existing: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM addresses WHERE session_id = ?")
                .bind(session_id)
                .fetch_one(&mut *tx)
                .await?;
        // The first address is the default whatever the request says.
        let is_default = data.is_default || existing == 0;
        if is_default {
            sqlx::query("UPDATE addresses SET is_default = 0 WHERE session_id = ?")
                .bind(session_id)
                .execute(&mut *tx)
                .await?;
        }

        let sql = format!(
            "INSERT INTO addresses ({ADDRESS_COLUMNS})
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING {ADDRESS_COLUMNS}"
        );
        let address = sqlx::query_as::<_, Address>(&sql)
            .bind(Uuid::new_v4())
            .bind(session_id)
            .bind(&data.full_name)
            .bind(&data.line1)
            .bind(&data.line2)
            .bind(&data.city)
            .bind(&data.postal_code)
            .bind(&data.country)
            .bind(&data.phone)
            .bind(is_default)
            .bind(Utc::now())
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(address)
    }

    pub async fn find_by_session(
        pool: &SqlitePool,
        session_id: &str,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let sql = format!(
            "SELECT {ADDRESS_COLUMNS} FROM addresses
             WHERE session_id = ?
             ORDER BY is_default DESC, created_at ASC"
        );
        sqlx::query_as::<_, Address>(&sql)
            .bind(session_id)
            .fetch_all(pool)
            .await
    }

    pub async fn delete(pool: &SqlitePool, session_id: &str, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM addresses WHERE session_id = ? AND id = ?")
            .bind(session_id)
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
