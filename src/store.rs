//! Diet start persistence
//!
//! The scheduler needs exactly one stored value per pet: the instant the diet
//! was started. It lives behind a two-method trait so the service does not
//! care whether it ends up in SQLite or in memory.
//!
//! Instants are stored as ISO-8601 strings in UTC (`...Z`), keeping as many
//! fractional digits as the instant has. Any RFC 3339 string is accepted on
//! read, including millisecond strings written by other clients.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::SqlitePool;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::models::DietStartRow;

// ---------------------------------------------------------------------------
/// Error Types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Stored start instant for {pet_id} is not a valid ISO-8601 timestamp: {value}")]
    InvalidTimestamp {
        pet_id: String,
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

pub fn encode_instant(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

pub fn decode_instant(pet_id: &str, value: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::InvalidTimestamp {
            pet_id: pet_id.to_string(),
            value: value.to_string(),
            source: e,
        })
}

// ---------------------------------------------------------------------------
/// Storage Trait
// ---------------------------------------------------------------------------

/// Read/write of the one optional start instant kept per pet
#[async_trait]
pub trait StartInstantStore: Send + Sync {
    /// `None` means the diet was never started for this pet
    async fn load_start_instant(&self, pet_id: &str) -> Result<Option<DateTime<Utc>>, StoreError>;

    /// Overwrites any previous value
    async fn save_start_instant(
        &self,
        pet_id: &str,
        started_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;
}

// ---------------------------------------------------------------------------
/// SQLite Store
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SqliteStartInstantStore {
    pool: SqlitePool,
}

impl SqliteStartInstantStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Raw row for a pet, without decoding the timestamp
    pub async fn load_row(&self, pet_id: &str) -> Result<Option<DietStartRow>, StoreError> {
        let row = sqlx::query_as::<_, DietStartRow>(
            "SELECT pet_id, started_at, updated_at FROM diet_starts WHERE pet_id = ?",
        )
        .bind(pet_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }
}

#[async_trait]
impl StartInstantStore for SqliteStartInstantStore {
    async fn load_start_instant(&self, pet_id: &str) -> Result<Option<DateTime<Utc>>, StoreError> {
        self.load_row(pet_id)
            .await?
            .map(|row| decode_instant(&row.pet_id, &row.started_at))
            .transpose()
    }

    async fn save_start_instant(
        &self,
        pet_id: &str,
        started_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO diet_starts (pet_id, started_at, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(pet_id) DO UPDATE SET
                started_at = excluded.started_at,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(pet_id)
        .bind(encode_instant(started_at))
        .bind(encode_instant(Utc::now()))
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// ---------------------------------------------------------------------------
/// In-Memory Store
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct MemoryStartInstantStore {
    starts: RwLock<HashMap<String, DateTime<Utc>>>,
}

impl MemoryStartInstantStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StartInstantStore for MemoryStartInstantStore {
    async fn load_start_instant(&self, pet_id: &str) -> Result<Option<DateTime<Utc>>, StoreError> {
        Ok(self.starts.read().await.get(pet_id).copied())
    }

    async fn save_start_instant(
        &self,
        pet_id: &str,
        started_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.starts.write().await.insert(pet_id.to_string(), started_at);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
/// Tests
// ---------------------------------------------------------------------------
