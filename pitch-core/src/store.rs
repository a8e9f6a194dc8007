//! Pitch persistence.
//!
//! Records are written once and never updated. Every read is scoped to an
//! owner id, so one user's pitches are invisible to another.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{PitchContent, PitchRecord};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait PitchStore: Send + Sync {
    /// Persist a new record, assigning its id and creation time.
    async fn create(
        &self,
        owner_id: &str,
        idea: &str,
        content: &PitchContent,
    ) -> Result<PitchRecord, StoreError>;

    /// All records of `owner_id`, newest first.
    async fn list(&self, owner_id: &str) -> Result<Vec<PitchRecord>, StoreError>;

    async fn get(&self, owner_id: &str, id: Uuid) -> Result<Option<PitchRecord>, StoreError>;

    /// Short backend description for health output.
    async fn health(&self) -> Result<String, StoreError>;

    fn name(&self) -> &str;
}

// ============================================================================
// Postgres
// ============================================================================

#[derive(sqlx::FromRow)]
struct PitchRow {
    id: Uuid,
    owner_id: String,
    idea: String,
    content: Json<PitchContent>,
    created_at: DateTime<Utc>,
}

impl From<PitchRow> for PitchRecord {
    fn from(row: PitchRow) -> Self {
        Self {
            id: row.id,
            owner_id: row.owner_id,
            idea: row.idea,
            content: row.content.0,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PgPitchStore {
    pool: PgPool,
}

impl PgPitchStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl PitchStore for PgPitchStore {
    async fn create(
        &self,
        owner_id: &str,
        idea: &str,
        content: &PitchContent,
    ) -> Result<PitchRecord, StoreError> {
        let row: PitchRow = sqlx::query_as(
            r#"
            INSERT INTO pitches (id, owner_id, idea, content, created_at)
            VALUES ($1, $2, $3, $4, now())
            RETURNING id, owner_id, idea, content, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(owner_id)
        .bind(idea)
        .bind(Json(content))
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(id = %row.id, owner = %row.owner_id, "Stored pitch");
        Ok(row.into())
    }

    async fn list(&self, owner_id: &str) -> Result<Vec<PitchRecord>, StoreError> {
        let rows: Vec<PitchRow> = sqlx::query_as(
            "SELECT id, owner_id, idea, content, created_at FROM pitches WHERE owner_id = $1 ORDER BY created_at DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(PitchRecord::from).collect())
    }

    async fn get(&self, owner_id: &str, id: Uuid) -> Result<Option<PitchRecord>, StoreError> {
        let row: Option<PitchRow> = sqlx::query_as(
            "SELECT id, owner_id, idea, content, created_at FROM pitches WHERE id = $1 AND owner_id = $2",
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(PitchRecord::from))
    }

    async fn health(&self) -> Result<String, StoreError> {
        Ok(crate::db::health_check(&self.pool).await?)
    }

    fn name(&self) -> &str {
        "postgres"
    }
}

// ============================================================================
// In-memory
// ============================================================================

/// Process-local store for development and tests. Contents are lost on exit.
#[derive(Debug, Default)]
pub struct MemoryPitchStore {
    records: RwLock<Vec<PitchRecord>>,
}

impl MemoryPitchStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PitchStore for MemoryPitchStore {
    async fn create(
        &self,
        owner_id: &str,
        idea: &str,
        content: &PitchContent,
    ) -> Result<PitchRecord, StoreError> {
        let record = PitchRecord {
            id: Uuid::new_v4(),
            owner_id: owner_id.to_string(),
            idea: idea.to_string(),
            content: content.clone(),
            created_at: Utc::now(),
        };
        self.records.write().await.push(record.clone());
        tracing::info!(id = %record.id, owner = %record.owner_id, "Stored pitch in memory");
        Ok(record)
    }

    async fn list(&self, owner_id: &str) -> Result<Vec<PitchRecord>, StoreError> {
        let records = self.records.read().await;
        let mut owned: Vec<PitchRecord> = records
            .iter()
            .rev()
            .filter(|r| r.owner_id == owner_id)
            .cloned()
            .collect();
        // Stable sort: later inserts stay first when timestamps tie.
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned)
    }

    async fn get(&self, owner_id: &str, id: Uuid) -> Result<Option<PitchRecord>, StoreError> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .find(|r| r.id == id && r.owner_id == owner_id)
            .cloned())
    }

    async fn health(&self) -> Result<String, StoreError> {
        let count = self.records.read().await.len();
        Ok(format!("memory ({} pitches)", count))
    }

    fn name(&self) -> &str {
        "memory"
    }
}
