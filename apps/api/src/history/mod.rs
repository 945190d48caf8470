//! History recorder. Best-effort persistence of analysis summaries.
//!
//! The pipeline depends only on `HistoryRepository`. Writes happen after a
//! report has been built; a failed write is logged by the caller and never
//! affects the response.

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::models::report::HistoryRecord;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait HistoryRepository: Send + Sync {
    async fn record(&self, user_key: &str, record: &HistoryRecord) -> Result<(), HistoryError>;
}

/// Storage key for a user identity. Dots are replaced so e-mail addresses are
/// usable as path-like keys.
pub fn sanitize_user_key(user_id: &str) -> String {
    user_id.replace('.', "_")
}

/// Appends records to the `analysis_history` table.
pub struct PgHistoryRepository {
    db: PgPool,
}

impl PgHistoryRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl HistoryRepository for PgHistoryRepository {
    async fn record(&self, user_key: &str, record: &HistoryRecord) -> Result<(), HistoryError> {
        sqlx::query(
            r#"
            INSERT INTO analysis_history
                (id, user_key, job_description, filename, match_percentage, missing_keywords, recorded_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_key)
        .bind(&record.job_description)
        .bind(&record.filename)
        .bind(record.match_percentage)
        .bind(Json(&record.missing_keywords))
        .bind(record.timestamp)
        .execute(&self.db)
        .await?;
        Ok(())
    }
}

/// Used when no database is configured. Accepts and drops every record.
pub struct DisabledHistory;

impl DisabledHistory {
    pub fn new() -> Self {
        info!("DATABASE_URL not set; analysis history is disabled");
        DisabledHistory
    }
}

#[async_trait]
impl HistoryRepository for DisabledHistory {
    async fn record(&self, _user_key: &str, _record: &HistoryRecord) -> Result<(), HistoryError> {
        Ok(())
    }
}
