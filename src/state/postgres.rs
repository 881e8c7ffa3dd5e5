//! Postgres-backed analysis store (sqlx)

use super::AnalysisStore;
use crate::error::AnalyzerError;
use crate::models::AnalysisRecord;
use crate::Result;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use std::sync::Arc;
use tokio::sync::OnceCell;

pub struct PostgresAnalysisStore {
    pool: PgPool,
    schema_ready: Arc<OnceCell<()>>,
}

impl PostgresAnalysisStore {
    /// Build a pool without connecting; the first query opens connections.
    pub fn connect_lazy(url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect_lazy(url)
            .map_err(|e| AnalyzerError::DatabaseError(format!("Invalid database URL: {}", e)))?;

        Ok(Self {
            pool,
            schema_ready: Arc::new(OnceCell::new()),
        })
    }

    async fn ensure_schema(&self) -> Result<()> {
        self.schema_ready
            .get_or_try_init(|| async {
                sqlx::query(
                    r#"
                    CREATE TABLE IF NOT EXISTS analysis (
                      id TEXT PRIMARY KEY,
                      query TEXT NOT NULL,
                      result TEXT NOT NULL,
                      file_name TEXT,
                      created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                    );
                    "#,
                )
                .execute(&self.pool)
                .await?;

                sqlx::query(
                    "CREATE INDEX IF NOT EXISTS idx_analysis_created_at ON analysis (created_at);",
                )
                .execute(&self.pool)
                .await?;

                Ok::<(), sqlx::Error>(())
            })
            .await
            .map_err(|e| {
                AnalyzerError::DatabaseError(format!(
                    "Failed to initialize analysis schema: {}",
                    e
                ))
            })?;

        Ok(())
    }

    fn record_from_row(row: &PgRow) -> Result<AnalysisRecord> {
        let decode = |e: sqlx::Error| {
            AnalyzerError::DatabaseError(format!("Failed to decode analysis row: {}", e))
        };

        Ok(AnalysisRecord {
            id: row.try_get("id").map_err(decode)?,
            query: row.try_get("query").map_err(decode)?,
            result: row.try_get("result").map_err(decode)?,
            file_name: row.try_get("file_name").map_err(decode)?,
            created_at: row
                .try_get::<DateTime<Utc>, _>("created_at")
                .map_err(decode)?,
        })
    }
}

#[async_trait::async_trait]
impl AnalysisStore for PostgresAnalysisStore {
    async fn save(&self, record: &AnalysisRecord) -> Result<()> {
        self.ensure_schema().await?;

        sqlx::query(
            r#"
            INSERT INTO analysis (id, query, result, file_name, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&record.id)
        .bind(&record.query)
        .bind(&record.result)
        .bind(&record.file_name)
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AnalyzerError::DatabaseError(format!("Failed to insert analysis record: {}", e))
        })?;

        Ok(())
    }

    async fn list(&self) -> Result<Vec<AnalysisRecord>> {
        self.ensure_schema().await?;

        let rows = sqlx::query(
            r#"
            SELECT id, query, result, file_name, created_at
            FROM analysis
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AnalyzerError::DatabaseError(format!("Failed to load history: {}", e)))?;

        rows.iter().map(Self::record_from_row).collect()
    }

    async fn get(&self, id: &str) -> Result<Option<AnalysisRecord>> {
        self.ensure_schema().await?;

        let row = sqlx::query(
            "SELECT id, query, result, file_name, created_at FROM analysis WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AnalyzerError::DatabaseError(format!("Failed to load analysis: {}", e)))?;

        row.as_ref().map(Self::record_from_row).transpose()
    }
}
