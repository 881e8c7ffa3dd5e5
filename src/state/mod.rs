//! Analysis persistence layer
//!
//! Completed analyses are written once and listed by `/history`.
//! Postgres when a database URL is configured, in-memory otherwise.

use crate::config::AppConfig;
use crate::models::AnalysisRecord;
use crate::Result;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

pub mod postgres;
pub use postgres::PostgresAnalysisStore;

/// Trait for analysis persistence
#[async_trait::async_trait]
pub trait AnalysisStore: Send + Sync {
    async fn save(&self, record: &AnalysisRecord) -> Result<()>;
    /// All records, oldest first
    async fn list(&self) -> Result<Vec<AnalysisRecord>>;
    async fn get(&self, id: &str) -> Result<Option<AnalysisRecord>>;
}

/// In-memory store for development and tests
pub struct InMemoryAnalysisStore {
    records: Arc<RwLock<Vec<AnalysisRecord>>>,
}

impl InMemoryAnalysisStore {
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

impl Default for InMemoryAnalysisStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl AnalysisStore for InMemoryAnalysisStore {
    async fn save(&self, record: &AnalysisRecord) -> Result<()> {
        let mut records = self.records.write().await;

        if records.iter().any(|r| r.id == record.id) {
            return Err(crate::error::AnalyzerError::DatabaseError(format!(
                "Duplicate analysis id {}",
                record.id
            )));
        }

        records.push(record.clone());
        Ok(())
    }

    async fn list(&self) -> Result<Vec<AnalysisRecord>> {
        let records = self.records.read().await;
        Ok(records.clone())
    }

    async fn get(&self, id: &str) -> Result<Option<AnalysisRecord>> {
        let records = self.records.read().await;
        Ok(records.iter().find(|r| r.id == id).cloned())
    }
}

/// Pick the backend from configuration, falling back to in-memory.
pub fn build_store(config: &AppConfig) -> Arc<dyn AnalysisStore> {
    if let Some(url) = &config.database_url {
        match PostgresAnalysisStore::connect_lazy(url) {
            Ok(store) => {
                info!("Analysis store backend: postgres");
                return Arc::new(store);
            }
            Err(error) => {
                warn!(
                    "Failed to initialize postgres analysis store, falling back to in-memory: {}",
                    error
                );
            }
        }
    }

    info!("Analysis store backend: in-memory");
    Arc::new(InMemoryAnalysisStore::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_and_list_in_order() {
        let store = InMemoryAnalysisStore::new();
        let first = AnalysisRecord::new("q1".into(), "r1".into(), Some("data/a.pdf".into()));
        let second = AnalysisRecord::new("q2".into(), "r2".into(), None);

        store.save(&first).await.unwrap();
        store.save(&second).await.unwrap();

        let records = store.list().await.unwrap();
        assert_eq!(records, vec![first.clone(), second]);
        assert_eq!(store.get(&first.id).await.unwrap(), Some(first));
        assert!(store.get("unknown").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_id_rejected() {
        let store = InMemoryAnalysisStore::new();
        let record = AnalysisRecord::new("q".into(), "r".into(), None);
        tokio_test::assert_ok!(store.save(&record).await);
        assert!(store.save(&record).await.is_err());
    }

    #[tokio::test]
    async fn test_build_store_without_database_is_in_memory() {
        let config = AppConfig::from_lookup(|_| None).unwrap();
        let store = build_store(&config);
        assert!(store.list().await.unwrap().is_empty());
    }
}
