//! Background document processing
//!
//! One detached task per accepted upload: run the crew, persist the result,
//! then delete the upload no matter how the run ended. Failures are logged,
//! never returned to the client.

use crate::agent::Crew;
use crate::models::{AnalysisRecord, CrewInputs};
use crate::state::AnalysisStore;
use crate::Result;
use std::path::Path;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

#[derive(Clone)]
pub struct DocumentProcessor {
    crew: Arc<Crew>,
    store: Arc<dyn AnalysisStore>,
}

impl DocumentProcessor {
    pub fn new(crew: Arc<Crew>, store: Arc<dyn AnalysisStore>) -> Self {
        Self { crew, store }
    }

    pub fn store(&self) -> &Arc<dyn AnalysisStore> {
        &self.store
    }

    /// Run the crew and persist its output.
    pub async fn analyze(&self, file_path: &str, query: &str) -> Result<AnalysisRecord> {
        let inputs = CrewInputs {
            query: query.to_string(),
            file_path: file_path.to_string(),
        };

        let output = self.crew.kickoff(&inputs).await?;

        let record = AnalysisRecord::new(
            query.to_string(),
            output.to_string(),
            Some(file_path.to_string()),
        );
        self.store.save(&record).await?;

        info!(analysis_id = %record.id, file_path, "Analysis stored");
        Ok(record)
    }

    /// Full background job: analyze, log any failure, always clean up.
    pub async fn process_document(&self, file_path: String, query: String) {
        if let Err(e) = self.analyze(&file_path, &query).await {
            error!(file_path = %file_path, error = %e, "Background task error");
        }

        remove_upload(Path::new(&file_path)).await;
    }

    /// Detach `process_document` onto the runtime.
    pub fn spawn(&self, file_path: String, query: String) -> JoinHandle<()> {
        let processor = self.clone();
        tokio::spawn(async move { processor.process_document(file_path, query).await })
    }
}

/// Delete an uploaded file, ignoring a missing file or a failed delete.
pub async fn remove_upload(path: &Path) {
    if !tokio::fs::try_exists(path).await.unwrap_or(false) {
        return;
    }

    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!(path = %path.display(), "Upload removed"),
        Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove upload"),
    }
}
