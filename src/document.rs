//! Financial document reader
//!
//! Extracts plain text from an uploaded PDF so it can be handed to the agents.
//! Extraction runs on the blocking pool: the PDF parser is CPU-bound and may
//! panic on malformed input, which surfaces here as a `JoinError`.

use crate::error::AnalyzerError;
use crate::Result;
use std::path::Path;
use tracing::{debug, warn};

pub const NO_CONTENT: &str = "No content found in document.";

/// Trim a page and collapse every blank-line run into a single newline.
pub fn normalize_page(content: &str) -> String {
    let mut page = content.trim().to_string();
    while page.contains("\n\n") {
        page = page.replace("\n\n", "\n");
    }
    page
}

/// Join normalized pages, one trailing newline per page.
pub fn assemble_report<I, S>(pages: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut report = String::new();
    for page in pages {
        report.push_str(&normalize_page(page.as_ref()));
        report.push('\n');
    }

    if report.trim().is_empty() {
        NO_CONTENT.to_string()
    } else {
        report
    }
}

/// Read a PDF from disk and return its cleaned text.
pub async fn read_financial_document(path: &Path) -> Result<String> {
    let exists = tokio::fs::try_exists(path)
        .await
        .map_err(|e| AnalyzerError::DocumentError(format!("Error reading document: {}", e)))?;
    if !exists {
        return Err(AnalyzerError::DocumentError(format!(
            "File not found at path {}",
            path.display()
        )));
    }

    let owned = path.to_path_buf();
    let pages = tokio::task::spawn_blocking(move || pdf_extract::extract_text_by_pages(&owned))
        .await
        .map_err(|e| {
            warn!("PDF extraction task aborted: {}", e);
            AnalyzerError::DocumentError(format!("Error reading document: {}", e))
        })?
        .map_err(|e| AnalyzerError::DocumentError(format!("Error reading document: {}", e)))?;

    debug!(path = %path.display(), pages = pages.len(), "Extracted document text");

    Ok(assemble_report(pages))
}
