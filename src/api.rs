//! REST API Server for the Financial Document Analyzer
//!
//! Uploads are accepted immediately and analyzed in the background;
//! finished analyses are read back through `/history`.

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::path::{Path as FsPath, PathBuf};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::AnalyzerError;
use crate::execution::DocumentProcessor;
use crate::models::{AnalyzeAccepted, DEFAULT_QUERY};

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub processor: DocumentProcessor,
    pub upload_dir: PathBuf,
}

type ApiReply = (StatusCode, Json<Value>);

fn detail(status: StatusCode, message: impl Into<String>) -> ApiReply {
    (status, Json(json!({ "detail": message.into() })))
}

/// =============================
/// Helpers
/// =============================

/// Empty or whitespace-only queries fall back to the default prompt.
pub fn resolve_query(query: Option<String>) -> String {
    match query {
        Some(q) if !q.trim().is_empty() => q.trim().to_string(),
        _ => DEFAULT_QUERY.to_string(),
    }
}

/// Write an upload to `<dir>/<uuid>.pdf` and return the stored path.
pub async fn save_upload(dir: &FsPath, bytes: &[u8]) -> crate::Result<String> {
    tokio::fs::create_dir_all(dir).await.map_err(|e| {
        AnalyzerError::UploadError(format!("cannot create {}: {}", dir.display(), e))
    })?;

    let path = dir.join(format!("{}.pdf", Uuid::new_v4()));
    tokio::fs::write(&path, bytes).await.map_err(|e| {
        AnalyzerError::UploadError(format!("cannot write {}: {}", path.display(), e))
    })?;

    Ok(path.to_string_lossy().into_owned())
}

/// =============================
/// Health Endpoints
/// =============================

async fn root() -> Json<Value> {
    Json(json!({ "message": "Financial Document Analyzer API is running" }))
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// =============================
/// Analyze Endpoint
/// =============================

async fn analyze(State(state): State<ApiState>, mut multipart: Multipart) -> ApiReply {
    let mut file: Option<(Option<String>, Vec<u8>)> = None;
    let mut query: Option<String> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                warn!("Malformed multipart upload: {}", e);
                return detail(e.status(), format!("Invalid upload: {}", e.body_text()));
            }
        };

        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().map(str::to_string);
                match field.bytes().await {
                    Ok(bytes) => file = Some((file_name, bytes.to_vec())),
                    Err(e) => {
                        return detail(e.status(), format!("Invalid upload: {}", e.body_text()))
                    }
                }
            }
            "query" => match field.text().await {
                Ok(text) => query = Some(text),
                Err(e) => {
                    return detail(e.status(), format!("Invalid query field: {}", e.body_text()))
                }
            },
            _ => {}
        }
    }

    let Some((original_name, bytes)) = file else {
        return detail(StatusCode::UNPROCESSABLE_ENTITY, "Field 'file' is required");
    };

    let query = resolve_query(query);

    let file_path = match save_upload(&state.upload_dir, &bytes).await {
        Ok(path) => path,
        Err(e) => {
            error!("Failed to store upload: {}", e);
            return detail(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error processing financial document: {}", e),
            );
        }
    };

    info!(
        file_path = %file_path,
        original_name = ?original_name,
        bytes = bytes.len(),
        query = %query,
        "Document accepted for background analysis"
    );

    state.processor.spawn(file_path, query);

    (StatusCode::OK, Json(json!(AnalyzeAccepted::processing())))
}

/// =============================
/// History Endpoints
/// =============================

async fn history(State(state): State<ApiState>) -> ApiReply {
    match state.processor.store().list().await {
        Ok(records) => (StatusCode::OK, Json(json!(records))),
        Err(e) => {
            error!("Failed to load history: {}", e);
            detail(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error loading history: {}", e),
            )
        }
    }
}

async fn history_entry(State(state): State<ApiState>, Path(id): Path<String>) -> ApiReply {
    match state.processor.store().get(&id).await {
        Ok(Some(record)) => (StatusCode::OK, Json(json!(record))),
        Ok(None) => detail(StatusCode::NOT_FOUND, format!("Analysis {} not found", id)),
        Err(e) => detail(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Error loading analysis: {}", e),
        ),
    }
}

/// =============================
/// Router
/// =============================

pub fn create_router(state: ApiState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/analyze", post(analyze))
        .route("/history", get(history))
        .route("/history/:id", get(history_entry))
        .with_state(state)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(
    state: ApiState,
    host: &str,
    port: u16,
    max_upload_bytes: usize,
) -> crate::Result<()> {
    let router = create_router(state, max_upload_bytes);

    let listener = tokio::net::TcpListener::bind(format!("{}:{}", host, port)).await?;

    info!("API Server listening on http://{}:{}", host, port);
    info!("Local: http://127.0.0.1:{}", port);

    axum::serve(listener, router).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Crew;
    use crate::llm::MockLanguageModel;
    use crate::models::AnalysisRecord;
    use crate::state::{AnalysisStore, InMemoryAnalysisStore};
    use axum::body::Body;
    use axum::http::Request;
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    const BOUNDARY: &str = "X-ANALYZER-BOUNDARY";

    struct TestApp {
        router: Router,
        store: Arc<InMemoryAnalysisStore>,
        upload_dir: tempfile::TempDir,
    }

    fn test_app() -> TestApp {
        let crew = Arc::new(
            Crew::financial_crew(Arc::new(MockLanguageModel::with_responses([
                "verified", "analysis", "advice", "risk summary",
            ])))
            .unwrap(),
        );
        let store = Arc::new(InMemoryAnalysisStore::new());
        let upload_dir = tempfile::tempdir().unwrap();

        let state = ApiState {
            processor: DocumentProcessor::new(crew, store.clone()),
            upload_dir: upload_dir.path().join("data"),
        };

        TestApp {
            router: create_router(state, 1024 * 1024),
            store,
            upload_dir,
        }
    }

    fn multipart_request(parts: &[(&str, Option<&str>, &str)]) -> Request<Body> {
        let mut body = String::new();
        for (name, file_name, content) in parts {
            body.push_str(&format!("--{}\r\n", BOUNDARY));
            match file_name {
                Some(f) => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                     Content-Type: application/pdf\r\n\r\n",
                    name, f
                )),
                None => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
                    name
                )),
            }
            body.push_str(content);
            body.push_str("\r\n");
        }
        body.push_str(&format!("--{}--\r\n", BOUNDARY));

        Request::builder()
            .method("POST")
            .uri("/analyze")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn wait_for_records(store: &InMemoryAnalysisStore, count: usize) -> Vec<AnalysisRecord> {
        for _ in 0..100 {
            let records = store.list().await.unwrap();
            if records.len() >= count {
                return records;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("background analysis did not finish in time");
    }

    #[tokio::test]
    async fn test_root_message() {
        let app = test_app();
        let response = app
            .router
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await["message"],
            "Financial Document Analyzer API is running"
        );
    }

    #[tokio::test]
    async fn test_health() {
        let app = test_app();
        let response = app
            .router
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "healthy");
        let timestamp = body["timestamp"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(timestamp).is_ok());
    }

    #[tokio::test]
    async fn test_analyze_accepts_and_processes_in_background() {
        let app = test_app();
        let request = multipart_request(&[
            ("file", Some("report.pdf"), "%PDF-1.4 not really a pdf"),
            ("query", None, "  What drove revenue?  "),
        ]);

        let response = app.router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["status"], "processing");
        assert_eq!(
            body["message"],
            "Your document is being analyzed in the background"
        );

        let records = wait_for_records(&app.store, 1).await;
        assert_eq!(records[0].query, "What drove revenue?");
        assert_eq!(records[0].result, "risk summary");

        let stored = records[0].file_name.clone().unwrap();
        assert!(stored.ends_with(".pdf"));
        assert!(stored.starts_with(&*app.upload_dir.path().join("data").to_string_lossy()));

        // the upload is deleted once the job finishes
        for _ in 0..100 {
            if !FsPath::new(&stored).exists() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(!FsPath::new(&stored).exists());

        let response = app
            .router
            .oneshot(Request::builder().uri("/history").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let history = json_body(response).await;
        assert_eq!(history.as_array().unwrap().len(), 1);
        assert_eq!(history[0]["result"], "risk summary");
        assert_eq!(history[0]["id"], records[0].id.as_str());
    }

    #[tokio::test]
    async fn test_blank_query_uses_default() {
        let app = test_app();
        let request = multipart_request(&[
            ("file", Some("report.pdf"), "%PDF-1.4"),
            ("query", None, "   "),
        ]);

        let response = app.router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let records = wait_for_records(&app.store, 1).await;
        assert_eq!(records[0].query, DEFAULT_QUERY);
    }

    #[tokio::test]
    async fn test_missing_file_is_unprocessable() {
        let app = test_app();
        let request = multipart_request(&[("query", None, "Analyze")]);

        let response = app.router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(json_body(response).await["detail"]
            .as_str()
            .unwrap()
            .contains("file"));
    }

    #[tokio::test]
    async fn test_history_entry_lookup() {
        let app = test_app();
        let record = AnalysisRecord::new("q".into(), "r".into(), None);
        app.store.save(&record).await.unwrap();

        let response = app
            .router
            .clone()
            .oneshot(
                Request::builder()
                    .uri(format!("/history/{}", record.id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["query"], "q");

        let response = app
            .router
            .oneshot(
                Request::builder()
                    .uri("/history/does-not-exist")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_resolve_query() {
        assert_eq!(resolve_query(None), DEFAULT_QUERY);
        assert_eq!(resolve_query(Some("".into())), DEFAULT_QUERY);
        assert_eq!(resolve_query(Some(" cash flow ".into())), "cash flow");
    }

    #[tokio::test]
    async fn test_save_upload_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("nested").join("data");

        let path = save_upload(&nested, b"%PDF").await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF");
    }

    #[tokio::test]
    async fn test_save_upload_failure_is_an_upload_error() {
        let file = tempfile::NamedTempFile::new().unwrap();

        let err = save_upload(file.path(), b"%PDF").await.unwrap_err();
        assert!(matches!(err, AnalyzerError::UploadError(_)));
    }
}
