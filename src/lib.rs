//! Financial Document Analyzer
//!
//! Accepts an uploaded financial PDF and runs it through a crew of
//! role-specialized language-model agents:
//! - Document verifier
//! - Senior financial analyst
//! - Investment advisor
//! - Risk assessor
//!
//! Uploads are processed in the background; results are persisted and
//! served through a small HTTP API.
//!
//! PIPELINE:
//! UPLOAD → VERIFY → ANALYZE → ADVISE → ASSESS RISK → PERSIST → CLEANUP

pub mod agent;
pub mod api;
pub mod config;
pub mod document;
pub mod error;
pub mod execution;
pub mod llm;
pub mod models;
pub mod state;
pub mod tools;

pub use error::Result;

// Re-export common types
pub use models::*;
pub use agent::Crew;
pub use execution::DocumentProcessor;
