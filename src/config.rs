//! Runtime configuration
//!
//! Everything is read from the process environment (after `.env` is loaded
//! by the binaries). Lookups go through a closure so tests never touch the
//! real environment.

use crate::error::AnalyzerError;
use crate::Result;
use std::path::PathBuf;

pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    OpenAi,
    Gemini,
    Mock,
}

impl LlmProvider {
    fn parse(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "" | "openai" => Ok(LlmProvider::OpenAi),
            "gemini" | "google" => Ok(LlmProvider::Gemini),
            "mock" | "offline" => Ok(LlmProvider::Mock),
            other => Err(AnalyzerError::ConfigError(format!(
                "Unknown LLM_PROVIDER '{}' (expected openai, gemini or mock)",
                other
            ))),
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            LlmProvider::OpenAi => DEFAULT_OPENAI_MODEL,
            LlmProvider::Gemini => DEFAULT_GEMINI_MODEL,
            LlmProvider::Mock => "mock",
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub llm_provider: LlmProvider,
    pub llm_model: String,
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub gemini_api_key: String,
    pub database_url: Option<String>,
    pub host: String,
    pub port: u16,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let llm_provider = LlmProvider::parse(&lookup("LLM_PROVIDER").unwrap_or_default())?;
        let llm_model = non_empty("LLM_MODEL")
            .unwrap_or_else(|| llm_provider.default_model().to_string());

        let port = match non_empty("PORT").or_else(|| non_empty("API_PORT")) {
            Some(raw) => raw.trim().parse::<u16>().map_err(|e| {
                AnalyzerError::ConfigError(format!("Invalid port '{}': {}", raw, e))
            })?,
            None => DEFAULT_PORT,
        };

        let max_upload_bytes = match non_empty("MAX_UPLOAD_BYTES") {
            Some(raw) => raw.trim().parse::<usize>().map_err(|e| {
                AnalyzerError::ConfigError(format!("Invalid MAX_UPLOAD_BYTES '{}': {}", raw, e))
            })?,
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };

        Ok(Self {
            llm_provider,
            llm_model,
            openai_api_key: lookup("OPENAI_API_KEY").unwrap_or_default(),
            openai_base_url: non_empty("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            gemini_api_key: lookup("GEMINI_API_KEY").unwrap_or_default(),
            database_url: non_empty("DATABASE_URL").or_else(|| non_empty("POSTGRES_URL")),
            host: non_empty("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            upload_dir: PathBuf::from(non_empty("UPLOAD_DIR").unwrap_or_else(|| "data".to_string())),
            max_upload_bytes,
        })
    }
}
