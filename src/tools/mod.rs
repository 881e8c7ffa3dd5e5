//! Tool trait and registry
//!
//! Tools are deterministic helpers. Their text output is placed into a task
//! prompt before the agent is called; they never fail the pipeline, errors
//! are reported back as text the agent can read.

use crate::document;
use crate::error::AnalyzerError;
use crate::models::{ToolInput, ToolOutput};
use crate::Result;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

pub const DOCUMENT_READER: &str = "financial_document_reader";
pub const INVESTMENT_ANALYZER: &str = "investment_analyzer";
pub const RISK_ANALYZER: &str = "risk_analyzer";

const DEFAULT_DOCUMENT_PATH: &str = "data/sample.pdf";

/// Trait for a single tool (deterministic execution)
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    async fn execute(&self, input: &ToolInput) -> Result<ToolOutput>;
}

/// Tool registry for looking up and executing tools
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn list(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Look up and run a tool by name
    pub async fn execute(&self, name: &str, parameters: Value) -> Result<ToolOutput> {
        let tool = self
            .get(name)
            .ok_or_else(|| AnalyzerError::ToolNotFound(name.to_string()))?;

        let input = ToolInput {
            tool_name: name.to_string(),
            parameters,
        };
        tool.execute(&input).await
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Text carried by a tool output, falling back to the raw JSON.
pub fn output_text(output: &ToolOutput) -> String {
    output
        .data
        .get("text")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| output.data.to_string())
}

fn ensure_object_parameters(input: &ToolInput) -> Result<()> {
    if input.parameters.is_object() {
        Ok(())
    } else {
        Err(AnalyzerError::InvalidToolInput(
            "tool_input must be a JSON object".to_string(),
        ))
    }
}

fn require_document_data(input: &ToolInput) -> Result<&str> {
    input
        .parameters
        .get("financial_document_data")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            AnalyzerError::InvalidToolInput(
                "Expected 'financial_document_data' in tool_input".to_string(),
            )
        })
}

/// Reads and extracts text from a financial PDF document
pub struct FinancialDocumentTool;

#[async_trait::async_trait]
impl Tool for FinancialDocumentTool {
    fn name(&self) -> &'static str {
        DOCUMENT_READER
    }

    fn description(&self) -> &'static str {
        "Reads and extracts text from a financial PDF document. Input should be the file path."
    }

    async fn execute(&self, input: &ToolInput) -> Result<ToolOutput> {
        ensure_object_parameters(input)?;
        let path = input
            .parameters
            .get("path")
            .and_then(Value::as_str)
            .filter(|p| !p.trim().is_empty())
            .unwrap_or(DEFAULT_DOCUMENT_PATH);

        match document::read_financial_document(Path::new(path)).await {
            Ok(text) => Ok(ToolOutput {
                success: true,
                data: json!({ "path": path, "text": text }),
                error: None,
            }),
            Err(e) => {
                let text = match &e {
                    AnalyzerError::DocumentError(msg) if msg.starts_with("File not found") => {
                        format!("Error: {}", msg)
                    }
                    AnalyzerError::DocumentError(msg) => msg.clone(),
                    other => format!("Error reading document: {}", other),
                };
                Ok(ToolOutput {
                    success: false,
                    data: json!({ "path": path, "text": text }),
                    error: Some(e.to_string()),
                })
            }
        }
    }
}

/// Basic investment checklist over extracted document text
pub struct InvestmentTool;

#[async_trait::async_trait]
impl Tool for InvestmentTool {
    fn name(&self) -> &'static str {
        INVESTMENT_ANALYZER
    }

    fn description(&self) -> &'static str {
        "Analyzes financial document text and provides investment insights."
    }

    async fn execute(&self, input: &ToolInput) -> Result<ToolOutput> {
        ensure_object_parameters(input)?;
        let data = require_document_data(input)?;
        let processed = data.split_whitespace().collect::<Vec<_>>().join(" ");

        Ok(ToolOutput {
            success: true,
            data: json!({
                "text": "Basic Investment Insight:\n\
                         - Review revenue trends\n\
                         - Check profit margins\n\
                         - Evaluate debt levels\n\
                         (Advanced logic can be added here)",
                "characters_analyzed": processed.len(),
            }),
            error: None,
        })
    }
}

/// Basic risk checklist over extracted document text
pub struct RiskTool;

#[async_trait::async_trait]
impl Tool for RiskTool {
    fn name(&self) -> &'static str {
        RISK_ANALYZER
    }

    fn description(&self) -> &'static str {
        "Analyzes financial risks from document data."
    }

    async fn execute(&self, input: &ToolInput) -> Result<ToolOutput> {
        ensure_object_parameters(input)?;
        require_document_data(input)?;

        Ok(ToolOutput {
            success: true,
            data: json!({
                "text": "Basic Risk Assessment:\n\
                         - Market risk\n\
                         - Financial risk\n\
                         - Operational risk\n\
                         (Advanced logic can be added here)",
            }),
            error: None,
        })
    }
}

/// Create a registry with the document reader and the checklist tools.
pub fn create_default_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(FinancialDocumentTool));
    registry.register(Arc::new(InvestmentTool));
    registry.register(Arc::new(RiskTool));
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry() {
        let registry = create_default_registry();
        assert_eq!(
            registry.list(),
            vec![DOCUMENT_READER, INVESTMENT_ANALYZER, RISK_ANALYZER]
        );
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let registry = create_default_registry();
        let result = registry.execute("web_search", json!({})).await;
        assert!(matches!(result, Err(AnalyzerError::ToolNotFound(_))));
    }

    #[tokio::test]
    async fn test_document_reader_reports_missing_file_as_text() {
        let registry = create_default_registry();
        let output = registry
            .execute(DOCUMENT_READER, json!({ "path": "data/missing-report.pdf" }))
            .await
            .unwrap();

        assert!(!output.success);
        assert_eq!(
            output_text(&output),
            "Error: File not found at path data/missing-report.pdf"
        );
    }

    #[tokio::test]
    async fn test_document_reader_rejects_non_object_input() {
        let registry = create_default_registry();
        let result = registry.execute(DOCUMENT_READER, json!("data/x.pdf")).await;
        assert!(matches!(result, Err(AnalyzerError::InvalidToolInput(_))));
    }

    #[tokio::test]
    async fn test_checklist_tools() {
        let registry = create_default_registry();
        let params = json!({ "financial_document_data": "Revenue   grew\n\n10%" });

        let investment = registry.execute(INVESTMENT_ANALYZER, params.clone()).await.unwrap();
        assert_eq!(
            output_text(&investment),
            "Basic Investment Insight:\n- Review revenue trends\n- Check profit margins\n\
             - Evaluate debt levels\n(Advanced logic can be added here)"
        );
        assert_eq!(investment.data["characters_analyzed"], json!(16));

        let risk = registry.execute(RISK_ANALYZER, params).await.unwrap();
        assert_eq!(
            output_text(&risk),
            "Basic Risk Assessment:\n- Market risk\n- Financial risk\n\
             - Operational risk\n(Advanced logic can be added here)"
        );

        let missing = registry.execute(RISK_ANALYZER, json!({})).await;
        assert!(missing.is_err());
    }
}
