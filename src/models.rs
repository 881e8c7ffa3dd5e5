//! Core data models for the document analyzer

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub const DEFAULT_QUERY: &str = "Analyze this financial document";

//
// ================= Enums =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    FinancialAnalyst,
    Verifier,
    InvestmentAdvisor,
    RiskAssessor,
}

//
// ================= Persisted record =================
//

/// One completed analysis, as stored and as returned by `/history`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisRecord {
    pub id: String,
    pub query: String,
    pub result: String,
    pub file_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AnalysisRecord {
    pub fn new(query: String, result: String, file_name: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            query,
            result,
            file_name,
            created_at: Utc::now(),
        }
    }
}

//
// ================= Crew I/O =================
//

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrewInputs {
    pub query: String,
    pub file_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskOutput {
    pub task: String,
    pub agent_role: AgentRole,
    pub raw: String,
    pub execution_time_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrewOutput {
    /// Output of the last task in the sequence
    pub raw: String,
    pub tasks_output: Vec<TaskOutput>,
}

impl fmt::Display for CrewOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

//
// ================= Tool I/O =================
//

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInput {
    pub tool_name: String,
    pub parameters: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutput {
    pub success: bool,
    pub data: serde_json::Value,
    pub error: Option<String>,
}

//
// ================= API replies =================
//

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeAccepted {
    pub status: String,
    pub message: String,
}

impl AnalyzeAccepted {
    pub fn processing() -> Self {
        Self {
            status: "processing".to_string(),
            message: "Your document is being analyzed in the background".to_string(),
        }
    }
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AgentRole::FinancialAnalyst => "Senior Financial Analyst",
            AgentRole::Verifier => "Financial Document Verifier",
            AgentRole::InvestmentAdvisor => "Investment Advisor",
            AgentRole::RiskAssessor => "Risk Assessment Expert",
        };
        write!(f, "{}", s)
    }
}
