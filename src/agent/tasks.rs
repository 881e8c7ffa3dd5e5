//! Task templates, in execution order

use crate::models::AgentRole;
use crate::tools::DOCUMENT_READER;

#[derive(Debug, Clone)]
pub struct TaskSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub expected_output: &'static str,
    pub agent: AgentRole,
    pub tools: &'static [&'static str],
}

pub fn verification() -> TaskSpec {
    TaskSpec {
        name: "verification",
        description: "Verify whether the uploaded document is a financial document.\n\n\
                      Steps:\n\
                      - Read the document using the tool\n\
                      - Check for financial keywords (revenue, profit, balance sheet, etc.)\n\
                      - Determine validity",
        expected_output: r#"{
    "is_financial_document": true or false,
    "reason": "short explanation"
}"#,
        agent: AgentRole::Verifier,
        tools: &[DOCUMENT_READER],
    }
}

pub fn analyze_financial_document() -> TaskSpec {
    TaskSpec {
        name: "analyze_financial_document",
        description: "Analyze the financial document.\n\n\
                      Steps:\n\
                      - Extract key metrics (revenue, profit, expenses)\n\
                      - Summarize financial performance\n\
                      - Identify trends\n\n\
                      User Query: {query}",
        expected_output: r#"{
    "summary": "",
    "key_metrics": {
        "revenue": "",
        "profit": "",
        "expenses": ""
    },
    "insights": []
}"#,
        agent: AgentRole::FinancialAnalyst,
        tools: &[DOCUMENT_READER],
    }
}

pub fn investment_analysis() -> TaskSpec {
    TaskSpec {
        name: "investment_analysis",
        description: "Based on the financial analysis:\n\
                      - Suggest realistic investment strategies\n\
                      - Provide justification based on data\n\
                      - Avoid speculation",
        expected_output: r#"{
    "recommendations": [],
    "justification": ""
}"#,
        agent: AgentRole::InvestmentAdvisor,
        tools: &[DOCUMENT_READER],
    }
}

pub fn risk_assessment() -> TaskSpec {
    TaskSpec {
        name: "risk_assessment",
        description: "Identify risks from the financial document:\n\n\
                      - Financial risks\n\
                      - Market risks\n\
                      - Operational risks",
        expected_output: r#"{
    "risks": [],
    "severity": ""
}"#,
        agent: AgentRole::RiskAssessor,
        tools: &[DOCUMENT_READER],
    }
}

/// Verification → analysis → investment → risk
pub fn default_tasks() -> Vec<TaskSpec> {
    vec![
        verification(),
        analyze_financial_document(),
        investment_analysis(),
        risk_assessment(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_order() {
        let names: Vec<_> = default_tasks().iter().map(|t| t.name).collect();
        assert_eq!(
            names,
            vec![
                "verification",
                "analyze_financial_document",
                "investment_analysis",
                "risk_assessment"
            ]
        );
    }

    #[test]
    fn test_every_task_reads_the_document() {
        assert!(default_tasks().iter().all(|t| t.tools.contains(&DOCUMENT_READER)));
    }
}
