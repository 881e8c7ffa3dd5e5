//! Agent personas
//!
//! Each agent is a role/goal/backstory triple rendered into the system
//! prompt. Agents with `memory` see every earlier task output; the others
//! only see the task that ran immediately before them.

use crate::models::{AgentRole, CrewInputs};
use crate::tools::{DOCUMENT_READER, INVESTMENT_ANALYZER, RISK_ANALYZER};

use super::interpolate;

#[derive(Debug, Clone)]
pub struct AgentProfile {
    pub role: AgentRole,
    pub goal: &'static str,
    pub backstory: &'static str,
    pub memory: bool,
    pub tools: &'static [&'static str],
}

impl AgentProfile {
    pub fn system_prompt(&self, inputs: &CrewInputs) -> String {
        format!(
            "You are {}.\n\nGoal: {}\n\nBackstory: {}\n\n\
             Rely strictly on the document content and the context you are given.",
            self.role,
            interpolate(self.goal, inputs),
            self.backstory
        )
    }
}

pub fn financial_analyst() -> AgentProfile {
    AgentProfile {
        role: AgentRole::FinancialAnalyst,
        goal: "Analyze the uploaded financial document using the available tool \
               and provide accurate, data-driven insights for: {query}",
        backstory: "You are an experienced financial analyst with expertise in analyzing \
                    financial statements, identifying trends, and extracting key metrics \
                    such as revenue, profit, and expenses. You rely strictly on actual \
                    data from the document and avoid speculation.",
        memory: true,
        tools: &[DOCUMENT_READER],
    }
}

pub fn verifier() -> AgentProfile {
    AgentProfile {
        role: AgentRole::Verifier,
        goal: "Verify whether the uploaded file is a valid financial document by \
               checking for financial terms, structured data, and report patterns.",
        backstory: "You specialize in validating financial documents such as balance sheets, \
                    income statements, and annual reports. You carefully analyze document \
                    content before making a decision.",
        memory: true,
        tools: &[],
    }
}

pub fn investment_advisor() -> AgentProfile {
    AgentProfile {
        role: AgentRole::InvestmentAdvisor,
        goal: "Provide realistic and suitable investment recommendations based on \
               financial data extracted from the document.",
        backstory: "You are a certified financial advisor with strong experience in \
                    portfolio management, risk-return analysis, and market trends. \
                    You provide practical and data-backed investment advice.",
        memory: false,
        tools: &[INVESTMENT_ANALYZER],
    }
}

pub fn risk_assessor() -> AgentProfile {
    AgentProfile {
        role: AgentRole::RiskAssessor,
        goal: "Identify financial, operational, and market risks based on the \
               analyzed financial document.",
        backstory: "You are an expert in financial risk management with experience in \
                    identifying risk factors such as debt levels, cash flow issues, \
                    market volatility, and operational inefficiencies.",
        memory: false,
        tools: &[RISK_ANALYZER],
    }
}

pub fn default_agents() -> Vec<AgentProfile> {
    vec![
        financial_analyst(),
        verifier(),
        investment_advisor(),
        risk_assessor(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_prompt_interpolates_query() {
        let inputs = CrewInputs {
            query: "How did margins change?".to_string(),
            file_path: "data/q2.pdf".to_string(),
        };
        let prompt = financial_analyst().system_prompt(&inputs);
        assert!(prompt.starts_with("You are Senior Financial Analyst."));
        assert!(prompt.contains("insights for: How did margins change?"));
        assert!(!prompt.contains("{query}"));
    }

    #[test]
    fn test_memory_flags() {
        let agents = default_agents();
        let with_memory: Vec<_> = agents.iter().filter(|a| a.memory).map(|a| a.role).collect();
        assert_eq!(with_memory, vec![AgentRole::FinancialAnalyst, AgentRole::Verifier]);
    }
}
