//! Crew runner - sequential multi-agent pipeline
//!
//! VERIFY → ANALYZE → ADVISE → ASSESS RISK
//!
//! Every task is executed by its agent with the document text and the
//! earlier task outputs placed in the prompt. The first model failure aborts
//! the run.

use crate::error::AnalyzerError;
use crate::llm::{CompletionRequest, LanguageModel};
use crate::models::{AgentRole, CrewInputs, CrewOutput, TaskOutput};
use crate::tools::{output_text, ToolRegistry, DOCUMENT_READER};
use crate::Result;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

pub mod profiles;
pub mod tasks;

pub use profiles::AgentProfile;
pub use tasks::TaskSpec;

/// Replace `{query}` and `{file_path}` placeholders in a single pass, so
/// substituted values are never scanned again.
pub fn interpolate(template: &str, inputs: &CrewInputs) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        if let Some(after) = tail.strip_prefix("{query}") {
            out.push_str(&inputs.query);
            rest = after;
        } else if let Some(after) = tail.strip_prefix("{file_path}") {
            out.push_str(&inputs.file_path);
            rest = after;
        } else {
            out.push('{');
            rest = &tail[1..];
        }
    }
    out.push_str(rest);
    out
}

pub struct Crew {
    llm: Arc<dyn LanguageModel>,
    tools: ToolRegistry,
    agents: HashMap<AgentRole, AgentProfile>,
    tasks: Vec<TaskSpec>,
}

impl Crew {
    pub fn new(
        llm: Arc<dyn LanguageModel>,
        tools: ToolRegistry,
        agents: Vec<AgentProfile>,
        tasks: Vec<TaskSpec>,
    ) -> Result<Self> {
        if tasks.is_empty() {
            return Err(AnalyzerError::PipelineError(
                "Crew needs at least one task".to_string(),
            ));
        }

        let agents: HashMap<AgentRole, AgentProfile> =
            agents.into_iter().map(|a| (a.role, a)).collect();

        for task in &tasks {
            if !agents.contains_key(&task.agent) {
                return Err(AnalyzerError::PipelineError(format!(
                    "Task '{}' is assigned to missing agent '{}'",
                    task.name, task.agent
                )));
            }
            for tool in task.tools {
                if tools.get(tool).is_none() {
                    return Err(AnalyzerError::ToolNotFound(tool.to_string()));
                }
            }
        }

        Ok(Self {
            llm,
            tools,
            agents,
            tasks,
        })
    }

    /// The four-agent financial crew with the default tool registry.
    pub fn financial_crew(llm: Arc<dyn LanguageModel>) -> Result<Self> {
        Self::new(
            llm,
            crate::tools::create_default_registry(),
            profiles::default_agents(),
            tasks::default_tasks(),
        )
    }

    /// Run every task in order and return the last task's output as `raw`.
    pub async fn kickoff(&self, inputs: &CrewInputs) -> Result<CrewOutput> {
        let start_time = Instant::now();
        let mut tasks_output: Vec<TaskOutput> = Vec::with_capacity(self.tasks.len());
        let mut document_text: Option<String> = None;

        info!(
            file_path = %inputs.file_path,
            query = %inputs.query,
            model = %self.llm.model(),
            "Crew: starting sequential run"
        );

        for task in &self.tasks {
            let agent = self.agents.get(&task.agent).ok_or_else(|| {
                AnalyzerError::PipelineError(format!("No agent for task '{}'", task.name))
            })?;

            let task_start = Instant::now();
            info!(task = task.name, agent = %agent.role, "Crew: task started");

            let tool_notes = self
                .run_tools(task, agent, inputs, &mut document_text)
                .await;

            let context: Vec<&TaskOutput> = if agent.memory {
                tasks_output.iter().collect()
            } else {
                tasks_output.last().into_iter().collect()
            };

            let request = CompletionRequest::new(
                agent.system_prompt(inputs),
                build_task_prompt(task, inputs, &context, &tool_notes),
            );

            let completion = self.llm.generate(&request).await.map_err(|e| {
                warn!(task = task.name, error = %e, "Crew: task failed");
                AnalyzerError::PipelineError(format!("Task '{}' failed: {}", task.name, e))
            })?;

            let execution_time_ms = task_start.elapsed().as_millis() as u64;
            info!(
                task = task.name,
                agent = %agent.role,
                execution_time_ms,
                "Crew: task finished"
            );

            tasks_output.push(TaskOutput {
                task: task.name.to_string(),
                agent_role: agent.role,
                raw: completion.text.trim().to_string(),
                execution_time_ms,
            });
        }

        let raw = tasks_output
            .last()
            .map(|t| t.raw.clone())
            .unwrap_or_default();

        info!(
            tasks = tasks_output.len(),
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "Crew: run complete"
        );

        Ok(CrewOutput { raw, tasks_output })
    }

    /// Run the task's and agent's tools; failures become text notes.
    async fn run_tools(
        &self,
        task: &TaskSpec,
        agent: &AgentProfile,
        inputs: &CrewInputs,
        document_text: &mut Option<String>,
    ) -> Vec<(String, String)> {
        let mut names: Vec<&str> = task.tools.to_vec();
        for tool in agent.tools {
            if !names.contains(tool) {
                names.push(*tool);
            }
        }

        let mut notes = Vec::with_capacity(names.len());
        for name in names {
            let text = if name == DOCUMENT_READER {
                self.document_text(inputs, document_text).await
            } else {
                let data = self.document_text(inputs, document_text).await;
                match self
                    .tools
                    .execute(name, json!({ "financial_document_data": data }))
                    .await
                {
                    Ok(output) => output_text(&output),
                    Err(e) => {
                        warn!(tool = name, error = %e, "Tool execution failed");
                        format!("Tool {} failed: {}", name, e)
                    }
                }
            };
            notes.push((name.to_string(), text));
        }
        notes
    }

    /// Document text is read once per run and reused by later tasks.
    async fn document_text(&self, inputs: &CrewInputs, cache: &mut Option<String>) -> String {
        if let Some(text) = cache {
            return text.clone();
        }

        let text = match self
            .tools
            .execute(DOCUMENT_READER, json!({ "path": inputs.file_path }))
            .await
        {
            Ok(output) => {
                if !output.success {
                    warn!(file_path = %inputs.file_path, "Document could not be read");
                }
                output_text(&output)
            }
            Err(e) => format!("Error reading document: {}", e),
        };

        debug!(characters = text.len(), "Document text cached for crew run");
        *cache = Some(text.clone());
        text
    }
}

fn build_task_prompt(
    task: &TaskSpec,
    inputs: &CrewInputs,
    context: &[&TaskOutput],
    tool_notes: &[(String, String)],
) -> String {
    let mut prompt = String::new();

    prompt.push_str("## Task\n");
    prompt.push_str(&interpolate(task.description, inputs));
    prompt.push_str("\n\n## Expected output\n");
    prompt.push_str(task.expected_output);
    prompt.push_str("\n\n");

    if !context.is_empty() {
        prompt.push_str("## Context from previous tasks\n");
        for output in context {
            prompt.push_str(&format!(
                "### {} ({})\n{}\n\n",
                output.task, output.agent_role, output.raw
            ));
        }
    }

    if !tool_notes.is_empty() {
        prompt.push_str("## Tool results\n");
        for (name, text) in tool_notes {
            prompt.push_str(&format!("### {}\n{}\n\n", name, text));
        }
    }

    prompt.push_str("Respond with the expected output only.");
    prompt
}
