//! # Agent Bridge
//!
//! Composes the full prompt for a role, delegates execution to the process
//! invoker, classifies the result, and records the attempt in the invocation
//! log. The bridge's contract is that [`AgentBridge::invoke`] never fails:
//! every internal error is folded into a `success = false` result so the
//! pipeline runner's error handling stays uniform.

use std::sync::Arc;

use crate::agents::invoker::{cli_args, CommandRunner};
use crate::agents::logs::{InvocationLog, InvocationRecord};
use crate::config::Settings;
use crate::models::{excerpt, AgentRole, HandoverContext};

/// Classified outcome of one agent invocation
#[derive(Debug, Clone)]
pub struct AgentResult {
    /// True iff the process exited with code zero
    pub success: bool,
    /// Captured stdout, unbounded at this layer
    pub output: String,
    /// Captured stderr, or the invocation error's message
    pub error: Option<String>,
}

impl AgentResult {
    fn failure(error: String) -> Self {
        Self {
            success: false,
            output: String::new(),
            error: Some(error),
        }
    }
}

/// Bridge between the pipeline and the external agent CLI
pub struct AgentBridge {
    settings: Settings,
    runner: Arc<dyn CommandRunner>,
    log: Arc<InvocationLog>,
}

impl AgentBridge {
    pub fn new(settings: Settings, runner: Arc<dyn CommandRunner>, log: Arc<InvocationLog>) -> Self {
        Self {
            settings,
            runner,
            log,
        }
    }

    pub fn log(&self) -> &Arc<InvocationLog> {
        &self.log
    }

    /// Invoke one agent role with its prompt template and accumulated context.
    ///
    /// The "started" record is written before the process is spawned so that
    /// a crash mid-invocation still leaves an audit trail.
    pub async fn invoke(
        &self,
        role: AgentRole,
        prompt_template: &str,
        project_id: &str,
        context: &HandoverContext,
    ) -> AgentResult {
        let full_prompt = compose_prompt(prompt_template, context);

        let started = InvocationRecord::started(project_id, role, excerpt(&full_prompt));
        if let Err(e) = self.log.record(&started).await {
            tracing::warn!(project_id, agent = %role, "Failed to write started record: {}", e);
        }

        let args = cli_args(&full_prompt, self.settings.working_dir.as_ref());
        let result = self
            .runner
            .run(
                &self.settings.agent_cli_path,
                &args,
                self.settings.working_dir.as_deref(),
                self.settings.invoke_timeout,
            )
            .await;

        match result {
            Ok(output) => {
                let success = output.exit_code == 0;
                let outcome = if success {
                    started.completed(output.exit_code)
                } else {
                    started.failed(Some(output.exit_code), excerpt(&output.stderr))
                };
                if let Err(e) = self.log.record(&outcome).await {
                    tracing::warn!(project_id, agent = %role, "Failed to write outcome record: {}", e);
                }

                AgentResult {
                    success,
                    output: output.stdout,
                    error: if success { None } else { Some(output.stderr) },
                }
            }
            Err(e) => {
                tracing::warn!(project_id, agent = %role, "Agent invocation failed: {}", e);
                let message = e.to_string();
                if let Err(e) = self.log.record(&started.failed(None, excerpt(&message))).await {
                    tracing::warn!(project_id, agent = %role, "Failed to write failure record: {}", e);
                }
                AgentResult::failure(message)
            }
        }
    }
}

/// Prepend the serialized handover context to the template as a labeled
/// block. This is the only prompt composition the orchestrator performs.
pub fn compose_prompt(template: &str, context: &HandoverContext) -> String {
    if context.is_empty() {
        return template.to_string();
    }
    // Context is plain string maps, serialization cannot fail
    let json = serde_json::to_string_pretty(context).unwrap_or_default();
    format!(
        "Previous agent context:\n```json\n{}\n```\n\n{}",
        json, template
    )
}
