//! Orchestrator error taxonomy.
//!
//! Invocation failures are never represented here: the agent bridge folds
//! them into structured failure results so the pipeline runner's handling
//! stays uniform. These variants cover the boundary-rejectable cases only.

use thiserror::Error;

use crate::models::AgentRole;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrchestratorError {
    /// Referenced project does not exist; rejected before any state mutation
    #[error("project not found: {0}")]
    ProjectNotFound(String),

    /// A single-role trigger arrived while that role is already running
    #[error("agent {0} is already running for this project")]
    RoleAlreadyRunning(AgentRole),

    /// A pipeline trigger arrived while a role is already running
    #[error("a pipeline is already running for this project ({0} is active)")]
    PipelineAlreadyRunning(AgentRole),
}
