//! # Pipeline State Tracker
//!
//! Per-project execution state for every agent role. States are created
//! lazily as Idle, transition forward only, and a project has at most one
//! Running role at a time because the runner executes roles strictly in
//! sequence. Readers always observe a fully pre- or post-transition state.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::error::OrchestratorError;
use crate::models::{AgentRole, AgentStatus};

/// Execution state of one role for one project
#[derive(Debug, Clone, Serialize)]
pub struct AgentExecutionState {
    pub role: AgentRole,
    pub status: AgentStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub output_excerpt: Option<String>,
    pub error: Option<String>,
}

impl AgentExecutionState {
    fn idle(role: AgentRole) -> Self {
        Self {
            role,
            status: AgentStatus::Idle,
            started_at: None,
            completed_at: None,
            output_excerpt: None,
            error: None,
        }
    }
}

/// All role states for one project
#[derive(Debug, Clone)]
pub struct ProjectPipeline {
    states: HashMap<AgentRole, AgentExecutionState>,
}

impl ProjectPipeline {
    fn new() -> Self {
        Self {
            states: AgentRole::all()
                .into_iter()
                .map(|role| (role, AgentExecutionState::idle(role)))
                .collect(),
        }
    }

    pub fn state(&self, role: AgentRole) -> &AgentExecutionState {
        // Every role is inserted at construction
        &self.states[&role]
    }

    /// Role states in pipeline order
    pub fn in_order(&self) -> Vec<AgentExecutionState> {
        AgentRole::all()
            .into_iter()
            .map(|role| self.states[&role].clone())
            .collect()
    }

    /// First Running role in pipeline order, if any
    pub fn current_running(&self) -> Option<AgentRole> {
        AgentRole::all()
            .into_iter()
            .find(|role| self.states[role].status == AgentStatus::Running)
    }
}

/// Tracks pipeline state for all projects
#[derive(Default)]
pub struct StateTracker {
    projects: RwLock<HashMap<String, ProjectPipeline>>,
}

impl StateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Project pipeline snapshot, created with all roles Idle if absent.
    /// Idempotent: repeated calls never reset existing state.
    pub async fn get_or_init(&self, project_id: &str) -> ProjectPipeline {
        if let Some(pipeline) = self.projects.read().await.get(project_id) {
            return pipeline.clone();
        }
        self.projects
            .write()
            .await
            .entry(project_id.to_string())
            .or_insert_with(ProjectPipeline::new)
            .clone()
    }

    /// Mark a role Running, stamping its start time
    pub async fn set_running(&self, project_id: &str, role: AgentRole) {
        let mut projects = self.projects.write().await;
        let pipeline = projects
            .entry(project_id.to_string())
            .or_insert_with(ProjectPipeline::new);
        pipeline.states.insert(
            role,
            AgentExecutionState {
                role,
                status: AgentStatus::Running,
                started_at: Some(Utc::now()),
                completed_at: None,
                output_excerpt: None,
                error: None,
            },
        );
    }

    /// Atomically claim a role for execution: rejects if any role is
    /// already Running for the project, otherwise marks `role` Running.
    /// The check and the transition happen under a single write lock, so
    /// concurrent callers cannot both claim a slot.
    pub async fn try_begin(
        &self,
        project_id: &str,
        role: AgentRole,
    ) -> Result<(), OrchestratorError> {
        let mut projects = self.projects.write().await;
        let pipeline = projects
            .entry(project_id.to_string())
            .or_insert_with(ProjectPipeline::new);
        if let Some(active) = pipeline.current_running() {
            return Err(if active == role {
                OrchestratorError::RoleAlreadyRunning(active)
            } else {
                OrchestratorError::PipelineAlreadyRunning(active)
            });
        }
        pipeline.states.insert(
            role,
            AgentExecutionState {
                role,
                status: AgentStatus::Running,
                started_at: Some(Utc::now()),
                completed_at: None,
                output_excerpt: None,
                error: None,
            },
        );
        Ok(())
    }

    /// Mark a role Completed, preserving its start time
    pub async fn set_completed(&self, project_id: &str, role: AgentRole, output_excerpt: String) {
        self.finish(project_id, role, AgentStatus::Completed, Some(output_excerpt), None)
            .await;
    }

    /// Mark a role Failed with its error, preserving its start time
    pub async fn set_failed(&self, project_id: &str, role: AgentRole, error: String) {
        self.finish(project_id, role, AgentStatus::Failed, None, Some(error))
            .await;
    }

    /// The at-most-one role currently Running for a project
    pub async fn current_running(&self, project_id: &str) -> Option<AgentRole> {
        self.projects
            .read()
            .await
            .get(project_id)
            .and_then(ProjectPipeline::current_running)
    }

    async fn finish(
        &self,
        project_id: &str,
        role: AgentRole,
        status: AgentStatus,
        output_excerpt: Option<String>,
        error: Option<String>,
    ) {
        let mut projects = self.projects.write().await;
        let pipeline = projects
            .entry(project_id.to_string())
            .or_insert_with(ProjectPipeline::new);
        let started_at = pipeline.states[&role].started_at;
        pipeline.states.insert(
            role,
            AgentExecutionState {
                role,
                status,
                started_at,
                completed_at: Some(Utc::now()),
                output_excerpt,
                error,
            },
        );
    }
}
