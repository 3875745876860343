//! # Forge Models
//!
//! Core data types shared across the orchestrator: the fixed agent role
//! sequence, execution/project statuses, project records, and the handover
//! context that carries role outputs forward through a pipeline run.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum length (in characters) of any excerpt the orchestrator records:
/// prompt excerpts in invocation logs and output excerpts in role states.
pub const EXCERPT_CHARS: usize = 500;

/// Truncate a string to [`EXCERPT_CHARS`] characters for recording.
pub fn excerpt(text: &str) -> String {
    text.chars().take(EXCERPT_CHARS).collect()
}

/// One stage of the agent pipeline, in fixed order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentRole {
    /// Analyzes the request and produces a development plan
    #[serde(rename = "orchestrator-agent")]
    Orchestrator,
    /// Produces the design specification
    #[serde(rename = "design-architect-agent")]
    Design,
    /// Implements the frontend
    #[serde(rename = "frontend-developer-agent")]
    Frontend,
    /// Implements the backend API
    #[serde(rename = "backend-developer-agent")]
    Backend,
    /// Produces deployment configuration
    #[serde(rename = "devops-agent")]
    DevOps,
}

impl AgentRole {
    /// All roles in pipeline order
    pub fn all() -> [AgentRole; 5] {
        [
            AgentRole::Orchestrator,
            AgentRole::Design,
            AgentRole::Frontend,
            AgentRole::Backend,
            AgentRole::DevOps,
        ]
    }

    /// Wire/log identifier for this role
    pub fn slug(&self) -> &'static str {
        match self {
            AgentRole::Orchestrator => "orchestrator-agent",
            AgentRole::Design => "design-architect-agent",
            AgentRole::Frontend => "frontend-developer-agent",
            AgentRole::Backend => "backend-developer-agent",
            AgentRole::DevOps => "devops-agent",
        }
    }

    /// Key under which this role's output is stored in the handover context
    pub fn context_key(&self) -> &'static str {
        match self {
            AgentRole::Orchestrator => "orchestrator",
            AgentRole::Design => "design",
            AgentRole::Frontend => "frontend",
            AgentRole::Backend => "backend",
            AgentRole::DevOps => "devops",
        }
    }
}

impl std::fmt::Display for AgentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.slug())
    }
}

/// Status of a single role within a project's pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Idle,
    Running,
    Completed,
    Failed,
}

/// Overall status of a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

/// A project created from a user prompt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectRecord {
    pub id: String,
    pub name: String,
    pub prompt: String,
    pub status: ProjectStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub repo_url: Option<String>,
    #[serde(default)]
    pub deploy_url: Option<String>,
}

impl ProjectRecord {
    /// Create a new pending project with a short unique id
    pub fn new(prompt: impl Into<String>, name: Option<String>) -> Self {
        let id: String = uuid::Uuid::new_v4().to_string().chars().take(8).collect();
        let now = Utc::now();
        Self {
            name: name.unwrap_or_else(|| format!("project-{}", id)),
            id,
            prompt: prompt.into(),
            status: ProjectStatus::Pending,
            created_at: now,
            updated_at: now,
            repo_url: None,
            deploy_url: None,
        }
    }
}

/// Accumulated role outputs carried forward through one pipeline run.
///
/// Seeded with the original user prompt under [`HandoverContext::PROMPT_KEY`];
/// each completed role merges its full output under its context key. Owned by
/// the running pipeline and discarded when the run ends.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HandoverContext(BTreeMap<String, String>);

impl HandoverContext {
    /// Reserved key holding the original user prompt
    pub const PROMPT_KEY: &'static str = "prompt";

    pub fn new() -> Self {
        Self::default()
    }

    /// Context seeded with the user's project prompt
    pub fn seeded(user_prompt: &str) -> Self {
        let mut map = BTreeMap::new();
        map.insert(Self::PROMPT_KEY.to_string(), user_prompt.to_string());
        Self(map)
    }

    /// Merge a role's full output into the context
    pub fn merge(&mut self, role: AgentRole, output: String) {
        self.0.insert(role.context_key().to_string(), output);
    }

    /// Insert an arbitrary key (used when a caller supplies external context)
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
