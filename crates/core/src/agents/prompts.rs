//! Default role prompt templates bundled at compile time.
//!
//! The pipeline treats these as opaque strings; the only composition applied
//! is the handover-context block the bridge prepends. The table below is the
//! single source of pipeline order paired with each role's template.

use crate::models::AgentRole;

/// Orchestrator - turns the user prompt into a development plan
pub const ORCHESTRATOR: &str = include_str!("defaults/orchestrator.md");

/// Design architect - produces the design specification
pub const DESIGN: &str = include_str!("defaults/design.md");

/// Frontend developer - implements the frontend
pub const FRONTEND: &str = include_str!("defaults/frontend.md");

/// Backend developer - implements the backend API
pub const BACKEND: &str = include_str!("defaults/backend.md");

/// DevOps - produces deployment configuration
pub const DEVOPS: &str = include_str!("defaults/devops.md");

/// Default template for the given role
pub fn template_for(role: AgentRole) -> &'static str {
    match role {
        AgentRole::Orchestrator => ORCHESTRATOR,
        AgentRole::Design => DESIGN,
        AgentRole::Frontend => FRONTEND,
        AgentRole::Backend => BACKEND,
        AgentRole::DevOps => DEVOPS,
    }
}

/// All (role, template) pairs in pipeline order
pub fn ordered() -> [(AgentRole, &'static str); 5] {
    [
        (AgentRole::Orchestrator, ORCHESTRATOR),
        (AgentRole::Design, DESIGN),
        (AgentRole::Frontend, FRONTEND),
        (AgentRole::Backend, BACKEND),
        (AgentRole::DevOps, DEVOPS),
    ]
}
