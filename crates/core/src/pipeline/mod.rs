//! # Pipeline Orchestration
//!
//! State tracking and sequential execution of the agent role pipeline.
//!
//! ## Pipeline Flow
//!
//! ```text
//! User Prompt → Orchestrator → Design → Frontend → Backend → DevOps
//! ```

pub mod runner;
pub mod state;

pub use runner::{PipelineRunner, RunOutcome};
pub use state::{AgentExecutionState, ProjectPipeline, StateTracker};
