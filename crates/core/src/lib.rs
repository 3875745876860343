//! # Forge Core
//!
//! The orchestration brain of Forge: turns a single project prompt into
//! successive artifacts by running a fixed pipeline of external CLI agents
//! and threading each stage's output into the next stage's context.
//!
//! ## Architecture
//!
//! - `agents/` - prompt templates, process invoker, agent bridge, invocation log
//! - `pipeline/` - per-project role state tracking and the sequential runner
//! - `store` - injected project record storage (in-memory default)
//! - `models` - roles, statuses, project records, handover context
//!
//! ## Usage
//!
//! ```rust,ignore
//! use forge_core::agents::{AgentBridge, CliInvoker, InvocationLog};
//! use forge_core::pipeline::{PipelineRunner, StateTracker};
//!
//! let bridge = AgentBridge::new(settings, Arc::new(CliInvoker::new()), log);
//! let runner = PipelineRunner::new(Arc::new(bridge), tracker, store);
//! runner.run("a1b2c3d4").await?;
//! ```

pub mod agents;
pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod store;

pub use config::Settings;
pub use error::OrchestratorError;
