//! # Agent Invocation
//!
//! Everything between the pipeline and the external agent CLI: prompt
//! templates, process execution, result classification, and the append-only
//! invocation log.

pub mod bridge;
pub mod invoker;
pub mod logs;
pub mod prompts;

pub use bridge::{compose_prompt, AgentBridge, AgentResult};
pub use invoker::{CliInvoker, CommandRunner, ProcessOutput};
pub use logs::{InvocationLog, InvocationRecord, InvocationStatus};
