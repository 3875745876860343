//! # Process Invoker
//!
//! Runs the external agent CLI to completion and captures its output.
//! The [`CommandRunner`] trait is the seam the bridge is built against;
//! tests substitute a scripted runner, production uses [`CliInvoker`].

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::process::Command;

/// Captured result of one process execution
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

/// Seam for executing an external command asynchronously.
///
/// Implementations must not block other concurrent invocations; a failure to
/// start the process is an `Err`, which the bridge folds into a failure
/// result rather than propagating.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        cwd: Option<&Path>,
        deadline: Option<Duration>,
    ) -> Result<ProcessOutput>;
}

/// Production runner backed by `tokio::process`
#[derive(Debug, Default, Clone)]
pub struct CliInvoker;

impl CliInvoker {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for CliInvoker {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        cwd: Option<&Path>,
        deadline: Option<Duration>,
    ) -> Result<ProcessOutput> {
        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // Dropping the wait future on deadline expiry must not leak
            // the child process.
            .kill_on_drop(true);
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }

        let child = cmd
            .spawn()
            .with_context(|| format!("Failed to start agent process: {}", program))?;

        let output = match deadline {
            Some(limit) => tokio::time::timeout(limit, child.wait_with_output())
                .await
                .map_err(|_| {
                    anyhow::anyhow!(
                        "agent process timed out after {}s",
                        limit.as_secs()
                    )
                })?,
            None => child.wait_with_output().await,
        }
        .with_context(|| format!("Failed waiting for agent process: {}", program))?;

        Ok(ProcessOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            // Killed-by-signal has no code; treat it as a generic failure.
            exit_code: output.status.code().unwrap_or(-1),
        })
    }
}

/// Build the argument list for the agent CLI.
///
/// Matches the external runner's interface:
/// `claude -p "<prompt>" --print --output-format json [--cwd <dir>]`
pub fn cli_args(prompt: &str, cwd: Option<&PathBuf>) -> Vec<String> {
    let mut args = vec![
        "-p".to_string(),
        prompt.to_string(),
        "--print".to_string(),
        "--output-format".to_string(),
        "json".to_string(),
    ];
    if let Some(dir) = cwd {
        args.push("--cwd".to_string());
        args.push(dir.display().to_string());
    }
    args
}
