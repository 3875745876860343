//! # Settings
//!
//! Runtime configuration loaded from environment variables (`FORGE_*`),
//! with defaults matching a local development setup. The server binary
//! loads `.env` before calling [`Settings::from_env`].

use std::path::PathBuf;
use std::time::Duration;

/// Orchestrator runtime settings
#[derive(Debug, Clone)]
pub struct Settings {
    /// Display name of the application
    pub app_name: String,
    /// Path to the external agent CLI binary
    pub agent_cli_path: String,
    /// Directory holding the per-project invocation logs
    pub logs_dir: PathBuf,
    /// Working directory passed to agent invocations, if any
    pub working_dir: Option<PathBuf>,
    /// Allowed CORS origins for the HTTP boundary
    pub cors_origins: Vec<String>,
    /// Deadline for a single agent invocation; the process is killed on expiry
    pub invoke_timeout: Option<Duration>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app_name: "Forge".to_string(),
            agent_cli_path: "/usr/bin/claude".to_string(),
            logs_dir: PathBuf::from(".agent_logs"),
            working_dir: None,
            cors_origins: vec![
                "http://localhost:5173".to_string(),
                "http://localhost:3000".to_string(),
            ],
            invoke_timeout: None,
        }
    }
}

impl Settings {
    /// Build settings from the environment, falling back to defaults.
    pub fn from_env() -> Self {
        let mut settings = Self::default();

        if let Ok(path) = std::env::var("FORGE_AGENT_CLI") {
            settings.agent_cli_path = path;
        }
        if let Ok(dir) = std::env::var("FORGE_LOGS_DIR") {
            settings.logs_dir = PathBuf::from(dir);
        }
        if let Ok(dir) = std::env::var("FORGE_WORKING_DIR") {
            settings.working_dir = Some(PathBuf::from(dir));
        }
        if let Ok(origins) = std::env::var("FORGE_CORS_ORIGINS") {
            settings.cors_origins = origins
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect();
        }
        if let Ok(secs) = std::env::var("FORGE_INVOKE_TIMEOUT_SECS") {
            if let Ok(secs) = secs.parse::<u64>() {
                settings.invoke_timeout = Some(Duration::from_secs(secs));
            }
        }

        settings
    }
}
