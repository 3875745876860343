//! # Invocation Log
//!
//! Append-only audit trail of agent invocations, one JSONL file per project
//! under the configured logs directory. Records are opaque to the logger;
//! a per-project mutex keeps concurrent appends from interleaving lines.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::models::AgentRole;

/// Outcome field of an invocation record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvocationStatus {
    Started,
    Completed,
    Failed,
}

/// One audit record for an agent invocation attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvocationRecord {
    pub timestamp: DateTime<Utc>,
    pub project_id: String,
    pub agent: AgentRole,
    /// Prompt excerpt, truncated to the recording bound
    pub prompt: String,
    pub status: InvocationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl InvocationRecord {
    pub fn started(project_id: &str, agent: AgentRole, prompt_excerpt: String) -> Self {
        Self {
            timestamp: Utc::now(),
            project_id: project_id.to_string(),
            agent,
            prompt: prompt_excerpt,
            status: InvocationStatus::Started,
            exit_code: None,
            error: None,
        }
    }

    pub fn completed(&self, exit_code: i32) -> Self {
        Self {
            timestamp: Utc::now(),
            status: InvocationStatus::Completed,
            exit_code: Some(exit_code),
            error: None,
            ..self.clone()
        }
    }

    pub fn failed(&self, exit_code: Option<i32>, error: String) -> Self {
        Self {
            timestamp: Utc::now(),
            status: InvocationStatus::Failed,
            exit_code,
            error: Some(error),
            ..self.clone()
        }
    }
}

/// Per-project append-only invocation log
pub struct InvocationLog {
    dir: PathBuf,
    // One lock per project so appends for the same file never interleave
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl InvocationLog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            locks: Mutex::new(HashMap::new()),
        }
    }

    fn log_path(&self, project_id: &str) -> PathBuf {
        self.dir.join(format!("{}.jsonl", project_id))
    }

    async fn lock_for(&self, project_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(project_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Append one record to the project's log
    pub async fn record(&self, entry: &InvocationRecord) -> Result<()> {
        let lock = self.lock_for(&entry.project_id).await;
        let _guard = lock.lock().await;

        fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("Failed to create logs directory: {:?}", self.dir))?;

        let path = self.log_path(&entry.project_id);
        let line = serde_json::to_string(entry).context("Failed to serialize log entry")?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .with_context(|| format!("Failed to open log file: {:?}", path))?;
        file.write_all(format!("{}\n", line).as_bytes())
            .await
            .with_context(|| format!("Failed to append to log file: {:?}", path))?;

        Ok(())
    }

    /// All records for a project, in write order. Missing log means no
    /// invocations yet, not an error.
    pub async fn read(&self, project_id: &str) -> Result<Vec<InvocationRecord>> {
        let path = self.log_path(project_id);
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read log file: {:?}", path))
            }
        };

        let mut records = Vec::new();
        for line in content.lines() {
            if line.trim().is_empty() {
                continue;
            }
            let record: InvocationRecord = serde_json::from_str(line)
                .with_context(|| format!("Malformed log line in {:?}", path))?;
            records.push(record);
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log_in(dir: &tempfile::TempDir) -> InvocationLog {
        InvocationLog::new(dir.path())
    }

    #[tokio::test]
    async fn test_missing_log_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let log = log_in(&dir);
        assert!(log.read("unknown").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_records_kept_in_write_order() {
        let dir = tempfile::tempdir().unwrap();
        let log = log_in(&dir);

        let started = InvocationRecord::started("p1", AgentRole::Orchestrator, "plan".into());
        log.record(&started).await.unwrap();
        log.record(&started.completed(0)).await.unwrap();
        log.record(&started.failed(Some(1), "boom".into()))
            .await
            .unwrap();

        let records = log.read("p1").await.unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].status, InvocationStatus::Started);
        assert_eq!(records[1].status, InvocationStatus::Completed);
        assert_eq!(records[1].exit_code, Some(0));
        assert_eq!(records[2].status, InvocationStatus::Failed);
        assert_eq!(records[2].error.as_deref(), Some("boom"));
    }

    #[tokio::test]
    async fn test_projects_do_not_share_logs() {
        let dir = tempfile::tempdir().unwrap();
        let log = log_in(&dir);

        let a = InvocationRecord::started("a", AgentRole::Design, "x".into());
        let b = InvocationRecord::started("b", AgentRole::Backend, "y".into());
        log.record(&a).await.unwrap();
        log.record(&b).await.unwrap();

        assert_eq!(log.read("a").await.unwrap().len(), 1);
        assert_eq!(log.read("b").await.unwrap().len(), 1);
        assert_eq!(log.read("a").await.unwrap()[0].agent, AgentRole::Design);
    }

    #[tokio::test]
    async fn test_concurrent_appends_do_not_interleave() {
        let dir = tempfile::tempdir().unwrap();
        let log = Arc::new(log_in(&dir));

        let mut handles = Vec::new();
        for i in 0..20 {
            let log = log.clone();
            handles.push(tokio::spawn(async move {
                let rec = InvocationRecord::started(
                    "p1",
                    AgentRole::Frontend,
                    format!("prompt-{}", i),
                );
                log.record(&rec).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        // Every line parses back, so no partial writes interleaved
        let records = log.read("p1").await.unwrap();
        assert_eq!(records.len(), 20);
    }
}
