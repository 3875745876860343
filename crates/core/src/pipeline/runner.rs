//! # Pipeline Runner
//!
//! Drives the fixed role sequence for one project: Orchestrator → Design →
//! Frontend → Backend → DevOps. Each stage's full output is merged into the
//! handover context for the next stage; the first failure halts the run and
//! fails the project. The runner itself is a plain async function driven in
//! sequence - fire-and-forget spawning is the trigger boundary's job, which
//! keeps the core deterministic and testable.

use std::sync::Arc;

use crate::agents::{prompts, AgentBridge};
use crate::error::OrchestratorError;
use crate::models::{excerpt, AgentRole, HandoverContext, ProjectStatus};
use crate::pipeline::state::StateTracker;
use crate::store::ProjectStore;

/// Terminal outcome of one pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every role completed
    Completed,
    /// The named role failed; later roles never ran
    Failed(AgentRole),
}

/// Drives the agent role sequence for a project
pub struct PipelineRunner {
    bridge: Arc<AgentBridge>,
    tracker: Arc<StateTracker>,
    store: Arc<dyn ProjectStore>,
}

impl PipelineRunner {
    pub fn new(
        bridge: Arc<AgentBridge>,
        tracker: Arc<StateTracker>,
        store: Arc<dyn ProjectStore>,
    ) -> Self {
        Self {
            bridge,
            tracker,
            store,
        }
    }

    /// Run the full pipeline for a project.
    ///
    /// Returns `Err` only when the project does not exist - rejected before
    /// any state mutation. Role failures are not errors at this layer: they
    /// surface through the state tracker and the project's Failed status.
    pub async fn run(&self, project_id: &str) -> Result<RunOutcome, OrchestratorError> {
        let project = self.store.get(project_id).await?;

        tracing::info!(project_id, "Pipeline started");
        if let Err(e) = self
            .store
            .set_status(project_id, ProjectStatus::InProgress)
            .await
        {
            tracing::warn!(project_id, error = %e, "Failed to mark project in progress");
        }

        let mut context = HandoverContext::seeded(&project.prompt);

        for (role, template) in prompts::ordered() {
            self.tracker.set_running(project_id, role).await;
            if let Err(e) = self.store.touch(project_id).await {
                tracing::warn!(project_id, error = %e, "Failed to touch project");
            }

            let result = self.bridge.invoke(role, template, project_id, &context).await;

            if result.success {
                tracing::info!(project_id, agent = %role, "Agent completed");
                self.tracker
                    .set_completed(project_id, role, excerpt(&result.output))
                    .await;
                context.merge(role, result.output);
            } else {
                let error = result
                    .error
                    .unwrap_or_else(|| "agent invocation failed".to_string());
                tracing::warn!(project_id, agent = %role, error = %error, "Agent failed, halting pipeline");
                self.tracker.set_failed(project_id, role, error).await;
                if let Err(e) = self
                    .store
                    .set_status(project_id, ProjectStatus::Failed)
                    .await
                {
                    tracing::warn!(project_id, error = %e, "Failed to mark project failed");
                }
                return Ok(RunOutcome::Failed(role));
            }
        }

        tracing::info!(project_id, "Pipeline completed");
        if let Err(e) = self
            .store
            .set_status(project_id, ProjectStatus::Completed)
            .await
        {
            tracing::warn!(project_id, error = %e, "Failed to mark project completed");
        }
        Ok(RunOutcome::Completed)
    }

    /// Run a single role outside the sequence, with caller-supplied context.
    ///
    /// Used by the trigger boundary's single-role variant; does not advance
    /// the pipeline or change the project's overall status on success.
    pub async fn run_role(
        &self,
        project_id: &str,
        role: AgentRole,
        context: HandoverContext,
    ) -> Result<(), OrchestratorError> {
        self.store.get(project_id).await?;

        self.tracker.set_running(project_id, role).await;
        if let Err(e) = self.store.touch(project_id).await {
            tracing::warn!(project_id, error = %e, "Failed to touch project");
        }

        let result = self
            .bridge
            .invoke(role, prompts::template_for(role), project_id, &context)
            .await;

        if result.success {
            self.tracker
                .set_completed(project_id, role, excerpt(&result.output))
                .await;
        } else {
            let error = result
                .error
                .unwrap_or_else(|| "agent invocation failed".to_string());
            self.tracker.set_failed(project_id, role, error).await;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::invoker::{CommandRunner, ProcessOutput};
    use crate::agents::logs::InvocationStatus;
    use crate::agents::InvocationLog;
    use crate::config::Settings;
    use crate::models::{AgentStatus, ProjectRecord};
    use crate::store::InMemoryStore;
    use anyhow::Result;
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Runner stub: exit 0 with "output-N" per call, or scripted failure at
    /// one call index. Captures every prompt it receives.
    struct StubRunner {
        calls: AtomicUsize,
        fail_at: Option<usize>,
        stderr: String,
        prompts: Mutex<Vec<String>>,
        delay: Option<Duration>,
    }

    impl StubRunner {
        fn all_ok() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_at: None,
                stderr: String::new(),
                prompts: Mutex::new(Vec::new()),
                delay: None,
            }
        }

        fn failing_at(index: usize, stderr: &str) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_at: Some(index),
                stderr: stderr.to_string(),
                prompts: Mutex::new(Vec::new()),
                delay: None,
            }
        }

        fn slow(delay: Duration) -> Self {
            Self {
                delay: Some(delay),
                ..Self::all_ok()
            }
        }
    }

    #[async_trait]
    impl CommandRunner for StubRunner {
        async fn run(
            &self,
            _program: &str,
            args: &[String],
            _cwd: Option<&Path>,
            _deadline: Option<Duration>,
        ) -> Result<ProcessOutput> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().unwrap().push(args[1].clone());

            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }

            if self.fail_at == Some(n) {
                return Ok(ProcessOutput {
                    stdout: String::new(),
                    stderr: self.stderr.clone(),
                    exit_code: 1,
                });
            }
            Ok(ProcessOutput {
                stdout: format!("output-{}", n),
                stderr: String::new(),
                exit_code: 0,
            })
        }
    }

    struct Fixture {
        runner: PipelineRunner,
        tracker: Arc<StateTracker>,
        store: Arc<InMemoryStore>,
        log: Arc<InvocationLog>,
        stub: Arc<StubRunner>,
        _dir: tempfile::TempDir,
    }

    async fn fixture(stub: StubRunner) -> (Fixture, String) {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            logs_dir: dir.path().to_path_buf(),
            ..Settings::default()
        };
        let stub = Arc::new(stub);
        let log = Arc::new(InvocationLog::new(dir.path()));
        let bridge = Arc::new(AgentBridge::new(settings, stub.clone(), log.clone()));
        let tracker = Arc::new(StateTracker::new());
        let store = Arc::new(InMemoryStore::new());

        let project = ProjectRecord::new("Build a todo app", None);
        let project_id = project.id.clone();
        store.insert(project).await;

        let runner = PipelineRunner::new(bridge, tracker.clone(), store.clone());
        (
            Fixture {
                runner,
                tracker,
                store,
                log,
                stub,
                _dir: dir,
            },
            project_id,
        )
    }

    #[tokio::test]
    async fn test_unknown_project_rejected_before_any_mutation() {
        let (f, _) = fixture(StubRunner::all_ok()).await;
        let err = f.runner.run("ghost").await.unwrap_err();
        assert_eq!(err, OrchestratorError::ProjectNotFound("ghost".to_string()));
        assert!(f.log.read("ghost").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_full_pipeline_success() {
        let (f, project_id) = fixture(StubRunner::all_ok()).await;

        let outcome = f.runner.run(&project_id).await.unwrap();
        assert_eq!(outcome, RunOutcome::Completed);

        let pipeline = f.tracker.get_or_init(&project_id).await;
        for role in AgentRole::all() {
            assert_eq!(pipeline.state(role).status, AgentStatus::Completed);
        }
        assert!(pipeline.current_running().is_none());

        let project = f.store.get(&project_id).await.unwrap();
        assert_eq!(project.status, ProjectStatus::Completed);

        // 5 started + 5 completed, in role order
        let records = f.log.read(&project_id).await.unwrap();
        assert_eq!(records.len(), 10);
        for (i, role) in AgentRole::all().into_iter().enumerate() {
            assert_eq!(records[2 * i].agent, role);
            assert_eq!(records[2 * i].status, InvocationStatus::Started);
            assert_eq!(records[2 * i + 1].agent, role);
            assert_eq!(records[2 * i + 1].status, InvocationStatus::Completed);
        }
    }

    #[tokio::test]
    async fn test_halt_on_first_failure() {
        // Backend is the fourth call (index 3)
        let (f, project_id) = fixture(StubRunner::failing_at(3, "syntax error")).await;

        let outcome = f.runner.run(&project_id).await.unwrap();
        assert_eq!(outcome, RunOutcome::Failed(AgentRole::Backend));

        let pipeline = f.tracker.get_or_init(&project_id).await;
        assert_eq!(
            pipeline.state(AgentRole::Orchestrator).status,
            AgentStatus::Completed
        );
        assert_eq!(
            pipeline.state(AgentRole::Design).status,
            AgentStatus::Completed
        );
        assert_eq!(
            pipeline.state(AgentRole::Frontend).status,
            AgentStatus::Completed
        );
        assert_eq!(
            pipeline.state(AgentRole::Backend).status,
            AgentStatus::Failed
        );
        assert_eq!(
            pipeline.state(AgentRole::Backend).error.as_deref(),
            Some("syntax error")
        );
        // DevOps never executed
        assert_eq!(pipeline.state(AgentRole::DevOps).status, AgentStatus::Idle);

        let project = f.store.get(&project_id).await.unwrap();
        assert_eq!(project.status, ProjectStatus::Failed);

        // 3 completed stages + the failed one: 4 started + 3 completed + 1 failed
        let records = f.log.read(&project_id).await.unwrap();
        assert_eq!(records.len(), 8);
        assert_eq!(records[7].status, InvocationStatus::Failed);
        assert_eq!(records[7].agent, AgentRole::Backend);
    }

    #[tokio::test]
    async fn test_context_accumulates_across_stages() {
        let (f, project_id) = fixture(StubRunner::all_ok()).await;
        f.runner.run(&project_id).await.unwrap();

        let prompts = f.stub.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 5);

        // First stage sees only the seeded user prompt
        assert!(prompts[0].contains("Build a todo app"));
        assert!(!prompts[0].contains("output-0"));

        // Each later stage sees every prior stage's output
        assert!(prompts[1].contains("output-0"));
        assert!(prompts[4].contains("output-0"));
        assert!(prompts[4].contains("output-1"));
        assert!(prompts[4].contains("output-2"));
        assert!(prompts[4].contains("output-3"));
    }

    #[tokio::test]
    async fn test_at_most_one_running_while_pipeline_executes() {
        let (f, project_id) = fixture(StubRunner::all_ok()).await;
        let tracker = f.tracker.clone();
        let poller_id = project_id.clone();

        let poller = tokio::spawn(async move {
            for _ in 0..50 {
                let pipeline = tracker.get_or_init(&poller_id).await;
                let running = pipeline
                    .in_order()
                    .into_iter()
                    .filter(|s| s.status == AgentStatus::Running)
                    .count();
                assert!(running <= 1, "observed {} running roles", running);
                tokio::time::sleep(Duration::from_micros(50)).await;
            }
        });

        f.runner.run(&project_id).await.unwrap();
        poller.await.unwrap();
    }

    #[tokio::test]
    async fn test_run_role_single_stage() {
        let (f, project_id) = fixture(StubRunner::all_ok()).await;

        f.runner
            .run_role(&project_id, AgentRole::Design, HandoverContext::new())
            .await
            .unwrap();

        let pipeline = f.tracker.get_or_init(&project_id).await;
        assert_eq!(
            pipeline.state(AgentRole::Design).status,
            AgentStatus::Completed
        );
        // Other roles untouched
        assert_eq!(
            pipeline.state(AgentRole::Orchestrator).status,
            AgentStatus::Idle
        );
        // Single-role runs do not change the overall project status
        let project = f.store.get(&project_id).await.unwrap();
        assert_eq!(project.status, ProjectStatus::Pending);
    }

    #[tokio::test]
    async fn test_claimed_slot_rejects_retrigger_until_run_finishes() {
        // The boundary claims the first role before spawning; a second
        // trigger arriving at any point before the run finishes must be
        // rejected instead of dispatching a duplicate run.
        let (f, project_id) = fixture(StubRunner::slow(Duration::from_millis(10))).await;
        let Fixture {
            runner,
            tracker,
            log,
            _dir,
            ..
        } = f;

        let first = AgentRole::all()[0];
        tracker.try_begin(&project_id, first).await.unwrap();

        let run_id = project_id.clone();
        let handle = tokio::spawn(async move { runner.run(&run_id).await });

        assert!(tracker.try_begin(&project_id, first).await.is_err());

        assert_eq!(handle.await.unwrap().unwrap(), RunOutcome::Completed);

        // One run's worth of records: 5 started + 5 completed
        let records = log.read(&project_id).await.unwrap();
        assert_eq!(records.len(), 10);
    }

    /// Deletes the project from the store as a side effect of every call
    struct VanishingProjectRunner {
        store: Arc<InMemoryStore>,
        project_id: String,
    }

    #[async_trait]
    impl CommandRunner for VanishingProjectRunner {
        async fn run(
            &self,
            _program: &str,
            _args: &[String],
            _cwd: Option<&Path>,
            _deadline: Option<Duration>,
        ) -> Result<ProcessOutput> {
            self.store.delete(&self.project_id).await.ok();
            Ok(ProcessOutput {
                stdout: "done".to_string(),
                stderr: String::new(),
                exit_code: 0,
            })
        }
    }

    #[tokio::test]
    async fn test_project_deleted_mid_run_does_not_halt_the_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            logs_dir: dir.path().to_path_buf(),
            ..Settings::default()
        };
        let log = Arc::new(InvocationLog::new(dir.path()));
        let store = Arc::new(InMemoryStore::new());

        let project = ProjectRecord::new("Build a todo app", None);
        let project_id = project.id.clone();
        store.insert(project).await;

        let stub = Arc::new(VanishingProjectRunner {
            store: store.clone(),
            project_id: project_id.clone(),
        });
        let bridge = Arc::new(AgentBridge::new(settings, stub, log.clone()));
        let tracker = Arc::new(StateTracker::new());
        let runner = PipelineRunner::new(bridge, tracker.clone(), store.clone());

        // Store updates fail once the record is gone; the run still
        // finishes every stage and the tracker reflects that.
        let outcome = runner.run(&project_id).await.unwrap();
        assert_eq!(outcome, RunOutcome::Completed);

        let pipeline = tracker.get_or_init(&project_id).await;
        for role in AgentRole::all() {
            assert_eq!(pipeline.state(role).status, AgentStatus::Completed);
        }
        assert!(store.get(&project_id).await.is_err());
    }
}
