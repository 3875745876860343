//! # Project Store
//!
//! Injected storage abstraction for project records. The orchestrator only
//! depends on the [`ProjectStore`] trait; [`InMemoryStore`] is the default
//! backing and doubles as the deterministic test fake.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::error::OrchestratorError;
use crate::models::{ProjectRecord, ProjectStatus};

/// Fields a PATCH-style update may change
#[derive(Debug, Default, Clone)]
pub struct ProjectUpdate {
    pub status: Option<ProjectStatus>,
    pub repo_url: Option<String>,
    pub deploy_url: Option<String>,
}

/// Storage seam for project records
#[async_trait]
pub trait ProjectStore: Send + Sync {
    async fn get(&self, id: &str) -> Result<ProjectRecord, OrchestratorError>;
    async fn insert(&self, record: ProjectRecord);
    async fn list(&self) -> Vec<ProjectRecord>;
    async fn update(
        &self,
        id: &str,
        update: ProjectUpdate,
    ) -> Result<ProjectRecord, OrchestratorError>;
    async fn delete(&self, id: &str) -> Result<(), OrchestratorError>;

    /// Set only the overall status, stamping `updated_at`
    async fn set_status(&self, id: &str, status: ProjectStatus) -> Result<(), OrchestratorError> {
        self.update(
            id,
            ProjectUpdate {
                status: Some(status),
                ..ProjectUpdate::default()
            },
        )
        .await
        .map(|_| ())
    }

    /// Bump `updated_at` without changing anything else
    async fn touch(&self, id: &str) -> Result<(), OrchestratorError> {
        self.update(id, ProjectUpdate::default()).await.map(|_| ())
    }
}

/// In-memory project store
#[derive(Default)]
pub struct InMemoryStore {
    projects: RwLock<HashMap<String, ProjectRecord>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProjectStore for InMemoryStore {
    async fn get(&self, id: &str) -> Result<ProjectRecord, OrchestratorError> {
        self.projects
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| OrchestratorError::ProjectNotFound(id.to_string()))
    }

    async fn insert(&self, record: ProjectRecord) {
        self.projects
            .write()
            .await
            .insert(record.id.clone(), record);
    }

    async fn list(&self) -> Vec<ProjectRecord> {
        let mut projects: Vec<_> = self.projects.read().await.values().cloned().collect();
        projects.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        projects
    }

    async fn update(
        &self,
        id: &str,
        update: ProjectUpdate,
    ) -> Result<ProjectRecord, OrchestratorError> {
        let mut projects = self.projects.write().await;
        let record = projects
            .get_mut(id)
            .ok_or_else(|| OrchestratorError::ProjectNotFound(id.to_string()))?;

        if let Some(status) = update.status {
            record.status = status;
        }
        if let Some(repo_url) = update.repo_url {
            record.repo_url = Some(repo_url);
        }
        if let Some(deploy_url) = update.deploy_url {
            record.deploy_url = Some(deploy_url);
        }
        record.updated_at = Utc::now();

        Ok(record.clone())
    }

    async fn delete(&self, id: &str) -> Result<(), OrchestratorError> {
        self.projects
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| OrchestratorError::ProjectNotFound(id.to_string()))
    }
}
