//! # Agents API
//!
//! Trigger boundary and status/log queries for the agent pipeline. Triggers
//! are fire-and-forget: the handler rejects conflicts, spawns the run as a
//! detached task, and returns the current pipeline snapshot immediately -
//! callers observe progress and failures by polling status and logs.

use std::collections::HashMap;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use forge_core::agents::InvocationRecord;
use forge_core::models::{AgentRole, HandoverContext};
use forge_core::pipeline::AgentExecutionState;

use super::ApiError;
use crate::SharedState;

/// Request to trigger a single agent or the full pipeline
#[derive(Debug, Deserialize, ToSchema)]
pub struct TriggerRequest {
    pub project_id: String,
    /// Single role to run; omit to run the full pipeline from the first role
    #[schema(value_type = Option<String>)]
    pub agent: Option<AgentRole>,
    /// Extra handover context for single-role triggers
    pub context: Option<HashMap<String, String>>,
}

/// Pipeline status for one project
#[derive(Debug, Serialize)]
pub struct PipelineStatusResponse {
    pub project_id: String,
    /// The at-most-one role currently running
    pub current_agent: Option<AgentRole>,
    pub agents: Vec<AgentExecutionState>,
}

/// Invocation log listing for one project
#[derive(Debug, Serialize)]
pub struct LogsResponse {
    pub project_id: String,
    pub logs: Vec<InvocationRecord>,
}

pub fn agent_routes() -> Router<SharedState> {
    Router::new()
        .route("/trigger", post(trigger_agent))
        .route("/status/:project_id", get(pipeline_status))
        .route("/logs/:project_id", get(agent_logs))
}

async fn status_snapshot(state: &SharedState, project_id: &str) -> PipelineStatusResponse {
    let pipeline = state.tracker.get_or_init(project_id).await;
    PipelineStatusResponse {
        project_id: project_id.to_string(),
        current_agent: pipeline.current_running(),
        agents: pipeline.in_order(),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/agents/trigger",
    tag = "agents",
    responses(
        (status = 202, description = "Run dispatched; poll status for progress"),
        (status = 404, description = "Unknown project", body = super::ErrorBody),
        (status = 409, description = "Role or pipeline already running", body = super::ErrorBody)
    )
)]
pub(crate) async fn trigger_agent(
    State(state): State<SharedState>,
    Json(req): Json<TriggerRequest>,
) -> Result<(StatusCode, Json<PipelineStatusResponse>), ApiError> {
    // Not-found is rejected before any state mutation
    let project = state.store.get(&req.project_id).await?;

    match req.agent {
        Some(role) => {
            // Claim the slot before spawning so concurrent triggers cannot
            // both dispatch; one write-lock acquisition rejects whenever any
            // role is Running, then marks this one Running.
            state.tracker.try_begin(&req.project_id, role).await?;

            let mut context = HandoverContext::seeded(&project.prompt);
            for (key, value) in req.context.unwrap_or_default() {
                context.insert(key, value);
            }

            tracing::info!(project_id = %req.project_id, agent = %role, "Single-role trigger");
            let runner = state.runner.clone();
            let tracker = state.tracker.clone();
            let project_id = req.project_id.clone();
            tokio::spawn(async move {
                if let Err(e) = runner.run_role(&project_id, role, context).await {
                    tracing::error!(%project_id, "Role run rejected: {}", e);
                    tracker.set_failed(&project_id, role, e.to_string()).await;
                }
            });
        }
        None => {
            let first = AgentRole::all()[0];
            state.tracker.try_begin(&req.project_id, first).await?;

            tracing::info!(project_id = %req.project_id, "Pipeline trigger");
            let runner = state.runner.clone();
            let tracker = state.tracker.clone();
            let project_id = req.project_id.clone();
            tokio::spawn(async move {
                if let Err(e) = runner.run(&project_id).await {
                    tracing::error!(%project_id, "Pipeline run rejected: {}", e);
                    tracker.set_failed(&project_id, first, e.to_string()).await;
                }
            });
        }
    }

    Ok((
        StatusCode::ACCEPTED,
        Json(status_snapshot(&state, &req.project_id).await),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/agents/status/{project_id}",
    tag = "agents",
    responses(
        (status = 200, description = "Pipeline status"),
        (status = 404, description = "Unknown project", body = super::ErrorBody)
    )
)]
pub(crate) async fn pipeline_status(
    State(state): State<SharedState>,
    Path(project_id): Path<String>,
) -> Result<Json<PipelineStatusResponse>, ApiError> {
    state.store.get(&project_id).await?;
    Ok(Json(status_snapshot(&state, &project_id).await))
}

#[utoipa::path(
    get,
    path = "/api/v1/agents/logs/{project_id}",
    tag = "agents",
    responses(
        (status = 200, description = "Invocation records in write order"),
        (status = 404, description = "Unknown project", body = super::ErrorBody)
    )
)]
pub(crate) async fn agent_logs(
    State(state): State<SharedState>,
    Path(project_id): Path<String>,
) -> Result<Json<LogsResponse>, ApiError> {
    state.store.get(&project_id).await?;
    let logs = state
        .bridge
        .log()
        .read(&project_id)
        .await
        .map_err(|e| ApiError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            detail: format!("failed to read logs: {}", e),
        })?;
    Ok(Json(LogsResponse { project_id, logs }))
}
