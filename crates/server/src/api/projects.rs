//! # Project API
//!
//! CRUD over project records. A project is created from a user prompt and
//! later driven through the agent pipeline by the agents API.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use forge_core::models::{ProjectRecord, ProjectStatus};
use forge_core::store::ProjectUpdate;

use super::ApiError;
use crate::SharedState;

/// Request to create a project from a prompt
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProjectRequest {
    /// The main idea/prompt for the application (at least 10 characters)
    pub prompt: String,
    /// Optional project name
    pub name: Option<String>,
}

/// Partial update of a project
#[derive(Debug, Deserialize, ToSchema)]
pub struct PatchProjectRequest {
    #[schema(value_type = Option<String>)]
    pub status: Option<ProjectStatus>,
    pub repo_url: Option<String>,
    pub deploy_url: Option<String>,
}

/// Project listing with total count
#[derive(Debug, Serialize)]
pub struct ProjectListResponse {
    pub projects: Vec<ProjectRecord>,
    pub total: usize,
}

pub fn project_routes() -> Router<SharedState> {
    Router::new()
        .route("/", get(list_projects).post(create_project))
        .route(
            "/:project_id",
            get(get_project).patch(patch_project).delete(delete_project),
        )
}

#[utoipa::path(
    post,
    path = "/api/v1/projects",
    tag = "projects",
    request_body = CreateProjectRequest,
    responses(
        (status = 201, description = "Project created"),
        (status = 422, description = "Prompt too short", body = super::ErrorBody)
    )
)]
pub(crate) async fn create_project(
    State(state): State<SharedState>,
    Json(req): Json<CreateProjectRequest>,
) -> Result<(StatusCode, Json<ProjectRecord>), ApiError> {
    if req.prompt.trim().chars().count() < 10 {
        return Err(ApiError::unprocessable(
            "prompt must be at least 10 characters",
        ));
    }

    let record = ProjectRecord::new(req.prompt, req.name);
    tracing::info!(project_id = %record.id, name = %record.name, "Project created");
    state.store.insert(record.clone()).await;

    Ok((StatusCode::CREATED, Json(record)))
}

#[utoipa::path(
    get,
    path = "/api/v1/projects",
    tag = "projects",
    responses((status = 200, description = "All projects"))
)]
pub(crate) async fn list_projects(State(state): State<SharedState>) -> Json<ProjectListResponse> {
    let projects = state.store.list().await;
    let total = projects.len();
    Json(ProjectListResponse { projects, total })
}

#[utoipa::path(
    get,
    path = "/api/v1/projects/{project_id}",
    tag = "projects",
    responses(
        (status = 200, description = "The project"),
        (status = 404, description = "Unknown project", body = super::ErrorBody)
    )
)]
pub(crate) async fn get_project(
    State(state): State<SharedState>,
    Path(project_id): Path<String>,
) -> Result<Json<ProjectRecord>, ApiError> {
    Ok(Json(state.store.get(&project_id).await?))
}

#[utoipa::path(
    patch,
    path = "/api/v1/projects/{project_id}",
    tag = "projects",
    responses(
        (status = 200, description = "Updated project"),
        (status = 404, description = "Unknown project", body = super::ErrorBody)
    )
)]
pub(crate) async fn patch_project(
    State(state): State<SharedState>,
    Path(project_id): Path<String>,
    Json(req): Json<PatchProjectRequest>,
) -> Result<Json<ProjectRecord>, ApiError> {
    let updated = state
        .store
        .update(
            &project_id,
            ProjectUpdate {
                status: req.status,
                repo_url: req.repo_url,
                deploy_url: req.deploy_url,
            },
        )
        .await?;
    Ok(Json(updated))
}

#[utoipa::path(
    delete,
    path = "/api/v1/projects/{project_id}",
    tag = "projects",
    responses(
        (status = 204, description = "Project deleted"),
        (status = 404, description = "Unknown project", body = super::ErrorBody)
    )
)]
pub(crate) async fn delete_project(
    State(state): State<SharedState>,
    Path(project_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.store.delete(&project_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
