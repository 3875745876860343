//! # API Routes
//!
//! Versioned HTTP boundary over the orchestrator core. Routes are thin:
//! validation, conflict/not-found mapping, and fire-and-forget dispatch of
//! pipeline runs. All orchestration semantics live in `forge_core`.

pub mod agents;
pub mod projects;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use forge_core::OrchestratorError;

/// Error body matching the boundary contract
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub detail: String,
}

/// API error: status code plus detail message
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub detail: String,
}

impl ApiError {
    pub fn not_found(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            detail: detail.into(),
        }
    }

    pub fn conflict(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::CONFLICT,
            detail: detail.into(),
        }
    }

    pub fn unprocessable(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            detail: detail.into(),
        }
    }
}

impl From<OrchestratorError> for ApiError {
    fn from(err: OrchestratorError) -> Self {
        match err {
            OrchestratorError::ProjectNotFound(_) => Self::not_found(err.to_string()),
            OrchestratorError::RoleAlreadyRunning(_)
            | OrchestratorError::PipelineAlreadyRunning(_) => Self::conflict(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                detail: self.detail,
            }),
        )
            .into_response()
    }
}
