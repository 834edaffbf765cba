use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::services::jobs::JobStoreError;
use crate::services::provider::ProviderError;
use crate::services::storage::StorageError;

/// Errors surfaced synchronously to the caller of a submission endpoint.
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("{0}")]
    Validation(String),

    #[error("Provider rejected the task: {0}")]
    Submission(String),

    #[error("Failed to persist uploaded image: {0}")]
    Storage(#[from] StorageError),

    #[error("Job store error: {0}")]
    JobStore(#[from] JobStoreError),
}

impl OrchestratorError {
    /// A missing face is the caller's problem; anything else is the provider's.
    pub fn from_detection(error: ProviderError) -> Self {
        match error {
            ProviderError::NoFace(image) => {
                OrchestratorError::Validation(format!("No face detected in {}", image))
            }
            other => OrchestratorError::Submission(other.to_string()),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            OrchestratorError::Validation(_) => StatusCode::BAD_REQUEST,
            OrchestratorError::Submission(_)
            | OrchestratorError::Storage(_)
            | OrchestratorError::JobStore(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            OrchestratorError::Validation(_) => "validation_error",
            OrchestratorError::Submission(_) => "submission_failed",
            OrchestratorError::Storage(_) => "storage_error",
            OrchestratorError::JobStore(_) => "internal_error",
        }
    }
}

/// JSON error body used by the face-swap and job-status endpoints.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Orchestrator(#[from] OrchestratorError),

    #[error("Job {0} not found")]
    JobNotFound(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match &self {
            ApiError::Orchestrator(e) => (e.status_code(), e.kind()),
            ApiError::JobNotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
        };

        (
            status,
            Json(ErrorBody {
                error,
                message: self.to_string(),
            }),
        )
            .into_response()
    }
}
