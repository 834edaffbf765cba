use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use garde::Validate;

use crate::app_state::FaceSwapState;
use crate::error::{ApiError, OrchestratorError};
use crate::models::face_swap::{FaceSwapRequest, FaceSwapResponse};
use crate::models::job::JobStatus;
use crate::services::orchestrator;

/// POST /api/v1/face-swap — submit a swap against a random preset of the category.
pub async fn submit_face_swap(
    State(state): State<FaceSwapState>,
    payload: Result<Json<FaceSwapRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<FaceSwapResponse>), ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        tracing::warn!(error = %rejection, "Rejected malformed face swap request");
        OrchestratorError::Validation(rejection.body_text())
    })?;
    request
        .validate()
        .map_err(|e| OrchestratorError::Validation(e.to_string()))?;

    let accepted = orchestrator::start_face_swap_job(&state, request)
        .await
        .inspect_err(|e| tracing::error!(error = %e, "Face swap submission failed"))?;

    Ok((
        StatusCode::ACCEPTED,
        Json(FaceSwapResponse {
            job_id: accepted.job_id,
            status: JobStatus::Pending.to_string(),
            result_url: accepted.location.url,
        }),
    ))
}
