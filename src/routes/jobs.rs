use axum::extract::{Path, State};
use axum::Json;
use std::sync::Arc;

use crate::error::ApiError;
use crate::models::job::JobStatusResponse;
use crate::services::jobs::JobStore;

/// GET /api/v1/jobs/{job_id} — current status of a job.
pub async fn get_job_status(
    State(jobs): State<Arc<JobStore>>,
    Path(job_id): Path<String>,
) -> Result<Json<JobStatusResponse>, ApiError> {
    jobs.get(&job_id)
        .map(|job| Json(job.into()))
        .map_err(|_| ApiError::JobNotFound(job_id))
}
