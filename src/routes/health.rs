use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use crate::services::jobs::JobStore;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub jobs: JobCounts,
}

#[derive(Serialize)]
pub struct JobCounts {
    pub total: usize,
    pub in_flight: usize,
}

/// GET /health — liveness plus job store counters.
pub async fn health_check(
    service: &'static str,
    State(jobs): State<Arc<JobStore>>,
) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: service.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
        jobs: JobCounts {
            total: jobs.len(),
            in_flight: jobs.in_flight(),
        },
    })
}
