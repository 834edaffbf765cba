//! Router construction for both services.

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::app_state::{FaceSwapState, VideoState};
use crate::routes;
use crate::services::jobs::JobStore;

pub const VIDEO_SERVICE: &str = "AI Video Generation (Async)";
pub const FACE_SWAP_SERVICE: &str = "AI Face Swap (Async)";

/// Inline base64 images make face-swap bodies large.
const BODY_LIMIT_BYTES: usize = 10 * 1024 * 1024;

/// `metrics` adds `/metrics` behind the same layers as the service routes.
pub fn video_router(state: VideoState, metrics: Option<Arc<PrometheusHandle>>) -> Router {
    let router = Router::new()
        .route(
            "/",
            get(|| async {
                Json(serde_json::json!({
                    "message": VIDEO_SERVICE,
                    "status": "running",
                    "endpoints": {
                        "video_generation": "/upload_image",
                        "job_status": "/api/v1/jobs/{job_id}",
                        "health_check": "/health",
                    }
                }))
            }),
        )
        .route(
            "/health",
            get(|jobs: State<Arc<JobStore>>| routes::health::health_check(VIDEO_SERVICE, jobs)),
        )
        .route("/upload_image", post(routes::video::upload_image))
        .route("/api/v1/jobs/{job_id}", get(routes::jobs::get_job_status))
        .with_state(state);
    with_service_layers(router, metrics)
}

pub fn face_swap_router(state: FaceSwapState, metrics: Option<Arc<PrometheusHandle>>) -> Router {
    let router = Router::new()
        .route(
            "/",
            get(|| async {
                Json(serde_json::json!({
                    "message": FACE_SWAP_SERVICE,
                    "status": "running",
                    "endpoints": {
                        "face_swap": "/api/v1/face-swap",
                        "job_status": "/api/v1/jobs/{job_id}",
                        "health_check": "/health",
                    }
                }))
            }),
        )
        .route(
            "/health",
            get(|jobs: State<Arc<JobStore>>| routes::health::health_check(FACE_SWAP_SERVICE, jobs)),
        )
        .route("/api/v1/face-swap", post(routes::face_swap::submit_face_swap))
        .route("/api/v1/jobs/{job_id}", get(routes::jobs::get_job_status))
        .with_state(state);
    with_service_layers(router, metrics)
}

fn with_service_layers(router: Router, metrics: Option<Arc<PrometheusHandle>>) -> Router {
    let router = match metrics {
        Some(handle) => router.merge(routes::metrics::router(handle)),
        None => router,
    };
    router
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT_BYTES))
}
