use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::app_state::VideoState;
use crate::models::video::{
    AcceptedDocument, ReturnException, UploadImageRequest, UploadImageResponse, VideoUrl,
};
use crate::services::orchestrator;

/// POST /upload_image — start a video job and return its future URL at once.
pub async fn upload_image(
    State(state): State<VideoState>,
    payload: Result<Json<UploadImageRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            tracing::warn!(error = %rejection, "Rejected malformed video request");
            return exception(StatusCode::BAD_REQUEST, "Request body is missing or malformed");
        }
    };

    let input = match request.into_input() {
        Ok(input) => input,
        Err(e) => return exception(e.status_code(), e.to_string()),
    };

    match orchestrator::start_video_job(&state, input).await {
        Ok(accepted) => {
            tracing::info!(job_id = %accepted.job_id, video_url = %accepted.location.url, "Responding with pre-allocated URL");
            Json(UploadImageResponse {
                tmp_document: AcceptedDocument {
                    ai_video_name: accepted.location.file_name().to_string(),
                    job_id: accepted.job_id,
                    response: VideoUrl {
                        video_url: accepted.location.url,
                    },
                },
            })
            .into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Video task submission failed");
            exception(e.status_code(), e.to_string())
        }
    }
}

fn exception(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ReturnException::new(message))).into_response()
}

