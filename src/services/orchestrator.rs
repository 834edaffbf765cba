//! Synchronous half of every job: validate, allocate, submit, spawn, respond.
//!
//! Nothing is recorded in the job store and no worker starts unless the
//! provider accepted the task.

use base64::Engine;
use std::sync::Arc;
use uuid::Uuid;

use crate::app_state::{FaceSwapState, VideoState};
use crate::error::OrchestratorError;
use crate::models::artifact::ArtifactLocation;
use crate::models::face_swap::{FaceInput, FaceSwapRequest};
use crate::models::job::{Job, JobKind};
use crate::models::video::{UploadImageRequest, VideoJobInput};
use crate::services::provider::GenerationOptions;
use crate::services::worker::{self, JobSpec};

pub const DEFAULT_VIDEO_PROMPT: &str = "Create a dynamic video from this image";

/// A job accepted by a provider, with the location its result will land at.
#[derive(Debug, Clone)]
pub struct AcceptedJob {
    pub job_id: String,
    pub location: ArtifactLocation,
}

impl UploadImageRequest {
    pub fn into_input(self) -> Result<VideoJobInput, OrchestratorError> {
        let source_image_url = non_blank(self.tmp_document.source_url)
            .ok_or_else(|| OrchestratorError::Validation("Image URL is missing".to_string()))?;

        Ok(VideoJobInput {
            source_image_url,
            prompt: non_blank(self.new_document.prompt)
                .unwrap_or_else(|| DEFAULT_VIDEO_PROMPT.to_string()),
            subject_id: non_blank(self.new_document.create_user.user_id),
            gender: non_blank(self.new_document.gender),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

pub async fn start_video_job(
    state: &VideoState,
    input: VideoJobInput,
) -> Result<AcceptedJob, OrchestratorError> {
    let location = state.locator.allocate(input.subject_id.as_deref());

    let options = GenerationOptions {
        gender: input.gender.clone(),
        ..state.options.clone()
    };

    tracing::info!(
        subject_id = input.subject_id.as_deref().unwrap_or("unknown"),
        source = %input.source_image_url,
        key = %location.key,
        "Submitting video generation task"
    );

    let task = state
        .provider
        .submit_generation(&input.source_image_url, &input.prompt, &options)
        .await
        .map_err(|e| OrchestratorError::Submission(e.to_string()))?;

    let job_id = Uuid::new_v4().to_string();
    let metadata = serde_json::json!({
        "task_id": task.as_str(),
        "subject_id": input.subject_id,
        "key": location.key,
    });
    state
        .jobs
        .create(Job::new(job_id.clone(), JobKind::Video, Some(metadata)))?;

    tracing::info!(job_id = %job_id, task_id = %task, "Video task accepted");
    metrics::counter!("media_jobs_submitted_total", "kind" => JobKind::Video.as_label()).increment(1);

    worker::spawn_job(
        state.jobs.clone(),
        state.provider.clone(),
        state.storage.clone(),
        JobSpec {
            job_id: job_id.clone(),
            kind: JobKind::Video,
            task,
            location: location.clone(),
            settings: state.settings,
        },
    );

    Ok(AcceptedJob { job_id, location })
}

/// Image supplied to the face-swap endpoint.
#[derive(Debug, PartialEq)]
pub enum ImageSource {
    Url(String),
    Inline(Vec<u8>),
}

/// Classify `image` as a URL or decode it as inline bytes.
///
/// Accepts `http(s)://` URLs, `data:<mime>;base64,<payload>` URLs and bare
/// base64.
pub fn parse_image_source(image: &str) -> Result<ImageSource, OrchestratorError> {
    let image = image.trim();
    if image.starts_with("http://") || image.starts_with("https://") {
        return Ok(ImageSource::Url(image.to_string()));
    }

    let payload = match image.strip_prefix("data:") {
        Some(rest) => {
            let (header, data) = rest.split_once(',').ok_or_else(|| {
                OrchestratorError::Validation("Malformed data URL".to_string())
            })?;
            if !header.ends_with(";base64") {
                return Err(OrchestratorError::Validation(
                    "Data URL must be base64-encoded".to_string(),
                ));
            }
            data
        }
        None => image,
    };

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|_| OrchestratorError::Validation("Image is neither a URL nor valid base64".to_string()))?;

    if bytes.is_empty() {
        return Err(OrchestratorError::Validation("Image is empty".to_string()));
    }
    Ok(ImageSource::Inline(bytes))
}

/// Upload inline bytes so the provider can fetch them by URL.
async fn persist_inline_image(
    state: &FaceSwapState,
    bytes: Vec<u8>,
    subject_id: Option<&str>,
) -> Result<String, OrchestratorError> {
    let format = image::guess_format(&bytes)
        .map_err(|_| OrchestratorError::Validation("Unsupported image format".to_string()))?;
    let extension = format.extensions_str().first().copied().unwrap_or("bin");

    let location = state.upload_locator.allocate_with_extension(subject_id, extension);
    state
        .storage
        .put_object(&location.key, bytes, format.to_mime_type())
        .await?;

    tracing::info!(key = %location.key, "Inline image persisted");
    Ok(location.url)
}

pub async fn start_face_swap_job(
    state: &FaceSwapState,
    request: FaceSwapRequest,
) -> Result<AcceptedJob, OrchestratorError> {
    let subject_id = non_blank(request.user_id.clone());

    let preset_url = state
        .presets
        .select(&request.category, &mut rand::rng())
        .map_err(|e| OrchestratorError::Validation(e.to_string()))?
        .to_string();

    let source_url = match parse_image_source(&request.image)? {
        ImageSource::Url(url) => url,
        ImageSource::Inline(bytes) => persist_inline_image(state, bytes, subject_id.as_deref()).await?,
    };

    let location = state.result_locator.allocate(subject_id.as_deref());

    let (source_landmarks, template_landmarks) = tokio::try_join!(
        state.provider.detect_face(&source_url),
        state.provider.detect_face(&preset_url),
    )
    .map_err(OrchestratorError::from_detection)?;

    let source = FaceInput {
        image_url: source_url,
        landmarks: source_landmarks,
    };
    let template = FaceInput {
        image_url: preset_url,
        landmarks: template_landmarks,
    };

    tracing::info!(
        category = %request.category,
        preset = %template.image_url,
        key = %location.key,
        "Submitting face swap task"
    );

    let task = state
        .provider
        .submit_swap(&source, &template)
        .await
        .map_err(|e| OrchestratorError::Submission(e.to_string()))?;

    let job_id = Uuid::new_v4().to_string();
    let metadata = serde_json::json!({
        "task_id": task.as_str(),
        "category": request.category,
        "preset_url": template.image_url,
        "source_url": source.image_url,
        "source_landmarks": source.landmarks,
        "template_landmarks": template.landmarks,
    });
    state
        .jobs
        .create(Job::new(job_id.clone(), JobKind::FaceSwap, Some(metadata)))?;

    tracing::info!(job_id = %job_id, task_id = %task, "Face swap task accepted");
    metrics::counter!("media_jobs_submitted_total", "kind" => JobKind::FaceSwap.as_label()).increment(1);

    worker::spawn_job(
        Arc::clone(&state.jobs),
        Arc::clone(&state.provider),
        Arc::clone(&state.storage),
        JobSpec {
            job_id: job_id.clone(),
            kind: JobKind::FaceSwap,
            task,
            location: location.clone(),
            settings: state.settings,
        },
    );

    Ok(AcceptedJob { job_id, location })
}
