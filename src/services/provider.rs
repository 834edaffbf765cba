//! Capabilities the orchestrator and workers need from generation providers.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::models::artifact::{ResultDescriptor, TaskHandle};
use crate::models::face_swap::{FaceInput, FaceLandmarks};
use crate::services::signing::SigningError;

const RESULT_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(300);

/// Provider-reported state of a task, reduced to what the worker acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    Pending,
    /// `None` when the provider claims success but omits the result location.
    Succeeded(Option<ResultDescriptor>),
    Failed(String),
}

/// Parameters forwarded to the video model.
#[derive(Debug, Clone)]
pub struct GenerationOptions {
    pub model_name: String,
    pub mode: String,
    pub duration: String,
    pub aspect_ratio: String,
    pub gender: Option<String>,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            model_name: "kling-v1-6".to_string(),
            mode: "std".to_string(),
            duration: "5".to_string(),
            aspect_ratio: "16:9".to_string(),
            gender: None,
        }
    }
}

/// Status lookup and result download, shared by every provider.
#[async_trait]
pub trait TaskPoller: Send + Sync {
    /// Errors are transient from the worker's point of view.
    async fn poll_status(&self, task: &TaskHandle) -> Result<TaskStatus, ProviderError>;

    async fn fetch_result_bytes(&self, result: &ResultDescriptor) -> Result<Vec<u8>, ProviderError>;
}

#[async_trait]
pub trait VideoProvider: TaskPoller {
    async fn submit_generation(
        &self,
        source_image_url: &str,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<TaskHandle, ProviderError>;
}

#[async_trait]
pub trait FaceSwapProvider: TaskPoller {
    /// Landmarks of the most prominent face in the image.
    async fn detect_face(&self, image_url: &str) -> Result<FaceLandmarks, ProviderError>;

    /// Place the face of `source` onto the face of `template`.
    async fn submit_swap(&self, source: &FaceInput, template: &FaceInput) -> Result<TaskHandle, ProviderError>;
}

/// Plain GET of a provider result URL.
pub async fn download(http: &Client, result: &ResultDescriptor) -> Result<Vec<u8>, ProviderError> {
    let response = http
        .get(&result.url)
        .timeout(RESULT_DOWNLOAD_TIMEOUT)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(ProviderError::Status {
            status: status.as_u16(),
            body: response.text().await.unwrap_or_default(),
        });
    }

    Ok(response.bytes().await?.to_vec())
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Provider response is missing {0}")]
    MissingField(&'static str),

    #[error("Provider reported unrecognised task status {0:?}")]
    UnmappedStatus(String),

    #[error("No face detected in {0}")]
    NoFace(String),

    #[error("Failed to sign request: {0}")]
    Signing(#[from] SigningError),

    #[error("Failed to decode provider response: {0}")]
    Decode(#[from] serde_json::Error),
}
