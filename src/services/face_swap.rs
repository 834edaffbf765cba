use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::models::artifact::{ResultDescriptor, TaskHandle};
use crate::models::face_swap::{FaceInput, FaceLandmarks};
use crate::services::provider::{self, FaceSwapProvider, ProviderError, TaskPoller, TaskStatus};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Client for the face-swap provider: OAuth client-credentials token,
/// per-image face detection, swap submission and polling.
pub struct FaceSwapClient {
    http: Client,
    base_url: String,
    client_id: String,
    client_secret: String,
    token: Mutex<Option<CachedToken>>,
}

struct CachedToken {
    access_token: String,
    refresh_at: Instant,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

#[derive(Serialize)]
struct DetectRequest<'a> {
    image_url: &'a str,
}

#[derive(Deserialize)]
struct DetectResponse {
    #[serde(default)]
    faces: Vec<DetectedFace>,
}

#[derive(Deserialize)]
struct DetectedFace {
    landmarks: serde_json::Value,
}

#[derive(Serialize)]
struct SwapRequest<'a> {
    source: &'a FaceInput,
    template: &'a FaceInput,
}

#[derive(Deserialize)]
struct SwapResponse {
    task_id: Option<String>,
}

#[derive(Deserialize)]
struct SwapStatusResponse {
    status: Option<String>,
    result_url: Option<String>,
    error: Option<String>,
}

impl FaceSwapClient {
    pub fn new(
        base_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            token: Mutex::new(None),
        }
    }

    /// Bearer token, exchanged again shortly before the cached one expires.
    async fn access_token(&self) -> Result<String, ProviderError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.refresh_at {
                return Ok(token.access_token.clone());
            }
        }

        let response = self
            .http
            .post(format!("{}/oauth/token", self.base_url))
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
            ])
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        let token: TokenResponse = read_json(response).await?;
        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(TOKEN_REFRESH_MARGIN);
        tracing::debug!(expires_in = token.expires_in, "Face-swap access token refreshed");

        *cached = Some(CachedToken {
            access_token: token.access_token.clone(),
            refresh_at: Instant::now() + lifetime,
        });
        Ok(token.access_token)
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T, ProviderError> {
    let status = response.status();
    let text = response.text().await?;
    if !status.is_success() {
        return Err(ProviderError::Status {
            status: status.as_u16(),
            body: text,
        });
    }
    Ok(serde_json::from_str(&text)?)
}

fn map_swap_status(response: SwapStatusResponse) -> Result<TaskStatus, ProviderError> {
    let status = response.status.ok_or(ProviderError::MissingField("status"))?;
    match status.to_ascii_lowercase().as_str() {
        "queued" | "pending" | "processing" | "running" => Ok(TaskStatus::Pending),
        "succeeded" | "success" | "done" => Ok(TaskStatus::Succeeded(
            response
                .result_url
                .filter(|u| !u.is_empty())
                .map(ResultDescriptor::new),
        )),
        "failed" | "error" => Ok(TaskStatus::Failed(
            response
                .error
                .unwrap_or_else(|| "Face swap reported failure".to_string()),
        )),
        _ => Err(ProviderError::UnmappedStatus(status)),
    }
}

#[async_trait]
impl TaskPoller for FaceSwapClient {
    async fn poll_status(&self, task: &TaskHandle) -> Result<TaskStatus, ProviderError> {
        let token = self.access_token().await?;
        let response = self
            .http
            .get(format!("{}/v1/face/swap/{}", self.base_url, task.as_str()))
            .bearer_auth(token)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        map_swap_status(read_json(response).await?)
    }

    async fn fetch_result_bytes(&self, result: &ResultDescriptor) -> Result<Vec<u8>, ProviderError> {
        provider::download(&self.http, result).await
    }
}

#[async_trait]
impl FaceSwapProvider for FaceSwapClient {
    async fn detect_face(&self, image_url: &str) -> Result<FaceLandmarks, ProviderError> {
        let token = self.access_token().await?;
        let response = self
            .http
            .post(format!("{}/v1/face/detect", self.base_url))
            .bearer_auth(token)
            .json(&DetectRequest { image_url })
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        let detected: DetectResponse = read_json(response).await?;
        detected
            .faces
            .into_iter()
            .next()
            .map(|face| FaceLandmarks(face.landmarks))
            .ok_or_else(|| ProviderError::NoFace(image_url.to_string()))
    }

    async fn submit_swap(&self, source: &FaceInput, template: &FaceInput) -> Result<TaskHandle, ProviderError> {
        let token = self.access_token().await?;
        let response = self
            .http
            .post(format!("{}/v1/face/swap", self.base_url))
            .bearer_auth(token)
            .json(&SwapRequest { source, template })
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        let created: SwapResponse = read_json(response).await?;
        created
            .task_id
            .filter(|id| !id.is_empty())
            .map(TaskHandle)
            .ok_or(ProviderError::MissingField("task_id"))
    }
}
