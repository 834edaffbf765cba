use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::models::artifact::{ResultDescriptor, TaskHandle};
use crate::services::provider::{
    self, GenerationOptions, ProviderError, TaskPoller, TaskStatus, VideoProvider,
};
use crate::services::signing::RequestSigner;

const TASK_PATH: &str = "/v1/videos/multi-image2video";
const SUBMIT_TIMEOUT: Duration = Duration::from_secs(60);
const STATUS_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the Kling image-to-video API.
pub struct KlingClient {
    http: Client,
    base_url: String,
    signer: Box<dyn RequestSigner>,
}

#[derive(Serialize)]
struct CreateTaskRequest<'a> {
    model_name: &'a str,
    image_list: Vec<ImageRef<'a>>,
    prompt: String,
    mode: &'a str,
    duration: &'a str,
    aspect_ratio: &'a str,
}

#[derive(Serialize)]
struct ImageRef<'a> {
    image: &'a str,
}

#[derive(Debug, Deserialize)]
struct KlingEnvelope {
    data: Option<TaskData>,
}

#[derive(Debug, Deserialize)]
struct TaskData {
    task_id: Option<String>,
    task_status: Option<String>,
    task_status_msg: Option<String>,
    task_result: Option<TaskResult>,
}

#[derive(Debug, Deserialize)]
struct TaskResult {
    #[serde(default)]
    videos: Vec<VideoResult>,
}

#[derive(Debug, Deserialize)]
struct VideoResult {
    url: Option<String>,
}

impl KlingClient {
    pub fn new(base_url: impl Into<String>, signer: Box<dyn RequestSigner>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            signer,
        }
    }
}

/// Prompt sent to the model, with the subject's gender appended when known.
pub fn enrich_prompt(prompt: &str, gender: Option<&str>) -> String {
    match gender.map(str::trim).filter(|g| !g.is_empty()) {
        Some(gender) => format!("{}, {} character", prompt, gender),
        None => prompt.to_string(),
    }
}

/// Map a Kling status payload onto [`TaskStatus`].
fn map_task_status(data: TaskData) -> Result<TaskStatus, ProviderError> {
    let status = data.task_status.ok_or(ProviderError::MissingField("data.task_status"))?;
    match status.as_str() {
        "submitted" | "processing" => Ok(TaskStatus::Pending),
        "succeed" => {
            let url = data
                .task_result
                .and_then(|r| r.videos.into_iter().find_map(|v| v.url))
                .filter(|u| !u.is_empty());
            Ok(TaskStatus::Succeeded(url.map(ResultDescriptor::new)))
        }
        "failed" => Ok(TaskStatus::Failed(
            data.task_status_msg
                .unwrap_or_else(|| "Kling reported the task as failed".to_string()),
        )),
        _ => Err(ProviderError::UnmappedStatus(status)),
    }
}

#[async_trait]
impl TaskPoller for KlingClient {
    async fn poll_status(&self, task: &TaskHandle) -> Result<TaskStatus, ProviderError> {
        let path = format!("{}/{}", TASK_PATH, task.as_str());
        let authorization = self.signer.authorization("GET", &path, "")?;

        let response = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .header(AUTHORIZATION, authorization)
            .timeout(STATUS_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let envelope: KlingEnvelope = serde_json::from_str(&text)?;
        let data = envelope.data.ok_or(ProviderError::MissingField("data"))?;
        map_task_status(data)
    }

    async fn fetch_result_bytes(&self, result: &ResultDescriptor) -> Result<Vec<u8>, ProviderError> {
        provider::download(&self.http, result).await
    }
}

#[async_trait]
impl VideoProvider for KlingClient {
    async fn submit_generation(
        &self,
        source_image_url: &str,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<TaskHandle, ProviderError> {
        let request = CreateTaskRequest {
            model_name: &options.model_name,
            image_list: vec![ImageRef {
                image: source_image_url,
            }],
            prompt: enrich_prompt(prompt, options.gender.as_deref()),
            mode: &options.mode,
            duration: &options.duration,
            aspect_ratio: &options.aspect_ratio,
        };

        // The signature covers the exact bytes sent.
        let body = serde_json::to_string(&request)?;
        let authorization = self.signer.authorization("POST", TASK_PATH, &body)?;

        let response = self
            .http
            .post(format!("{}{}", self.base_url, TASK_PATH))
            .header(AUTHORIZATION, authorization)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .timeout(SUBMIT_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        tracing::info!(status = status.as_u16(), "Kling task creation responded");

        if !status.is_success() {
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let envelope: KlingEnvelope = serde_json::from_str(&text)?;
        envelope
            .data
            .and_then(|d| d.task_id)
            .filter(|id| !id.is_empty())
            .map(TaskHandle)
            .ok_or(ProviderError::MissingField("data.task_id"))
    }
}
