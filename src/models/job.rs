use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;

/// Status of a media generation job.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Processing,
    Succeeded,
    Failed,
}

impl JobStatus {
    /// No transition leaves a terminal status.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Succeeded | JobStatus::Failed)
    }
}

/// Which pipeline produced the job. Also used as the metrics label.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum JobKind {
    Video,
    FaceSwap,
}

impl JobKind {
    pub fn as_label(self) -> &'static str {
        match self {
            JobKind::Video => "video",
            JobKind::FaceSwap => "face_swap",
        }
    }

    /// Content type used when the provider does not report one.
    pub fn default_content_type(self) -> &'static str {
        match self {
            JobKind::Video => "video/mp4",
            JobKind::FaceSwap => "image/jpeg",
        }
    }
}

/// A media generation job tracked for the lifetime of the process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub kind: JobKind,
    pub status: JobStatus,
    pub message: String,
    pub result_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub metadata: Option<serde_json::Value>,
}

impl Job {
    pub fn new(id: impl Into<String>, kind: JobKind, metadata: Option<serde_json::Value>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            kind,
            status: JobStatus::Pending,
            message: "Task submitted to provider".to_string(),
            result_url: None,
            created_at: now,
            updated_at: now,
            metadata,
        }
    }
}

/// Response body for GET /api/v1/jobs/{job_id}.
#[derive(Debug, Serialize, Deserialize)]
pub struct JobStatusResponse {
    pub job_id: String,
    pub kind: JobKind,
    pub status: JobStatus,
    pub message: String,
    pub result_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl From<Job> for JobStatusResponse {
    fn from(job: Job) -> Self {
        Self {
            job_id: job.id,
            kind: job.kind,
            status: job.status,
            message: job.message,
            result_url: job.result_url,
            created_at: job.created_at,
            updated_at: job.updated_at,
            metadata: job.metadata,
        }
    }
}
