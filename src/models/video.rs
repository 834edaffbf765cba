//! Wire format of the `/upload_image` endpoint.
//!
//! The client sends a nested document: `tmpDocument` carries the source image,
//! `newDocument` carries the prompt and the requesting user. Errors are
//! reported inside an `@returnException` envelope.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Default, Deserialize)]
pub struct UploadImageRequest {
    #[serde(rename = "tmpDocument", default)]
    pub tmp_document: TmpDocument,
    #[serde(rename = "newDocument", default)]
    pub new_document: NewDocument,
}

#[derive(Debug, Default, Deserialize)]
pub struct TmpDocument {
    pub source_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NewDocument {
    #[serde(rename = "_createUser", default)]
    pub create_user: CreateUser,
    #[serde(rename = "Prompt")]
    pub prompt: Option<String>,
    pub gender: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateUser {
    #[serde(rename = "userId", default, deserialize_with = "lenient_user_id")]
    pub user_id: Option<String>,
}

/// Clients send the user id as a string or a number. Anything else is treated
/// as absent so the key falls back to the unknown subject.
fn lenient_user_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(id)) => Some(id),
        Some(Value::Number(id)) => Some(id.to_string()),
        _ => None,
    })
}

/// Validated input for one video generation job.
#[derive(Debug, Clone)]
pub struct VideoJobInput {
    pub source_image_url: String,
    pub prompt: String,
    pub subject_id: Option<String>,
    pub gender: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadImageResponse {
    #[serde(rename = "tmpDocument")]
    pub tmp_document: AcceptedDocument,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AcceptedDocument {
    #[serde(rename = "aiVideoName")]
    pub ai_video_name: String,
    #[serde(rename = "jobId")]
    pub job_id: String,
    pub response: VideoUrl,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VideoUrl {
    pub video_url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReturnException {
    #[serde(rename = "@returnException")]
    pub return_exception: ExceptionBody,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExceptionBody {
    #[serde(rename = "#message")]
    pub message: ExceptionMessage,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExceptionMessage {
    pub message: String,
    pub code: i32,
}

impl ReturnException {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            return_exception: ExceptionBody {
                message: ExceptionMessage {
                    message: message.into(),
                    code: -1,
                },
            },
        }
    }
}
