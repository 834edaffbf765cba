use std::time::Duration;

use serde::Deserialize;

use crate::services::signing::AuthScheme;

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    /// Video service bind address (e.g., "0.0.0.0:5002").
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Face-swap service bind address.
    #[serde(default = "default_face_swap_bind_addr")]
    pub face_swap_bind_addr: String,

    /// Bucket that receives generated media
    pub s3_bucket_name: String,

    /// AWS region of the bucket
    #[serde(default = "default_s3_region")]
    pub s3_region: String,

    /// S3 access key ID
    pub aws_access_key_id: String,

    /// S3 secret access key
    pub aws_secret_access_key: String,

    /// Custom endpoint for S3-compatible stores (R2, MinIO). Unset means AWS.
    pub s3_endpoint: Option<String>,

    /// Overrides the `https://{bucket}.s3.{region}.amazonaws.com` URL scheme.
    pub s3_public_base_url: Option<String>,

    /// Kling API access key
    pub kling_access_key: Option<String>,

    /// Kling API secret key
    pub kling_secret_key: Option<String>,

    #[serde(default = "default_kling_base_url")]
    pub kling_base_url: String,

    #[serde(default)]
    pub kling_auth_scheme: AuthScheme,

    #[serde(default = "default_kling_model_name")]
    pub kling_model_name: String,

    #[serde(default = "default_video_poll_interval_secs")]
    pub video_poll_interval_secs: u64,

    #[serde(default = "default_video_timeout_secs")]
    pub video_timeout_secs: u64,

    /// Face-swap provider API root
    pub face_swap_base_url: Option<String>,

    /// OAuth client id for the face-swap provider
    pub face_swap_client_id: Option<String>,

    /// OAuth client secret for the face-swap provider
    pub face_swap_client_secret: Option<String>,

    #[serde(default = "default_face_swap_poll_interval_secs")]
    pub face_swap_poll_interval_secs: u64,

    #[serde(default = "default_face_swap_timeout_secs")]
    pub face_swap_timeout_secs: u64,

    /// JSON file mapping category → preset image URLs. Unset uses the bundled set.
    pub face_swap_presets_path: Option<String>,
}

fn default_bind_addr() -> String {
    "0.0.0.0:5002".to_string()
}

fn default_face_swap_bind_addr() -> String {
    "0.0.0.0:5003".to_string()
}

fn default_s3_region() -> String {
    "ap-northeast-2".to_string()
}

fn default_kling_base_url() -> String {
    "https://api.kuaishou.com".to_string()
}

fn default_kling_model_name() -> String {
    "kling-v1-6".to_string()
}

fn default_video_poll_interval_secs() -> u64 {
    15
}

fn default_video_timeout_secs() -> u64 {
    600
}

fn default_face_swap_poll_interval_secs() -> u64 {
    5
}

fn default_face_swap_timeout_secs() -> u64 {
    180
}

/// Kling credentials, present only when both halves are configured.
pub struct KlingCredentials<'a> {
    pub access_key: &'a str,
    pub secret_key: &'a str,
}

/// Face-swap provider settings required by the face-swap binary.
pub struct FaceSwapCredentials<'a> {
    pub base_url: &'a str,
    pub client_id: &'a str,
    pub client_secret: &'a str,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    pub fn kling_credentials(&self) -> Result<KlingCredentials<'_>, ConfigError> {
        Ok(KlingCredentials {
            access_key: required(&self.kling_access_key, "KLING_ACCESS_KEY")?,
            secret_key: required(&self.kling_secret_key, "KLING_SECRET_KEY")?,
        })
    }

    pub fn face_swap_credentials(&self) -> Result<FaceSwapCredentials<'_>, ConfigError> {
        Ok(FaceSwapCredentials {
            base_url: required(&self.face_swap_base_url, "FACE_SWAP_BASE_URL")?,
            client_id: required(&self.face_swap_client_id, "FACE_SWAP_CLIENT_ID")?,
            client_secret: required(&self.face_swap_client_secret, "FACE_SWAP_CLIENT_SECRET")?,
        })
    }

    pub fn video_poll_interval(&self) -> Duration {
        Duration::from_secs(self.video_poll_interval_secs)
    }

    pub fn video_timeout(&self) -> Duration {
        Duration::from_secs(self.video_timeout_secs)
    }

    pub fn face_swap_poll_interval(&self) -> Duration {
        Duration::from_secs(self.face_swap_poll_interval_secs)
    }

    pub fn face_swap_timeout(&self) -> Duration {
        Duration::from_secs(self.face_swap_timeout_secs)
    }
}

fn required<'a>(value: &'a Option<String>, name: &'static str) -> Result<&'a str, ConfigError> {
    match value.as_deref() {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ConfigError::Missing(name)),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable {0}")]
    Missing(&'static str),
}
