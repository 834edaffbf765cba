use chrono::Utc;
use uuid::Uuid;

use crate::models::artifact::ArtifactLocation;

/// Sentinel subject used when the caller does not identify itself.
pub const UNKNOWN_SUBJECT: &str = "unknown";

const SUFFIX_LEN: usize = 12;
const MAX_SUBJECT_LEN: usize = 64;

/// Public URL naming convention of the bucket that stores artifacts.
#[derive(Debug, Clone)]
pub struct StorageNaming {
    bucket: String,
    region: String,
    public_base_url: Option<String>,
}

impl StorageNaming {
    pub fn new(bucket: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            region: region.into(),
            public_base_url: None,
        }
    }

    /// Serve objects from `base` (CDN, R2 public domain) instead of the S3 host.
    pub fn with_public_base_url(mut self, base: Option<String>) -> Self {
        self.public_base_url = base.map(|b| b.trim_end_matches('/').to_string());
        self
    }

    pub fn public_url(&self, key: &str) -> String {
        match &self.public_base_url {
            Some(base) => format!("{}/{}", base, key),
            None => format!(
                "https://{}.s3.{}.amazonaws.com/{}",
                self.bucket, self.region, key
            ),
        }
    }
}

/// Predicts where an artifact will live before any of its bytes exist.
#[derive(Debug, Clone)]
pub struct ArtifactLocator {
    naming: StorageNaming,
    prefix: String,
    extension: String,
}

impl ArtifactLocator {
    pub fn new(naming: StorageNaming, prefix: impl Into<String>, extension: impl Into<String>) -> Self {
        Self {
            naming,
            prefix: prefix.into().trim_matches('/').to_string(),
            extension: extension.into(),
        }
    }

    pub fn allocate(&self, subject_id: Option<&str>) -> ArtifactLocation {
        self.allocate_with_extension(subject_id, &self.extension)
    }

    /// Same as [`allocate`](Self::allocate) with a caller-chosen extension.
    pub fn allocate_with_extension(&self, subject_id: Option<&str>, extension: &str) -> ArtifactLocation {
        let subject = sanitize_subject(subject_id);
        let timestamp = Utc::now().timestamp();
        let suffix = &Uuid::new_v4().simple().to_string()[..SUFFIX_LEN];

        let file_name = format!("{}_{}_{}.{}", subject, timestamp, suffix, extension);
        let key = if self.prefix.is_empty() {
            file_name
        } else {
            format!("{}/{}", self.prefix, file_name)
        };
        let url = self.naming.public_url(&key);

        ArtifactLocation { key, url }
    }
}

/// Keep subject ids key-safe: `[A-Za-z0-9_-]`, bounded length, never empty.
fn sanitize_subject(subject_id: Option<&str>) -> String {
    let cleaned: String = subject_id
        .unwrap_or_default()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .take(MAX_SUBJECT_LEN)
        .collect();

    if cleaned.is_empty() {
        UNKNOWN_SUBJECT.to_string()
    } else {
        cleaned
    }
}
