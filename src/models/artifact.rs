use serde::{Deserialize, Serialize};

/// A storage key plus the public URL it will resolve to once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactLocation {
    pub key: String,
    pub url: String,
}

impl ArtifactLocation {
    /// Final path segment of the key, e.g. `user_1700000000_ab12cd34ef56.mp4`.
    pub fn file_name(&self) -> &str {
        self.key.rsplit('/').next().unwrap_or(&self.key)
    }
}

/// Opaque task identifier returned by a provider on submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskHandle(pub String);

impl TaskHandle {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TaskHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a provider published a finished artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultDescriptor {
    pub url: String,
    pub content_type: Option<String>,
}

impl ResultDescriptor {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            content_type: None,
        }
    }
}
