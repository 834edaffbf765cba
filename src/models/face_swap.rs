use garde::Validate;
use serde::{Deserialize, Serialize};

/// Body of POST /api/v1/face-swap.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct FaceSwapRequest {
    /// `http(s)` URL, `data:` URL, or bare base64 image bytes.
    #[garde(length(min = 1))]
    pub image: String,

    /// Preset registry category, e.g. `male` or `female`.
    #[garde(length(min = 1, max = 64))]
    pub category: String,

    #[garde(length(max = 128))]
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Landmark points reported by face detection, passed through to the swap call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FaceLandmarks(pub serde_json::Value);

/// One side of a face-swap submission.
#[derive(Debug, Clone, Serialize)]
pub struct FaceInput {
    pub image_url: String,
    pub landmarks: FaceLandmarks,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FaceSwapResponse {
    pub job_id: String,
    pub status: String,
    pub result_url: String,
}
