use axum::extract::FromRef;
use std::sync::Arc;

use crate::services::{
    jobs::JobStore,
    locator::ArtifactLocator,
    presets::PresetRegistry,
    provider::{FaceSwapProvider, GenerationOptions, VideoProvider},
    storage::ObjectStore,
    worker::PollSettings,
};

/// Shared state of the video service.
#[derive(Clone)]
pub struct VideoState {
    pub jobs: Arc<JobStore>,
    pub storage: Arc<dyn ObjectStore>,
    pub provider: Arc<dyn VideoProvider>,
    pub locator: Arc<ArtifactLocator>,
    pub options: GenerationOptions,
    pub settings: PollSettings,
}

impl VideoState {
    pub fn new(
        jobs: Arc<JobStore>,
        storage: Arc<dyn ObjectStore>,
        provider: Arc<dyn VideoProvider>,
        locator: ArtifactLocator,
        options: GenerationOptions,
        settings: PollSettings,
    ) -> Self {
        Self {
            jobs,
            storage,
            provider,
            locator: Arc::new(locator),
            options,
            settings,
        }
    }
}

/// Shared state of the face-swap service.
#[derive(Clone)]
pub struct FaceSwapState {
    pub jobs: Arc<JobStore>,
    pub storage: Arc<dyn ObjectStore>,
    pub provider: Arc<dyn FaceSwapProvider>,
    pub presets: Arc<PresetRegistry>,
    /// Where swapped images are written.
    pub result_locator: Arc<ArtifactLocator>,
    /// Where inline uploads are written before detection.
    pub upload_locator: Arc<ArtifactLocator>,
    pub settings: PollSettings,
}

impl FromRef<VideoState> for Arc<JobStore> {
    fn from_ref(state: &VideoState) -> Self {
        state.jobs.clone()
    }
}

impl FromRef<FaceSwapState> for Arc<JobStore> {
    fn from_ref(state: &FaceSwapState) -> Self {
        state.jobs.clone()
    }
}
