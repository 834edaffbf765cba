//! Test doubles for storage and providers.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use genmedia_relay::app_state::{FaceSwapState, VideoState};
use genmedia_relay::models::artifact::{ResultDescriptor, TaskHandle};
use genmedia_relay::models::face_swap::{FaceInput, FaceLandmarks};
use genmedia_relay::services::jobs::JobStore;
use genmedia_relay::services::locator::{ArtifactLocator, StorageNaming};
use genmedia_relay::services::presets::PresetRegistry;
use genmedia_relay::services::provider::{
    FaceSwapProvider, GenerationOptions, ProviderError, TaskPoller, TaskStatus, VideoProvider,
};
use genmedia_relay::services::storage::{ObjectStore, StorageError};
use genmedia_relay::services::worker::PollSettings;

pub const RESULT_BYTES: &[u8] = b"\x00\x00\x00\x18ftypmp42fake video";

/// In-memory object store that records every write.
#[derive(Default)]
pub struct MemoryStore {
    objects: Mutex<HashMap<String, (Vec<u8>, String)>>,
    fail_writes: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            objects: Mutex::new(HashMap::new()),
            fail_writes: true,
        }
    }

    pub fn get(&self, key: &str) -> Option<(Vec<u8>, String)> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn put_object(&self, key: &str, data: Vec<u8>, content_type: &str) -> Result<(), StorageError> {
        if self.fail_writes {
            return Err(StorageError::Rejected {
                status: 503,
                key: key.to_string(),
            });
        }
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), (data, content_type.to_string()));
        Ok(())
    }
}

/// One scripted answer to a status poll.
#[derive(Clone)]
pub enum Step {
    Status(TaskStatus),
    Error,
    Garbled,
    Panic,
}

/// Provider double: answers polls from a script, then repeats the last step forever.
pub struct ScriptedProvider {
    steps: Mutex<VecDeque<Step>>,
    last: Mutex<Step>,
    polls: AtomicUsize,
    submissions: AtomicUsize,
    reject_submission: bool,
    fail_download: bool,
}

impl ScriptedProvider {
    pub fn new(steps: Vec<Step>) -> Self {
        let last = steps.last().cloned().unwrap_or(Step::Status(TaskStatus::Pending));
        Self {
            steps: Mutex::new(steps.into()),
            last: Mutex::new(last),
            polls: AtomicUsize::new(0),
            submissions: AtomicUsize::new(0),
            reject_submission: false,
            fail_download: false,
        }
    }

    pub fn succeeding_after(pending_polls: usize) -> Self {
        let mut steps = vec![Step::Status(TaskStatus::Pending); pending_polls];
        steps.push(Step::Status(TaskStatus::Succeeded(Some(ResultDescriptor::new(
            "https://provider.example/result.mp4",
        )))));
        Self::new(steps)
    }

    pub fn forever_pending() -> Self {
        Self::new(vec![Step::Status(TaskStatus::Pending)])
    }

    pub fn rejecting_submission() -> Self {
        Self {
            reject_submission: true,
            ..Self::forever_pending()
        }
    }

    pub fn with_failing_download(mut self) -> Self {
        self.fail_download = true;
        self
    }

    pub fn polls(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }

    pub fn submissions(&self) -> usize {
        self.submissions.load(Ordering::SeqCst)
    }

    fn next_step(&self) -> Step {
        let mut steps = self.steps.lock().unwrap();
        match steps.pop_front() {
            Some(step) => step,
            None => self.last.lock().unwrap().clone(),
        }
    }

    fn submit(&self) -> Result<TaskHandle, ProviderError> {
        self.submissions.fetch_add(1, Ordering::SeqCst);
        if self.reject_submission {
            return Err(ProviderError::Status {
                status: 400,
                body: "invalid image".to_string(),
            });
        }
        Ok(TaskHandle("task-123".to_string()))
    }
}

#[async_trait]
impl TaskPoller for ScriptedProvider {
    async fn poll_status(&self, _task: &TaskHandle) -> Result<TaskStatus, ProviderError> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        match self.next_step() {
            Step::Status(status) => Ok(status),
            Step::Error => Err(ProviderError::Status {
                status: 502,
                body: "bad gateway".to_string(),
            }),
            Step::Garbled => Err(ProviderError::UnmappedStatus("%%garbled%%".to_string())),
            Step::Panic => panic!("provider client bug"),
        }
    }

    async fn fetch_result_bytes(&self, _result: &ResultDescriptor) -> Result<Vec<u8>, ProviderError> {
        if self.fail_download {
            return Err(ProviderError::Status {
                status: 404,
                body: "expired".to_string(),
            });
        }
        Ok(RESULT_BYTES.to_vec())
    }
}

#[async_trait]
impl VideoProvider for ScriptedProvider {
    async fn submit_generation(
        &self,
        _source_image_url: &str,
        _prompt: &str,
        _options: &GenerationOptions,
    ) -> Result<TaskHandle, ProviderError> {
        self.submit()
    }
}

#[async_trait]
impl FaceSwapProvider for ScriptedProvider {
    async fn detect_face(&self, image_url: &str) -> Result<FaceLandmarks, ProviderError> {
        if image_url.contains("no-face") {
            return Err(ProviderError::NoFace(image_url.to_string()));
        }
        Ok(FaceLandmarks(serde_json::json!([[10, 20], [30, 40]])))
    }

    async fn submit_swap(&self, _source: &FaceInput, _template: &FaceInput) -> Result<TaskHandle, ProviderError> {
        self.submit()
    }
}

pub fn naming() -> StorageNaming {
    StorageNaming::new("photo-to-video", "ap-northeast-2")
}

pub fn video_state(
    provider: Arc<ScriptedProvider>,
    storage: Arc<MemoryStore>,
    settings: PollSettings,
) -> VideoState {
    VideoState::new(
        Arc::new(JobStore::new()),
        storage,
        provider,
        ArtifactLocator::new(naming(), "ai-videos", "mp4"),
        GenerationOptions::default(),
        settings,
    )
}

pub const MALE_PRESETS: [&str; 3] = [
    "https://presets.example/male/1.jpg",
    "https://presets.example/male/2.jpg",
    "https://presets.example/male/3.jpg",
];

pub fn face_swap_state(
    provider: Arc<ScriptedProvider>,
    storage: Arc<MemoryStore>,
    settings: PollSettings,
) -> FaceSwapState {
    let presets = PresetRegistry::new(HashMap::from([(
        "male".to_string(),
        MALE_PRESETS.iter().map(|s| s.to_string()).collect(),
    )]));

    FaceSwapState {
        jobs: Arc::new(JobStore::new()),
        storage,
        provider,
        presets: Arc::new(presets),
        result_locator: Arc::new(ArtifactLocator::new(naming(), "face-swap/results", "jpg")),
        upload_locator: Arc::new(ArtifactLocator::new(naming(), "face-swap/uploads", "jpg")),
        settings,
    }
}

pub fn fast_settings() -> PollSettings {
    PollSettings::new(Duration::from_millis(10), Duration::from_secs(5))
}
