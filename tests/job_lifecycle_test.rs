mod helpers;

use std::sync::Arc;
use std::time::Duration;

use genmedia_relay::models::artifact::{ResultDescriptor, TaskHandle};
use genmedia_relay::models::job::{Job, JobKind, JobStatus};
use genmedia_relay::services::jobs::JobStore;
use genmedia_relay::services::locator::ArtifactLocator;
use genmedia_relay::services::provider::TaskStatus;
use genmedia_relay::services::worker::{self, JobSpec, PollSettings};

use helpers::{naming, MemoryStore, ScriptedProvider, Step, RESULT_BYTES};

const VIDEO_SETTINGS: PollSettings = PollSettings {
    interval: Duration::from_secs(15),
    timeout: Duration::from_secs(600),
};

struct Harness {
    jobs: Arc<JobStore>,
    storage: Arc<MemoryStore>,
    provider: Arc<ScriptedProvider>,
    spec: JobSpec,
}

fn harness(provider: ScriptedProvider, storage: MemoryStore, settings: PollSettings) -> Harness {
    let jobs = Arc::new(JobStore::new());
    jobs.create(Job::new("job-1", JobKind::Video, None)).unwrap();

    let location = ArtifactLocator::new(naming(), "ai-videos", "mp4").allocate(Some("user7"));
    Harness {
        jobs,
        storage: Arc::new(storage),
        provider: Arc::new(provider),
        spec: JobSpec {
            job_id: "job-1".to_string(),
            kind: JobKind::Video,
            task: TaskHandle("task-123".to_string()),
            location,
            settings,
        },
    }
}

impl Harness {
    fn spawn(&self) -> tokio::task::JoinHandle<()> {
        worker::spawn_job(
            self.jobs.clone(),
            self.provider.clone(),
            self.storage.clone(),
            self.spec.clone(),
        )
    }

    fn job(&self) -> Job {
        self.jobs.get(&self.spec.job_id).unwrap()
    }
}

#[tokio::test(start_paused = true)]
async fn test_success_stores_result_at_preallocated_location() {
    let h = harness(ScriptedProvider::succeeding_after(2), MemoryStore::new(), VIDEO_SETTINGS);
    h.spawn().await.unwrap();

    let job = h.job();
    assert_eq!(job.status, JobStatus::Succeeded);
    assert_eq!(job.result_url.as_deref(), Some(h.spec.location.url.as_str()));

    let (bytes, content_type) = h.storage.get(&h.spec.location.key).expect("result was not stored");
    assert_eq!(bytes, RESULT_BYTES);
    assert_eq!(content_type, "video/mp4");
    assert_eq!(h.provider.polls(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_provider_content_type_is_preserved() {
    let result = ResultDescriptor {
        url: "https://provider.example/out.webm".to_string(),
        content_type: Some("video/webm".to_string()),
    };
    let provider = ScriptedProvider::new(vec![Step::Status(TaskStatus::Succeeded(Some(result)))]);
    let h = harness(provider, MemoryStore::new(), VIDEO_SETTINGS);
    h.spawn().await.unwrap();

    let (_, content_type) = h.storage.get(&h.spec.location.key).unwrap();
    assert_eq!(content_type, "video/webm");
}

#[tokio::test(start_paused = true)]
async fn test_job_moves_to_processing_while_polling() {
    let h = harness(ScriptedProvider::forever_pending(), MemoryStore::new(), VIDEO_SETTINGS);
    assert_eq!(h.job().status, JobStatus::Pending);

    let handle = h.spawn();
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(h.job().status, JobStatus::Processing);
    assert_eq!(h.jobs.in_flight(), 1);

    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_provider_failure_is_recorded_without_retry() {
    let provider = ScriptedProvider::new(vec![
        Step::Status(TaskStatus::Pending),
        Step::Status(TaskStatus::Failed("content policy violation".to_string())),
    ]);
    let h = harness(provider, MemoryStore::new(), VIDEO_SETTINGS);
    h.spawn().await.unwrap();

    let job = h.job();
    assert_eq!(job.status, JobStatus::Failed);
    assert!(job.message.contains("content policy violation"));
    assert_eq!(job.result_url, None);
    assert_eq!(h.provider.polls(), 2);
    assert!(h.storage.keys().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_success_without_result_url_fails_immediately() {
    let provider = ScriptedProvider::new(vec![Step::Status(TaskStatus::Succeeded(None))]);
    let h = harness(provider, MemoryStore::new(), VIDEO_SETTINGS);
    h.spawn().await.unwrap();

    let job = h.job();
    assert_eq!(job.status, JobStatus::Failed);
    assert!(job.message.contains("without a result URL"));
    assert_eq!(h.provider.polls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_download_failure_fails_job() {
    let provider = ScriptedProvider::succeeding_after(0).with_failing_download();
    let h = harness(provider, MemoryStore::new(), VIDEO_SETTINGS);
    h.spawn().await.unwrap();

    let job = h.job();
    assert_eq!(job.status, JobStatus::Failed);
    assert!(job.message.starts_with("Failed to materialize result"));
    assert!(h.storage.keys().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_storage_failure_fails_job() {
    let h = harness(ScriptedProvider::succeeding_after(0), MemoryStore::failing(), VIDEO_SETTINGS);
    h.spawn().await.unwrap();

    let job = h.job();
    assert_eq!(job.status, JobStatus::Failed);
    assert!(job.message.contains("503"));
    assert_eq!(job.result_url, None);
}

#[tokio::test(start_paused = true)]
async fn test_transient_errors_are_retried() {
    let provider = ScriptedProvider::new(vec![
        Step::Error,
        Step::Garbled,
        Step::Status(TaskStatus::Pending),
        Step::Status(TaskStatus::Succeeded(Some(ResultDescriptor::new("https://p/x.mp4")))),
    ]);
    let h = harness(provider, MemoryStore::new(), VIDEO_SETTINGS);
    h.spawn().await.unwrap();

    assert_eq!(h.job().status, JobStatus::Succeeded);
    assert_eq!(h.provider.polls(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_forever_processing_times_out_at_budget_boundary() {
    let h = harness(ScriptedProvider::forever_pending(), MemoryStore::new(), VIDEO_SETTINGS);
    let handle = h.spawn();

    tokio::time::sleep(Duration::from_secs(599)).await;
    assert_eq!(h.job().status, JobStatus::Processing, "timed out before the budget");

    tokio::time::sleep(Duration::from_secs(2)).await;
    let job = h.job();
    assert_eq!(job.status, JobStatus::Failed, "still running after the budget");
    assert!(job.message.contains("Timed out after 600s"));
    assert!(handle.is_finished());

    // Polls at t = 0, 15, ..., 585 and possibly 600.
    assert!((40..=41).contains(&h.provider.polls()), "polled {} times", h.provider.polls());
}

#[tokio::test(start_paused = true)]
async fn test_garbled_status_forever_times_out() {
    let settings = PollSettings::new(Duration::from_secs(5), Duration::from_secs(180));
    let h = harness(ScriptedProvider::new(vec![Step::Garbled]), MemoryStore::new(), settings);
    let handle = h.spawn();

    tokio::time::sleep(Duration::from_secs(179)).await;
    assert!(!h.job().status.is_terminal());

    handle.await.unwrap();
    let job = h.job();
    assert_eq!(job.status, JobStatus::Failed);
    assert!(job.message.contains("Timed out after 180s"));
}

#[tokio::test(start_paused = true)]
async fn test_panicking_worker_still_reaches_terminal_state() {
    let provider = ScriptedProvider::new(vec![Step::Status(TaskStatus::Pending), Step::Panic]);
    let h = harness(provider, MemoryStore::new(), VIDEO_SETTINGS);
    h.spawn().await.unwrap();

    let job = h.job();
    assert_eq!(job.status, JobStatus::Failed);
    assert!(job.message.starts_with("Worker aborted unexpectedly"));
    assert_eq!(h.jobs.in_flight(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_terminal_state_survives_later_ticks() {
    let h = harness(ScriptedProvider::succeeding_after(0), MemoryStore::new(), VIDEO_SETTINGS);
    h.spawn().await.unwrap();
    let finished = h.job();

    // A second worker for the same job must not disturb the recorded outcome.
    let rogue = ScriptedProvider::new(vec![Step::Status(TaskStatus::Failed("late".to_string()))]);
    worker::spawn_job(h.jobs.clone(), Arc::new(rogue), h.storage.clone(), h.spec.clone())
        .await
        .unwrap();

    let job = h.job();
    assert_eq!(job.status, JobStatus::Succeeded);
    assert_eq!(job.result_url, finished.result_url);
    assert_eq!(job.updated_at, finished.updated_at);
}
