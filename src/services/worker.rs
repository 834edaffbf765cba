//! Poll-and-materialize workers.
//!
//! One supervised tokio task per job. The inner task polls the provider on a
//! fixed interval until the task is terminal or the polling budget runs out,
//! then downloads the result and writes it to the pre-allocated key. The
//! supervisor awaits the inner task and always records a terminal status,
//! including when the inner task panics.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;

use crate::models::artifact::{ArtifactLocation, ResultDescriptor, TaskHandle};
use crate::models::job::JobKind;
use crate::services::jobs::JobStore;
use crate::services::provider::{TaskPoller, TaskStatus};
use crate::services::storage::ObjectStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    pub timeout: Duration,
}

impl PollSettings {
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }
}

/// Everything a worker needs to drive one job to a terminal state.
#[derive(Debug, Clone)]
pub struct JobSpec {
    pub job_id: String,
    pub kind: JobKind,
    pub task: TaskHandle,
    pub location: ArtifactLocation,
    pub settings: PollSettings,
}

#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("Provider reported failure: {0}")]
    ProviderFailure(String),

    #[error("Failed to materialize result: {0}")]
    Materialization(String),

    #[error("Timed out after {}s waiting for the provider", .0.as_secs())]
    Timeout(Duration),

    #[error("Worker aborted unexpectedly: {0}")]
    Aborted(String),
}

/// Start the supervised worker for `spec`. Call once per job.
pub fn spawn_job<P>(
    jobs: Arc<JobStore>,
    poller: Arc<P>,
    storage: Arc<dyn ObjectStore>,
    spec: JobSpec,
) -> JoinHandle<()>
where
    P: TaskPoller + ?Sized + 'static,
{
    metrics::gauge!("media_jobs_in_flight").increment(1.0);
    tokio::spawn(supervise(jobs, poller, storage, spec))
}

async fn supervise<P>(
    jobs: Arc<JobStore>,
    poller: Arc<P>,
    storage: Arc<dyn ObjectStore>,
    spec: JobSpec,
) where
    P: TaskPoller + ?Sized + 'static,
{
    let started = Instant::now();
    let job_id = spec.job_id.clone();
    let kind = spec.kind;

    let inner = tokio::spawn(run_job(jobs.clone(), poller, storage, spec));
    let outcome = match inner.await {
        Ok(outcome) => outcome,
        Err(join_error) => Err(JobError::Aborted(join_error.to_string())),
    };

    let recorded = match &outcome {
        Ok(url) => {
            tracing::info!(job_id = %job_id, kind = %kind, result_url = %url, "Job succeeded");
            metrics::counter!("media_jobs_succeeded_total", "kind" => kind.as_label()).increment(1);
            jobs.complete(&job_id, url.clone())
        }
        Err(e) => {
            tracing::error!(job_id = %job_id, kind = %kind, error = %e, "Job failed");
            metrics::counter!("media_jobs_failed_total", "kind" => kind.as_label()).increment(1);
            jobs.fail(&job_id, e.to_string())
        }
    };

    if let Err(e) = recorded {
        tracing::error!(job_id = %job_id, error = %e, "Failed to record terminal job state");
    }

    metrics::histogram!("media_job_duration_seconds", "kind" => kind.as_label())
        .record(started.elapsed().as_secs_f64());
    metrics::gauge!("media_jobs_in_flight").decrement(1.0);
}

async fn run_job<P>(
    jobs: Arc<JobStore>,
    poller: Arc<P>,
    storage: Arc<dyn ObjectStore>,
    spec: JobSpec,
) -> Result<String, JobError>
where
    P: TaskPoller + ?Sized + 'static,
{
    tracing::info!(
        job_id = %spec.job_id,
        task_id = %spec.task,
        key = %spec.location.key,
        "Background processing started"
    );

    let timeout = spec.settings.timeout;
    let result = tokio::time::timeout(timeout, poll_until_terminal(&jobs, poller.as_ref(), &spec))
        .await
        .map_err(|_| JobError::Timeout(timeout))??;

    materialize(poller.as_ref(), storage.as_ref(), &spec, &result).await
}

async fn poll_until_terminal<P>(
    jobs: &JobStore,
    poller: &P,
    spec: &JobSpec,
) -> Result<ResultDescriptor, JobError>
where
    P: TaskPoller + ?Sized,
{
    let mut marked_processing = false;

    loop {
        match poller.poll_status(&spec.task).await {
            Ok(TaskStatus::Succeeded(Some(result))) => return Ok(result),
            Ok(TaskStatus::Succeeded(None)) => {
                return Err(JobError::Materialization(
                    "provider reported success without a result URL".to_string(),
                ))
            }
            Ok(TaskStatus::Failed(reason)) => return Err(JobError::ProviderFailure(reason)),
            Ok(TaskStatus::Pending) => {
                tracing::debug!(job_id = %spec.job_id, task_id = %spec.task, "Task still in progress");
            }
            Err(e) => {
                tracing::warn!(job_id = %spec.job_id, task_id = %spec.task, error = %e, "Status check failed, will retry");
            }
        }

        if !marked_processing {
            if let Err(e) = jobs.mark_processing(&spec.job_id, "Waiting for provider") {
                tracing::warn!(job_id = %spec.job_id, error = %e, "Failed to mark job processing");
            }
            marked_processing = true;
        }

        tokio::time::sleep(spec.settings.interval).await;
    }
}

async fn materialize<P>(
    poller: &P,
    storage: &dyn ObjectStore,
    spec: &JobSpec,
    result: &ResultDescriptor,
) -> Result<String, JobError>
where
    P: TaskPoller + ?Sized,
{
    tracing::info!(job_id = %spec.job_id, source = %result.url, "Downloading provider result");
    let bytes = poller
        .fetch_result_bytes(result)
        .await
        .map_err(|e| JobError::Materialization(e.to_string()))?;

    let content_type = result
        .content_type
        .as_deref()
        .unwrap_or_else(|| spec.kind.default_content_type());

    tracing::info!(job_id = %spec.job_id, key = %spec.location.key, bytes = bytes.len(), "Uploading result to storage");
    storage
        .put_object(&spec.location.key, bytes, content_type)
        .await
        .map_err(|e| JobError::Materialization(e.to_string()))?;

    Ok(spec.location.url.clone())
}
