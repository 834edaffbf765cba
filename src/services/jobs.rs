use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::models::job::{Job, JobStatus};

/// Process-wide in-memory job registry.
///
/// Each entry is written by exactly one worker; readers take a snapshot
/// clone. A job in a terminal status is frozen, and a result URL once set
/// is never replaced.
#[derive(Debug, Default)]
pub struct JobStore {
    jobs: DashMap<String, Job>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, job: Job) -> Result<(), JobStoreError> {
        match self.jobs.entry(job.id.clone()) {
            Entry::Occupied(_) => Err(JobStoreError::Duplicate(job.id)),
            Entry::Vacant(slot) => {
                slot.insert(job);
                Ok(())
            }
        }
    }

    pub fn get(&self, job_id: &str) -> Result<Job, JobStoreError> {
        self.jobs
            .get(job_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| JobStoreError::NotFound(job_id.to_string()))
    }

    /// Apply `mutate` to a copy of the job and commit it if the invariants hold.
    ///
    /// `id`, `kind` and `created_at` are restored after the mutator runs.
    pub fn update<F>(&self, job_id: &str, mutate: F) -> Result<Job, JobStoreError>
    where
        F: FnOnce(&mut Job),
    {
        let mut entry = self
            .jobs
            .get_mut(job_id)
            .ok_or_else(|| JobStoreError::NotFound(job_id.to_string()))?;

        let current = entry.value();
        if current.status.is_terminal() {
            return Err(JobStoreError::AlreadyTerminal {
                job_id: job_id.to_string(),
                status: current.status,
            });
        }

        let mut next = current.clone();
        mutate(&mut next);
        next.id = current.id.clone();
        next.kind = current.kind;
        next.created_at = current.created_at;

        if current.result_url.is_some() && next.result_url != current.result_url {
            return Err(JobStoreError::ResultAlreadySet(job_id.to_string()));
        }

        next.updated_at = Utc::now();
        *entry.value_mut() = next.clone();
        Ok(next)
    }

    pub fn mark_processing(&self, job_id: &str, message: impl Into<String>) -> Result<Job, JobStoreError> {
        let message = message.into();
        self.update(job_id, |job| {
            job.status = JobStatus::Processing;
            job.message = message;
        })
    }

    pub fn complete(&self, job_id: &str, result_url: impl Into<String>) -> Result<Job, JobStoreError> {
        let result_url = result_url.into();
        self.update(job_id, |job| {
            job.status = JobStatus::Succeeded;
            job.message = "Media generated and stored".to_string();
            job.result_url = Some(result_url);
        })
    }

    pub fn fail(&self, job_id: &str, message: impl Into<String>) -> Result<Job, JobStoreError> {
        let message = message.into();
        self.update(job_id, |job| {
            job.status = JobStatus::Failed;
            job.message = message;
        })
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Jobs not yet in a terminal status.
    pub fn in_flight(&self) -> usize {
        self.jobs
            .iter()
            .filter(|entry| !entry.value().status.is_terminal())
            .count()
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum JobStoreError {
    #[error("Job {0} not found")]
    NotFound(String),

    #[error("Job {0} already exists")]
    Duplicate(String),

    #[error("Job {job_id} is already {status}")]
    AlreadyTerminal { job_id: String, status: JobStatus },

    #[error("Job {0} already has a result URL")]
    ResultAlreadySet(String),
}
