//! Hand-off point to the external segment fetcher.

use std::collections::VecDeque;
use std::path::PathBuf;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::Notify;

use crate::Result;

/// Work item for the fetcher, keyed by the catalog id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchJob {
    pub id: i64,
    pub source_url: String,
    /// Playlist path for VODs, media file path for clips.
    pub target: PathBuf,
    pub vod: bool,
}

#[async_trait]
pub trait FetchQueue: Send + Sync {
    async fn submit(&self, job: FetchJob) -> Result<()>;

    /// Cancel the job for `id`. Returns whether one was pending.
    async fn remove(&self, id: i64) -> Result<bool>;
}

/// In-process FIFO queue.
#[derive(Default)]
pub struct InMemoryFetchQueue {
    jobs: Mutex<VecDeque<FetchJob>>,
    notify: Notify,
}

impl InMemoryFetchQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.jobs.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.lock().is_empty()
    }

    pub fn pending(&self) -> Vec<FetchJob> {
        self.jobs.lock().iter().cloned().collect()
    }

    pub fn try_next(&self) -> Option<FetchJob> {
        self.jobs.lock().pop_front()
    }

    /// Wait for the next job.
    pub async fn next(&self) -> FetchJob {
        loop {
            let notified = self.notify.notified();
            if let Some(job) = self.try_next() {
                return job;
            }
            notified.await;
        }
    }
}

#[async_trait]
impl FetchQueue for InMemoryFetchQueue {
    async fn submit(&self, job: FetchJob) -> Result<()> {
        {
            let mut jobs = self.jobs.lock();
            jobs.retain(|j| j.id != job.id);
            jobs.push_back(job);
        }
        self.notify.notify_one();
        Ok(())
    }

    async fn remove(&self, id: i64) -> Result<bool> {
        let mut jobs = self.jobs.lock();
        let before = jobs.len();
        jobs.retain(|j| j.id != id);
        Ok(jobs.len() != before)
    }
}
