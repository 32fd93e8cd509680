use std::sync::Arc;
use std::time::Duration;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use crate::agent::{AgentLogEntry, LogCallback};
use crate::config::JobsConfig;
use crate::errors::ScoutError;
use crate::models::{ScrapedRecord, Source};
use super::state::{JobStatus, JobSummary, ScrapeJob};

struct JobEntry {
    job: ScrapeJob,
    cancel: CancellationToken,
}

/// In-memory job registry shared by the orchestrator and the HTTP handlers.
///
/// Each job's status is written only by its own supervising task; log appends
/// may arrive concurrently from several scrapers.
#[derive(Clone)]
pub struct JobStore {
    jobs: Arc<DashMap<String, JobEntry>>,
    ttl: chrono::Duration,
    sweep_interval: Duration,
    max_jobs: usize,
}

impl JobStore {
    pub fn new(config: &JobsConfig) -> Self {
        Self {
            jobs: Arc::new(DashMap::new()),
            ttl: chrono::Duration::seconds(config.ttl_secs.min(JobsConfig::MAX_SECS) as i64),
            sweep_interval: Duration::from_secs(config.sweep_interval_secs.clamp(1, JobsConfig::MAX_SECS)),
            max_jobs: config.max_jobs.max(1),
        }
    }

    /// Register a running job. When the store is full the oldest finished job is
    /// evicted; if every job is still running the request is refused.
    pub fn create(&self, query: &str, sources: Vec<Source>) -> Result<(String, CancellationToken), ScoutError> {
        if self.jobs.len() >= self.max_jobs && !self.evict_oldest_terminal() {
            return Err(ScoutError::RateLimit(format!(
                "{} jobs already running; try again later",
                self.jobs.len()
            )));
        }
        let job = ScrapeJob::new(query, sources);
        let id = job.id.clone();
        let cancel = CancellationToken::new();
        self.jobs.insert(id.clone(), JobEntry { job, cancel: cancel.clone() });
        debug!(job_id = %id, "Job registered");
        Ok((id, cancel))
    }

    /// Append to a running job's log. Entries for unknown or finished jobs are dropped.
    pub fn append_log(&self, id: &str, entry: AgentLogEntry) {
        if let Some(mut slot) = self.jobs.get_mut(id) {
            if slot.job.status == JobStatus::Running {
                slot.job.logs.push(entry);
            }
        }
    }

    /// Callback that appends every entry to this job's log.
    pub fn log_callback(&self, id: &str) -> LogCallback {
        let store = self.clone();
        let id = id.to_string();
        Arc::new(move |entry| store.append_log(&id, entry))
    }

    /// Store results, append the summary entry and mark the job completed.
    pub fn complete(&self, id: &str, results: Vec<ScrapedRecord>, summary: AgentLogEntry) -> bool {
        let Some(mut slot) = self.jobs.get_mut(id) else { return false };
        if !slot.job.finish(JobStatus::Completed) {
            return false;
        }
        slot.job.results = results;
        slot.job.logs.push(summary);
        true
    }

    pub fn fail(&self, id: &str, entry: AgentLogEntry) -> bool {
        let Some(mut slot) = self.jobs.get_mut(id) else { return false };
        if !slot.job.finish(JobStatus::Error) {
            return false;
        }
        slot.job.logs.push(entry);
        true
    }

    pub fn snapshot(&self, id: &str) -> Option<ScrapeJob> {
        self.jobs.get(id).map(|slot| slot.job.clone())
    }

    pub fn logs(&self, id: &str) -> Option<Vec<AgentLogEntry>> {
        self.jobs.get(id).map(|slot| slot.job.logs.clone())
    }

    /// Newest first.
    pub fn list(&self) -> Vec<JobSummary> {
        let mut jobs: Vec<JobSummary> = self.jobs.iter().map(|slot| slot.job.summary()).collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        jobs
    }

    /// Signal a running job to stop. Returns false if it had already finished.
    pub fn cancel(&self, id: &str) -> Result<bool, ScoutError> {
        let slot = self.jobs.get(id).ok_or_else(|| ScoutError::JobNotFound(id.to_string()))?;
        if slot.job.status.is_terminal() {
            return Ok(false);
        }
        slot.cancel.cancel();
        Ok(true)
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Drop finished jobs older than the TTL. Returns how many were removed.
    pub fn sweep_expired(&self, now: DateTime<Utc>) -> usize {
        let before = self.jobs.len();
        let ttl = self.ttl;
        self.jobs.retain(|_, slot| match slot.job.finished_at {
            Some(finished) if slot.job.status.is_terminal() => now - finished < ttl,
            _ => true,
        });
        before.saturating_sub(self.jobs.len())
    }

    fn evict_oldest_terminal(&self) -> bool {
        let oldest = self
            .jobs
            .iter()
            .filter(|slot| slot.job.status.is_terminal())
            .min_by_key(|slot| slot.job.finished_at.unwrap_or(slot.job.created_at))
            .map(|slot| slot.key().clone());
        match oldest {
            Some(id) => {
                self.jobs.remove(&id);
                debug!(job_id = %id, "Evicted finished job to make room");
                true
            }
            None => false,
        }
    }

    /// Periodically sweep expired jobs until `shutdown` fires.
    pub fn spawn_sweeper(&self, shutdown: CancellationToken) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(store.sweep_interval);
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = ticker.tick() => {
                        let removed = store.sweep_expired(Utc::now());
                        if removed > 0 {
                            info!(removed, remaining = store.len(), "Swept expired jobs");
                        }
                    }
                }
            }
        })
    }
}
