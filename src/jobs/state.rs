use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::agent::AgentLogEntry;
use crate::models::{ScrapedRecord, Source};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Running,
    Completed,
    Error,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Running)
    }

    /// Running may move to either terminal state; terminal states never move.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        *self == JobStatus::Running && next.is_terminal()
    }
}

/// One multi-source search with a polled lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeJob {
    pub id: String,
    pub status: JobStatus,
    pub query: String,
    pub sources: Vec<Source>,
    pub logs: Vec<AgentLogEntry>,
    pub results: Vec<ScrapedRecord>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl ScrapeJob {
    pub fn new(query: &str, sources: Vec<Source>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            status: JobStatus::Running,
            query: query.to_string(),
            sources,
            logs: Vec::new(),
            results: Vec::new(),
            created_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Move to a terminal state. Returns false, changing nothing, if the job
    /// already finished.
    pub(crate) fn finish(&mut self, status: JobStatus) -> bool {
        if !self.status.can_transition_to(status) {
            return false;
        }
        self.status = status;
        self.finished_at = Some(Utc::now());
        true
    }

    pub fn status_view(&self) -> JobStatusView {
        JobStatusView {
            status: self.status,
            logs: self.logs.clone(),
            results: self.results.clone(),
        }
    }

    pub fn summary(&self) -> JobSummary {
        JobSummary {
            id: self.id.clone(),
            status: self.status,
            query: self.query.clone(),
            sources: self.sources.clone(),
            log_count: self.logs.len(),
            result_count: self.results.len(),
            created_at: self.created_at,
            finished_at: self.finished_at,
        }
    }
}

/// Body of the job-status poll.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatusView {
    pub status: JobStatus,
    pub logs: Vec<AgentLogEntry>,
    pub results: Vec<ScrapedRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSummary {
    pub id: String,
    pub status: JobStatus,
    pub query: String,
    pub sources: Vec<Source>,
    pub log_count: usize,
    pub result_count: usize,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}
