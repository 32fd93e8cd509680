use std::collections::HashSet;
use std::time::Duration;
use reqwest::StatusCode;
use tracing::debug;
use crate::agent::AgentLogEntry;
use crate::errors::ScoutError;
use super::state::JobStatusView;

/// Remembers which log entries a poller has already shown, by entry id.
#[derive(Debug, Default)]
pub struct LogCursor {
    seen: HashSet<String>,
}

impl LogCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries not returned by an earlier call, in log order.
    pub fn fresh<'a>(&mut self, logs: &'a [AgentLogEntry]) -> Vec<&'a AgentLogEntry> {
        logs.iter().filter(|entry| self.seen.insert(entry.id.clone())).collect()
    }

    pub fn seen(&self) -> usize {
        self.seen.len()
    }
}

/// Polls a running `scout serve` instance for one job's progress.
pub struct JobClient {
    http: reqwest::Client,
    base_url: String,
    api_token: Option<String>,
}

impl JobClient {
    pub fn new(base_url: &str, api_token: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token,
        }
    }

    pub async fn status(&self, job_id: &str) -> Result<JobStatusView, ScoutError> {
        let url = format!("{}/api/jobs/{}/status", self.base_url, job_id);
        let mut request = self.http.get(&url);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let resp = request
            .send()
            .await
            .map_err(|e| ScoutError::Network(format!("Failed to query job: {}", e)))?;

        match resp.status() {
            StatusCode::NOT_FOUND => return Err(ScoutError::JobNotFound(job_id.to_string())),
            StatusCode::UNAUTHORIZED => return Err(ScoutError::Authentication("API token rejected".into())),
            status if !status.is_success() => {
                let body = resp.text().await.unwrap_or_default();
                return Err(ScoutError::Network(format!("Server returned {}: {}", status, body)));
            }
            _ => {}
        }

        resp.json()
            .await
            .map_err(|e| ScoutError::Network(format!("Invalid status response: {}", e)))
    }

    /// Poll every `interval` until the job is terminal, handing each unseen
    /// log entry to `on_entry` exactly once.
    pub async fn follow<F>(&self, job_id: &str, interval: Duration, mut on_entry: F) -> Result<JobStatusView, ScoutError>
    where
        F: FnMut(&AgentLogEntry),
    {
        let mut cursor = LogCursor::new();
        loop {
            let view = self.status(job_id).await?;
            for entry in cursor.fresh(&view.logs) {
                on_entry(entry);
            }
            if view.status.is_terminal() {
                return Ok(view);
            }
            debug!(job_id, seen = cursor.seen(), "Job still running");
            tokio::time::sleep(interval).await;
        }
    }
}
