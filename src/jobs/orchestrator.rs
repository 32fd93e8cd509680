use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use futures::future::join_all;
use futures::FutureExt;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use crate::agent::{AgentLogEntry, AgentStatus, LogCallback};
use crate::errors::ScoutError;
use crate::models::{ScrapedRecord, Source};
use crate::scrapers::Scraper;
use super::store::JobStore;

pub const ORCHESTRATOR_AGENT: &str = "Orchestrator";

/// Starts jobs and drives each to a terminal state in the background.
#[derive(Clone)]
pub struct JobOrchestrator {
    store: JobStore,
    scrapers: Arc<HashMap<Source, Arc<dyn Scraper>>>,
    max_results: usize,
}

impl JobOrchestrator {
    pub fn new(store: JobStore, scrapers: Vec<Arc<dyn Scraper>>, max_results: usize) -> Self {
        let scrapers = scrapers.into_iter().map(|s| (s.source(), s)).collect();
        Self { store, scrapers: Arc::new(scrapers), max_results }
    }

    pub fn store(&self) -> &JobStore {
        &self.store
    }

    /// Register a job and return its id without waiting for any scraping.
    pub fn start_job(&self, query: &str, sources: Vec<Source>) -> Result<String, ScoutError> {
        if sources.is_empty() {
            return Err(ScoutError::InvalidRequest("at least one source is required".into()));
        }
        let (id, cancel) = self.store.create(query, sources.clone())?;
        info!(job_id = %id, query, ?sources, "Job started");

        let work = run_job(
            self.store.log_callback(&id),
            self.scrapers.clone(),
            query.to_string(),
            sources,
            self.max_results,
        );
        tokio::spawn(supervise(self.store.clone(), id.clone(), cancel, work));
        Ok(id)
    }
}

/// Run the work as its own task so a panic or cancellation still lands the
/// job in a terminal state.
async fn supervise<F>(store: JobStore, id: String, cancel: CancellationToken, work: F)
where
    F: std::future::Future<Output = Result<Vec<ScrapedRecord>, ScoutError>> + Send + 'static,
{
    let mut task = tokio::spawn(work);
    tokio::select! {
        joined = &mut task => match joined {
            Ok(Ok(results)) => {
                let summary = AgentLogEntry::new(
                    ORCHESTRATOR_AGENT,
                    "Search complete",
                    AgentStatus::Completed,
                    Some(format!("Found {} products", results.len())),
                );
                info!(job_id = %id, results = results.len(), "Job completed");
                store.complete(&id, results, summary);
            }
            Ok(Err(e)) => {
                error!(job_id = %id, error = %e, "Job failed");
                store.fail(&id, AgentLogEntry::new(ORCHESTRATOR_AGENT, "Search failed", AgentStatus::Error, Some(e.to_string())));
            }
            Err(join_error) => {
                error!(job_id = %id, error = %join_error, "Job task crashed");
                store.fail(&id, AgentLogEntry::new(ORCHESTRATOR_AGENT, "Search failed", AgentStatus::Error, Some(join_error.to_string())));
            }
        },
        _ = cancel.cancelled() => {
            task.abort();
            warn!(job_id = %id, "Job cancelled");
            store.fail(&id, AgentLogEntry::new(
                ORCHESTRATOR_AGENT,
                "Search cancelled",
                AgentStatus::Error,
                Some("cancelled by request".into()),
            ));
        }
    }
}

async fn run_job(
    on_log: LogCallback,
    scrapers: Arc<HashMap<Source, Arc<dyn Scraper>>>,
    query: String,
    sources: Vec<Source>,
    max_results: usize,
) -> Result<Vec<ScrapedRecord>, ScoutError> {
    let selected = sources
        .iter()
        .map(|source| {
            scrapers
                .get(source)
                .cloned()
                .ok_or_else(|| ScoutError::Internal(format!("no scraper registered for {}", source)))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let names: Vec<&str> = sources.iter().map(Source::as_str).collect();
    on_log(AgentLogEntry::new(
        ORCHESTRATOR_AGENT,
        "Starting search",
        AgentStatus::Searching,
        Some(format!("Searching {} for \"{}\"", names.join(", "), query)),
    ));

    let searches = selected.iter().map(|scraper| {
        AssertUnwindSafe(scraper.search(&query, max_results, on_log.clone())).catch_unwind()
    });
    let outcomes = join_all(searches).await;

    let mut results = Vec::new();
    for (source, outcome) in sources.iter().zip(outcomes) {
        match outcome {
            Ok(records) => results.extend(records),
            Err(_) => {
                error!(%source, "Scraper panicked");
                on_log(AgentLogEntry::new(
                    ORCHESTRATOR_AGENT,
                    "Scraper crashed",
                    AgentStatus::Error,
                    Some(format!("{} scraper stopped unexpectedly", source)),
                ));
            }
        }
    }
    Ok(results)
}
