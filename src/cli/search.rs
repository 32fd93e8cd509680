use std::time::Duration;
use tracing::info;
use crate::agent::AgentLogEntry;
use crate::cli::commands::SearchArgs;
use crate::cli::runtime::{build_orchestrator, load_config};
use crate::errors::ScoutError;
use crate::jobs::{JobStatus, LogCursor, ScrapeJob};
use crate::models::{ScrapedRecord, Source};

const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Run one job in this process, following it the way a polling client would.
pub async fn handle_search(args: SearchArgs) -> Result<(), ScoutError> {
    let mut config = load_config(&args.runtime).await?;
    if let Some(max) = args.max_results {
        config.agent.max_results = max.max(1);
    }
    let sources = Source::parse_list(&args.sources)?;

    let orchestrator = build_orchestrator(&config, args.runtime.api_key.as_deref())?;
    let job_id = orchestrator.start_job(&args.query, sources)?;
    info!(job_id = %job_id, "Search started");

    let mut cursor = LogCursor::new();
    let job = loop {
        let job = orchestrator
            .store()
            .snapshot(&job_id)
            .ok_or_else(|| ScoutError::JobNotFound(job_id.clone()))?;
        for entry in cursor.fresh(&job.logs) {
            print_entry(entry);
        }
        if job.status.is_terminal() {
            break job;
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&job)?);
    } else {
        print_results(&job);
    }

    if job.status == JobStatus::Error {
        let reason = job.logs.last().and_then(|e| e.details.clone()).unwrap_or_default();
        return Err(ScoutError::Internal(format!("search failed: {}", reason)));
    }
    Ok(())
}

pub(crate) fn print_entry(entry: &AgentLogEntry) {
    let status = serde_json::to_value(entry.status)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default();
    match &entry.details {
        Some(details) => println!(
            "[{}] {:<20} {:<10} {} - {}",
            entry.timestamp.format("%H:%M:%S"), entry.agent_name, status, entry.action, details
        ),
        None => println!(
            "[{}] {:<20} {:<10} {}",
            entry.timestamp.format("%H:%M:%S"), entry.agent_name, status, entry.action
        ),
    }
}

pub(crate) fn print_records(records: &[ScrapedRecord]) {
    if records.is_empty() {
        println!("No matching products found.");
        return;
    }
    for (i, r) in records.iter().enumerate() {
        let price = r.price.map(|p| format!("{} {:.2}", r.currency, p)).unwrap_or_else(|| "-".into());
        println!("{:>3}. {} | {} | {}", i + 1, r.supplier_name, r.product_name, price);
        if let Some(moq) = &r.moq {
            println!("     MOQ: {}", moq);
        }
        if let Some(url) = &r.product_url {
            println!("     {}", url);
        }
    }
}

fn print_results(job: &ScrapeJob) {
    println!();
    println!("Job {} finished: {:?}, {} records", job.id, job.status, job.results.len());
    print_records(&job.results);
}
