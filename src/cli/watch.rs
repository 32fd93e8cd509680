use std::time::Duration;
use tracing::info;
use crate::cli::commands::WatchArgs;
use crate::cli::search::{print_entry, print_records};
use crate::errors::ScoutError;
use crate::jobs::{JobClient, JobStatus};

pub async fn handle_watch(args: WatchArgs) -> Result<(), ScoutError> {
    info!(job_id = %args.job_id, server = %args.server, "Watching job");

    let client = JobClient::new(&args.server, args.api_token.clone());
    let interval = Duration::from_secs(args.interval.max(1));
    let view = client.follow(&args.job_id, interval, print_entry).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        println!();
        println!("Job {} finished: {:?}, {} records", args.job_id, view.status, view.results.len());
        print_records(&view.results);
    }

    if view.status == JobStatus::Error {
        return Err(ScoutError::Internal(format!("job {} ended in error", args.job_id)));
    }
    Ok(())
}
