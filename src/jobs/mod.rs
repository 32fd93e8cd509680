pub mod client;
pub mod orchestrator;
pub mod state;
pub mod store;

pub use client::{JobClient, LogCursor};
pub use orchestrator::JobOrchestrator;
pub use state::{JobStatus, JobStatusView, JobSummary, ScrapeJob};
pub use store::JobStore;
