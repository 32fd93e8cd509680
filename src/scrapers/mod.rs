pub mod alibaba;
pub mod made_in_china;

use std::marker::PhantomData;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use async_trait::async_trait;
use futures::FutureExt;
use serde::de::DeserializeOwned;
use tracing::{info, warn};
use crate::agent::{AgentLogger, AgentStatus, AgentTurnLoop, Extraction, LogCallback, PageDataExtractor, SentinelPhrases};
use crate::browser::{panic_message, with_session, ActionExecutor, PageSession, SessionFactory};
use crate::config::{AgentConfig, BrowserConfig};
use crate::errors::{RetryConfig, ScoutError};
use crate::llm::provider::{DecisionModel, VisionModel};
use crate::models::{ScrapedRecord, Source};

pub use alibaba::Alibaba;
pub use made_in_china::MadeInChina;

/// Searches one marketplace. Never fails: any internal error is logged and
/// reported as an empty result list.
#[async_trait]
pub trait Scraper: Send + Sync {
    fn source(&self) -> Source;

    async fn search(&self, query: &str, max_results: usize, on_log: LogCallback) -> Vec<ScrapedRecord>;
}

/// What distinguishes one marketplace from another.
pub trait SourceProfile: Send + Sync + 'static {
    /// Raw JSON shape the extraction prompt asks for.
    type Payload: DeserializeOwned + Send;

    const SOURCE: Source;
    const AGENT_NAME: &'static str;
    const START_URL: &'static str;

    fn goal(query: &str, max_results: usize) -> String;
    fn extraction_prompt(max_results: usize) -> String;
    fn into_records(payload: Self::Payload) -> Vec<ScrapedRecord>;
}

/// Shared collaborators for every scraper.
#[derive(Clone)]
pub struct ScraperDeps {
    pub sessions: Arc<dyn SessionFactory>,
    pub decision: Arc<dyn DecisionModel>,
    pub vision: Arc<dyn VisionModel>,
    pub browser: BrowserConfig,
    pub agent: AgentConfig,
    pub retry: RetryConfig,
}

/// Turn loop until results are visible, then one extraction pass.
pub struct SourceScraper<P: SourceProfile> {
    deps: ScraperDeps,
    _profile: PhantomData<fn() -> P>,
}

impl<P: SourceProfile> SourceScraper<P> {
    pub fn new(deps: ScraperDeps) -> Self {
        Self { deps, _profile: PhantomData }
    }

    async fn try_search(&self, query: &str, max_results: usize, logger: &AgentLogger) -> Result<Vec<ScrapedRecord>, ScoutError> {
        with_session(self.deps.sessions.as_ref(), |page| async move {
            self.scrape_page(page.as_ref(), query, max_results, logger).await
        })
        .await
    }

    async fn scrape_page(
        &self,
        page: &dyn PageSession,
        query: &str,
        max_results: usize,
        logger: &AgentLogger,
    ) -> Result<Vec<ScrapedRecord>, ScoutError> {
        let turn_loop = AgentTurnLoop::new(
            self.deps.decision.clone(),
            ActionExecutor::from_config(&self.deps.browser),
            logger.clone(),
        )
        .with_max_turns(self.deps.agent.max_turns)
        .with_completion(Arc::new(SentinelPhrases::marketplace()?))
        .with_retry(self.deps.retry.clone());

        let outcome = turn_loop.run(page, P::START_URL, &P::goal(query, max_results)).await?;
        if !outcome.state.is_conclusive() {
            logger.log(
                "Inconclusive navigation",
                AgentStatus::Idle,
                Some(format!("Stopped ({:?}) after {} turns; extracting anyway", outcome.state, outcome.turns)),
            );
        }

        let extractor = PageDataExtractor::new(self.deps.vision.clone(), logger.clone())
            .with_markup(self.deps.browser.capture_markup, self.deps.agent.extraction_markup_chars)
            .with_retry(self.deps.retry.clone());

        let mut records = match extractor.extract::<P::Payload>(page, &P::extraction_prompt(max_results)).await {
            Extraction::Parsed(payload) => P::into_records(payload),
            Extraction::NoData { .. } => Vec::new(),
        };
        records.truncate(max_results);
        Ok(records)
    }
}

#[async_trait]
impl<P: SourceProfile> Scraper for SourceScraper<P> {
    fn source(&self) -> Source {
        P::SOURCE
    }

    async fn search(&self, query: &str, max_results: usize, on_log: LogCallback) -> Vec<ScrapedRecord> {
        let logger = AgentLogger::new(P::AGENT_NAME, on_log);
        let max_results = if max_results == 0 { self.deps.agent.max_results } else { max_results };
        logger.log("Starting search", AgentStatus::Searching, Some(format!("Query: {}", query)));

        let attempt = AssertUnwindSafe(self.try_search(query, max_results, &logger))
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| Err(ScoutError::Internal(format!("panicked: {}", panic_message(payload.as_ref())))));

        match attempt {
            Ok(records) => {
                info!(source = %P::SOURCE, count = records.len(), "Scrape finished");
                logger.log(
                    "Search complete",
                    AgentStatus::Completed,
                    Some(format!("Found {} products", records.len())),
                );
                records
            }
            Err(e) => {
                warn!(source = %P::SOURCE, error = %e, "Scrape failed");
                logger.error("Search failed", &e);
                Vec::new()
            }
        }
    }
}

/// Build both marketplace scrapers over the same collaborators.
pub fn default_scrapers(deps: ScraperDeps) -> Vec<Arc<dyn Scraper>> {
    vec![
        Arc::new(SourceScraper::<Alibaba>::new(deps.clone())),
        Arc::new(SourceScraper::<MadeInChina>::new(deps)),
    ]
}

/// Resolve a listing link against the marketplace origin.
pub(crate) fn absolute_url(origin: &str, raw: Option<String>) -> Option<String> {
    let raw = raw?.trim().to_string();
    if raw.is_empty() {
        None
    } else if raw.starts_with("http://") || raw.starts_with("https://") {
        Some(raw)
    } else if let Some(rest) = raw.strip_prefix("//") {
        Some(format!("https://{}", rest))
    } else if raw.starts_with('/') {
        Some(format!("{}{}", origin.trim_end_matches('/'), raw))
    } else {
        Some(format!("https://{}", raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use serde_json::json;
    use crate::agent::AgentLogEntry;
    use crate::llm::types::{Decision, FunctionCall};
    use crate::testing::{FakeSessionFactory, FakeVision, ScriptedDecision};

    fn deps(sessions: FakeSessionFactory, decision: ScriptedDecision, vision: FakeVision) -> ScraperDeps {
        let browser = BrowserConfig { settle_timeout_ms: 0, settle_pause_ms: 0, ..BrowserConfig::default() };
        ScraperDeps {
            sessions: Arc::new(sessions),
            decision: Arc::new(decision),
            vision: Arc::new(vision),
            browser,
            agent: AgentConfig { max_turns: 3, ..AgentConfig::default() },
            retry: RetryConfig::none(),
        }
    }

    fn collector() -> (LogCallback, Arc<Mutex<Vec<AgentLogEntry>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        (Arc::new(move |e| sink.lock().unwrap().push(e)), seen)
    }

    fn alibaba_payload(n: usize) -> String {
        let products: Vec<_> = (0..n)
            .map(|i| json!({"supplierName": format!("Supplier {}", i), "productName": "M8 bolt", "price": "US$0.05"}))
            .collect();
        json!({ "products": products }).to_string()
    }

    #[tokio::test]
    async fn test_search_extracts_and_truncates() {
        let closes = Arc::new(AtomicUsize::new(0));
        let scraper = SourceScraper::<Alibaba>::new(deps(
            FakeSessionFactory::new(closes.clone()),
            ScriptedDecision::always(Decision::text("Search results are visible")),
            FakeVision::replying(&alibaba_payload(5)),
        ));
        let (on_log, seen) = collector();

        let records = scraper.search("M8 bolt", 3, on_log).await;
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.currency == "USD"));
        assert_eq!(closes.load(Ordering::SeqCst), 1);
        assert!(seen.lock().unwrap().iter().all(|e| e.agent_name == Alibaba::AGENT_NAME));
    }

    #[tokio::test]
    async fn test_failure_is_absorbed_and_logged() {
        let closes = Arc::new(AtomicUsize::new(0));
        let scraper = SourceScraper::<MadeInChina>::new(deps(
            FakeSessionFactory::new(closes.clone()),
            ScriptedDecision::failing("decision step down"),
            FakeVision::replying("{}"),
        ));
        let (on_log, seen) = collector();

        let records = scraper.search("M8 bolt", 5, on_log).await;
        assert!(records.is_empty());
        assert_eq!(closes.load(Ordering::SeqCst), 1);
        let entries = seen.lock().unwrap();
        let failure = entries.iter().find(|e| e.action == "Search failed").unwrap();
        assert_eq!(failure.status, AgentStatus::Error);
        assert_eq!(failure.agent_name, MadeInChina::AGENT_NAME);
    }

    #[tokio::test]
    async fn test_panic_in_loop_is_absorbed_and_session_closed() {
        let closes = Arc::new(AtomicUsize::new(0));
        let scraper = SourceScraper::<Alibaba>::new(deps(
            FakeSessionFactory::new(closes.clone()),
            ScriptedDecision::panicking("decision client invariant broken"),
            FakeVision::replying(&alibaba_payload(2)),
        ));
        let (on_log, seen) = collector();

        let records = scraper.search("M8 bolt", 5, on_log).await;
        assert!(records.is_empty());
        assert_eq!(closes.load(Ordering::SeqCst), 1);
        let entries = seen.lock().unwrap();
        let failure = entries.iter().find(|e| e.action == "Search failed").unwrap();
        assert_eq!(failure.status, AgentStatus::Error);
        assert_eq!(failure.agent_name, Alibaba::AGENT_NAME);
        assert!(failure.details.as_deref().unwrap().contains("decision client invariant broken"));
    }

    #[tokio::test]
    async fn test_launch_failure_returns_empty() {
        let scraper = SourceScraper::<Alibaba>::new(deps(
            FakeSessionFactory::new(Arc::new(AtomicUsize::new(0))).failing_to_open(),
            ScriptedDecision::always(Decision::text("done")),
            FakeVision::replying(&alibaba_payload(1)),
        ));
        let (on_log, _) = collector();
        assert!(scraper.search("bolt", 5, on_log).await.is_empty());
    }

    #[tokio::test]
    async fn test_bare_array_extraction_yields_records() {
        let reply = format!("```json\n{}\n```", json!([
            {"supplierName": "Ningbo Fasteners Co.", "productName": "M8 bolt"}
        ]));
        let scraper = SourceScraper::<Alibaba>::new(deps(
            FakeSessionFactory::new(Arc::new(AtomicUsize::new(0))),
            ScriptedDecision::always(Decision::text("results visible")),
            FakeVision::replying(&reply),
        ));
        let (on_log, _) = collector();
        assert_eq!(scraper.search("bolt", 5, on_log).await.len(), 1);
    }

    #[tokio::test]
    async fn test_malformed_extraction_is_zero_records() {
        let scraper = SourceScraper::<Alibaba>::new(deps(
            FakeSessionFactory::new(Arc::new(AtomicUsize::new(0))),
            ScriptedDecision::always(Decision::text("results visible")),
            FakeVision::replying("Sorry, I cannot read this page."),
        ));
        let (on_log, seen) = collector();

        let records = scraper.search("bolt", 5, on_log).await;
        assert!(records.is_empty());
        let entries = seen.lock().unwrap();
        assert!(entries.iter().any(|e| e.action == "Extraction failed"));
        assert!(entries.iter().any(|e| e.action == "Search complete"));
    }

    #[tokio::test]
    async fn test_inconclusive_loop_still_extracts() {
        let scroll = Decision::with_calls("", vec![FunctionCall::new("scroll_document", json!({"direction": "down"}))]);
        let scraper = SourceScraper::<Alibaba>::new(deps(
            FakeSessionFactory::new(Arc::new(AtomicUsize::new(0))),
            ScriptedDecision::always(scroll),
            FakeVision::replying(&alibaba_payload(2)),
        ));
        let (on_log, seen) = collector();

        let records = scraper.search("bolt", 10, on_log).await;
        assert_eq!(records.len(), 2);
        assert!(seen.lock().unwrap().iter().any(|e| e.action == "Inconclusive navigation"));
    }

    #[test]
    fn test_absolute_url() {
        let origin = "https://www.alibaba.com";
        assert_eq!(absolute_url(origin, Some("//www.alibaba.com/p/1".into())).as_deref(), Some("https://www.alibaba.com/p/1"));
        assert_eq!(absolute_url(origin, Some("/p/2".into())).as_deref(), Some("https://www.alibaba.com/p/2"));
        assert_eq!(absolute_url(origin, Some("https://x.test".into())).as_deref(), Some("https://x.test"));
        assert_eq!(absolute_url(origin, Some("  ".into())), None);
        assert_eq!(absolute_url(origin, None), None);
    }
}
