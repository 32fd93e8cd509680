use std::sync::Arc;
use serde::de::DeserializeOwned;
use serde_json::Value;
use crate::browser::PageSession;
use crate::errors::{with_retry, RetryConfig, ScoutError};
use crate::llm::provider::VisionModel;
use crate::utils::truncation::truncate_head;
use super::log::{AgentLogger, AgentStatus};

const DEFAULT_MARKUP_CHARS: usize = 20_000;

/// Result of one extraction. Failures never escape as errors.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction<T> {
    Parsed(T),
    NoData { reason: String },
}

impl<T> Extraction<T> {
    pub fn into_option(self) -> Option<T> {
        match self {
            Extraction::Parsed(value) => Some(value),
            Extraction::NoData { .. } => None,
        }
    }
}

/// Reads structured data off the current page with a single vision call.
pub struct PageDataExtractor {
    vision: Arc<dyn VisionModel>,
    logger: AgentLogger,
    retry: RetryConfig,
    capture_markup: bool,
    markup_chars: usize,
}

impl PageDataExtractor {
    pub fn new(vision: Arc<dyn VisionModel>, logger: AgentLogger) -> Self {
        Self {
            vision,
            logger,
            retry: RetryConfig::default(),
            capture_markup: true,
            markup_chars: DEFAULT_MARKUP_CHARS,
        }
    }

    /// Include up to `chars` of page markup alongside the screenshot.
    pub fn with_markup(mut self, capture: bool, chars: usize) -> Self {
        self.capture_markup = capture;
        self.markup_chars = chars;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub async fn extract<T: DeserializeOwned>(&self, page: &dyn PageSession, instruction: &str) -> Extraction<T> {
        self.logger.log("Extracting page data", AgentStatus::Analyzing, None);
        match self.try_extract(page, instruction).await {
            Ok(value) => {
                self.logger.log("Extraction complete", AgentStatus::Analyzing, None);
                Extraction::Parsed(value)
            }
            Err(e) => {
                self.logger.error("Extraction failed", &e);
                Extraction::NoData { reason: e.to_string() }
            }
        }
    }

    async fn try_extract<T: DeserializeOwned>(&self, page: &dyn PageSession, instruction: &str) -> Result<T, ScoutError> {
        let screenshot = page.screenshot().await?;
        let url = page.current_url().await.unwrap_or_default();
        let markup = if self.capture_markup {
            page.content().await.ok().map(|html| truncate_head(&html, self.markup_chars))
        } else {
            None
        };

        let prompt = build_prompt(instruction, &url, markup.as_deref());
        let vision = &self.vision;
        let (prompt_ref, png) = (prompt.as_str(), screenshot.as_slice());
        let response = with_retry("extract", &self.retry, move || vision.describe(prompt_ref, png)).await?;

        let value = extract_json(&response.content)?;
        serde_json::from_value(value)
            .map_err(|e| ScoutError::MalformedResponse(format!("extraction did not match expected shape: {}", e)))
    }
}

fn build_prompt(instruction: &str, url: &str, markup: Option<&str>) -> String {
    let mut prompt = format!(
        "{}\n\nCurrent page: {}\n\nRespond with valid JSON only, no other text.",
        instruction.trim(),
        url
    );
    if let Some(html) = markup {
        prompt.push_str("\n\nPage markup (may be truncated):\n");
        prompt.push_str(html);
    }
    prompt
}

/// Pull a JSON value out of free-form model text.
pub fn extract_json(text: &str) -> Result<Value, ScoutError> {
    if let Ok(v) = serde_json::from_str::<Value>(text.trim()) {
        return Ok(v);
    }

    let stripped = text
        .trim()
        .strip_prefix("```json")
        .or_else(|| text.trim().strip_prefix("```"))
        .and_then(|s| s.trim_end().strip_suffix("```"))
        .unwrap_or(text);
    if let Ok(v) = serde_json::from_str::<Value>(stripped.trim()) {
        return Ok(v);
    }

    for (open, close) in [('{', '}'), ('[', ']')] {
        if let (Some(start), Some(end)) = (stripped.find(open), stripped.rfind(close)) {
            if start < end {
                if let Ok(v) = serde_json::from_str::<Value>(&stripped[start..=end]) {
                    return Ok(v);
                }
            }
        }
    }
    Err(ScoutError::MalformedResponse("no valid JSON found in model response".into()))
}
