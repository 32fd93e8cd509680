use std::collections::HashSet;
use serde_json::{json, Value};
use crate::llm::types::Decision;

/// Page state captured after an action (or at the start of a run).
#[derive(Debug, Clone, Default)]
pub struct Observation {
    pub url: String,
    pub screenshot: Option<Vec<u8>>,
}

/// The structured result fed back to the decision model for one proposed call.
#[derive(Debug, Clone)]
pub struct FunctionResponse {
    pub name: String,
    pub url: String,
    pub error: Option<String>,
    pub screenshot: Option<Vec<u8>>,
}

impl FunctionResponse {
    pub fn new(name: &str, observation: Observation, error: Option<String>) -> Self {
        Self {
            name: name.to_string(),
            url: observation.url,
            error,
            screenshot: observation.screenshot,
        }
    }

    /// JSON body of the response, without the screenshot.
    pub fn payload(&self) -> Value {
        let mut body = json!({ "url": self.url });
        if let Some(error) = &self.error {
            body["error"] = Value::String(error.clone());
        }
        body
    }
}

#[derive(Debug, Clone)]
pub enum ContextEntry {
    /// Initial request: the goal text and the starting page.
    Request { text: String, screenshot: Option<Vec<u8>> },
    /// A decision returned by the model.
    Response(Decision),
    /// Results of executing (or refusing) the calls of the previous response.
    FunctionResults(Vec<FunctionResponse>),
}

impl ContextEntry {
    fn has_screenshot(&self) -> bool {
        match self {
            ContextEntry::Request { screenshot, .. } => screenshot.is_some(),
            ContextEntry::Response(_) => false,
            ContextEntry::FunctionResults(results) => results.iter().any(|r| r.screenshot.is_some()),
        }
    }
}

/// Conversation history threaded across turns. Append-only.
#[derive(Debug, Clone, Default)]
pub struct TurnContext {
    entries: Vec<ContextEntry>,
}

impl TurnContext {
    pub fn seed(goal: &str, initial: Observation) -> Self {
        Self {
            entries: vec![ContextEntry::Request {
                text: goal.to_string(),
                screenshot: initial.screenshot,
            }],
        }
    }

    pub fn push_decision(&mut self, decision: Decision) {
        self.entries.push(ContextEntry::Response(decision));
    }

    pub fn push_results(&mut self, results: Vec<FunctionResponse>) {
        self.entries.push(ContextEntry::FunctionResults(results));
    }

    pub fn entries(&self) -> &[ContextEntry] {
        &self.entries
    }

    /// Number of decision round-trips recorded so far.
    pub fn decisions(&self) -> usize {
        self.entries.iter().filter(|e| matches!(e, ContextEntry::Response(_))).count()
    }

    /// Indices of the most recent `keep` entries that carry screenshots.
    pub fn screenshot_window(&self, keep: usize) -> HashSet<usize> {
        self.entries
            .iter()
            .enumerate()
            .rev()
            .filter(|(_, e)| e.has_screenshot())
            .take(keep)
            .map(|(i, _)| i)
            .collect()
    }

    /// Free text of every response so far, in order.
    pub fn commentary(&self) -> String {
        self.entries
            .iter()
            .filter_map(|e| match e {
                ContextEntry::Response(d) if !d.text.trim().is_empty() => Some(d.text.trim()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::types::FunctionCall;

    fn shot() -> Observation {
        Observation { url: "https://example.com".into(), screenshot: Some(vec![1, 2, 3]) }
    }

    #[test]
    fn test_seed_and_growth() {
        let mut ctx = TurnContext::seed("find bolts", shot());
        assert_eq!(ctx.entries().len(), 1);
        assert_eq!(ctx.decisions(), 0);

        ctx.push_decision(Decision::with_calls("clicking", vec![FunctionCall::new("click_at", json!({"x": 1, "y": 2}))]));
        ctx.push_results(vec![FunctionResponse::new("click_at", shot(), None)]);
        assert_eq!(ctx.entries().len(), 3);
        assert_eq!(ctx.decisions(), 1);
    }

    #[test]
    fn test_screenshot_window_keeps_latest() {
        let mut ctx = TurnContext::seed("goal", shot());
        for _ in 0..4 {
            ctx.push_decision(Decision::text("step"));
            ctx.push_results(vec![FunctionResponse::new("wait_5_seconds", shot(), None)]);
        }
        let window = ctx.screenshot_window(2);
        assert_eq!(window.len(), 2);
        assert!(window.contains(&8));
        assert!(window.contains(&6));
        assert!(!window.contains(&0));
    }

    #[test]
    fn test_payload_includes_error() {
        let resp = FunctionResponse::new("click_at", shot(), Some("boom".into()));
        let body = resp.payload();
        assert_eq!(body["url"], "https://example.com");
        assert_eq!(body["error"], "boom");

        let ok = FunctionResponse::new("click_at", shot(), None);
        assert!(ok.payload().get("error").is_none());
    }

    #[test]
    fn test_commentary_joins_text() {
        let mut ctx = TurnContext::seed("goal", Observation::default());
        ctx.push_decision(Decision::text("searching"));
        ctx.push_decision(Decision::text("  "));
        ctx.push_decision(Decision::text("results visible"));
        assert_eq!(ctx.commentary(), "searching\nresults visible");
    }
}
