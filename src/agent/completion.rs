use regex::Regex;
use crate::errors::ScoutError;
use crate::llm::types::Decision;

/// Extra termination check applied after a turn's actions have run.
///
/// The turn loop always stops when a response carries no actions; this hook
/// lets a caller stop earlier on its own signal.
pub trait CompletionSignal: Send + Sync {
    fn is_done(&self, decision: &Decision) -> bool;
}

/// Stop only on an action-free response.
pub struct NoActionsOnly;

impl CompletionSignal for NoActionsOnly {
    fn is_done(&self, _decision: &Decision) -> bool {
        false
    }
}

/// Best-effort early exit: stop when the model's commentary mentions any of the
/// phrases as whole words, case-insensitively. Can fire on incidental wording.
pub struct SentinelPhrases {
    pattern: Regex,
}

impl SentinelPhrases {
    pub const MARKETPLACE: [&'static str; 3] = ["done", "visible", "results"];

    pub fn new(phrases: &[&str]) -> Result<Self, ScoutError> {
        if phrases.is_empty() {
            return Err(ScoutError::Config("sentinel phrase list is empty".into()));
        }
        let alternatives: Vec<String> = phrases.iter().map(|p| regex::escape(p)).collect();
        let pattern = Regex::new(&format!(r"(?i)\b(?:{})\b", alternatives.join("|")))
            .map_err(|e| ScoutError::Config(format!("invalid sentinel phrases: {}", e)))?;
        Ok(Self { pattern })
    }

    pub fn marketplace() -> Result<Self, ScoutError> {
        Self::new(&Self::MARKETPLACE)
    }
}

impl CompletionSignal for SentinelPhrases {
    fn is_done(&self, decision: &Decision) -> bool {
        self.pattern.is_match(&decision.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_actions_only_never_fires() {
        assert!(!NoActionsOnly.is_done(&Decision::text("done")));
    }

    #[test]
    fn test_sentinel_whole_word_case_insensitive() {
        let signal = SentinelPhrases::marketplace().unwrap();
        assert!(signal.is_done(&Decision::text("The product listings are now VISIBLE.")));
        assert!(signal.is_done(&Decision::text("Search results loaded")));
        assert!(signal.is_done(&Decision::text("Done")));
        assert!(!signal.is_done(&Decision::text("Typing the query into the search box")));
        assert!(!signal.is_done(&Decision::text("abandoned cart")));
    }

    #[test]
    fn test_multi_word_phrase() {
        let signal = SentinelPhrases::new(&["task complete"]).unwrap();
        assert!(signal.is_done(&Decision::text("Task complete, listings shown")));
        assert!(!signal.is_done(&Decision::text("task is complete")));
    }

    #[test]
    fn test_empty_phrases_rejected() {
        assert!(SentinelPhrases::new(&[]).is_err());
    }
}
