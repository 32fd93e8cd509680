use std::sync::Arc;
use base64::prelude::*;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::utils::truncation::truncate_error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    Idle,
    Searching,
    Analyzing,
    Completed,
    Error,
}

/// One immutable progress entry. `id` is unique and stable so pollers can
/// de-duplicate by identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentLogEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub agent_name: String,
    pub action: String,
    pub status: AgentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Base64 PNG
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<String>,
}

impl AgentLogEntry {
    pub fn new(agent_name: &str, action: &str, status: AgentStatus, details: Option<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            agent_name: agent_name.to_string(),
            action: action.to_string(),
            status,
            details,
            screenshot: None,
        }
    }

    pub fn with_screenshot(mut self, png: &[u8]) -> Self {
        self.screenshot = Some(BASE64_STANDARD.encode(png));
        self
    }
}

/// Callback threaded through every nested agent; the only channel by which
/// progress reaches the job record.
pub type LogCallback = Arc<dyn Fn(AgentLogEntry) + Send + Sync>;

/// Emits entries for one named agent and mirrors them to tracing.
#[derive(Clone)]
pub struct AgentLogger {
    agent_name: String,
    callback: LogCallback,
}

impl AgentLogger {
    pub fn new(agent_name: &str, callback: LogCallback) -> Self {
        Self { agent_name: agent_name.to_string(), callback }
    }

    pub fn agent_name(&self) -> &str {
        &self.agent_name
    }

    pub fn emit(&self, entry: AgentLogEntry) {
        tracing::debug!(
            agent = %entry.agent_name,
            action = %entry.action,
            status = ?entry.status,
            details = entry.details.as_deref().unwrap_or(""),
            "Agent log"
        );
        (self.callback)(entry);
    }

    pub fn log(&self, action: &str, status: AgentStatus, details: Option<String>) {
        self.emit(AgentLogEntry::new(&self.agent_name, action, status, details));
    }

    pub fn log_with_screenshot(&self, action: &str, status: AgentStatus, details: Option<String>, png: Option<&[u8]>) {
        let mut entry = AgentLogEntry::new(&self.agent_name, action, status, details);
        if let Some(png) = png {
            entry = entry.with_screenshot(png);
        }
        self.emit(entry);
    }

    pub fn error(&self, action: &str, error: &dyn std::fmt::Display) {
        self.log(action, AgentStatus::Error, Some(truncate_error(&error.to_string())));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_entry_serializes_camel_case() {
        let entry = AgentLogEntry::new("Alibaba Agent", "Searching", AgentStatus::Searching, None);
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["agentName"], "Alibaba Agent");
        assert_eq!(json["status"], "searching");
        assert!(json.get("details").is_none());
        assert!(json.get("screenshot").is_none());
    }

    #[test]
    fn test_ids_are_unique() {
        let a = AgentLogEntry::new("a", "x", AgentStatus::Idle, None);
        let b = AgentLogEntry::new("a", "x", AgentStatus::Idle, None);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_logger_forwards_to_callback() {
        let seen: Arc<Mutex<Vec<AgentLogEntry>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let logger = AgentLogger::new("Made-in-China Agent", Arc::new(move |e| sink.lock().unwrap().push(e)));

        logger.log("Turn 1", AgentStatus::Analyzing, Some("thinking".into()));
        logger.error("Scrape failed", &"driver crashed");
        logger.log_with_screenshot("Page loaded", AgentStatus::Searching, None, Some(&[1, 2, 3]));

        let entries = seen.lock().unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].agent_name, "Made-in-China Agent");
        assert_eq!(entries[1].status, AgentStatus::Error);
        assert_eq!(entries[1].details.as_deref(), Some("driver crashed"));
        assert_eq!(entries[2].screenshot.as_deref(), Some("AQID"));
    }
}
