use serde::{Deserialize, Serialize};
use crate::models::Source;

/// Body of `POST /api/live-search`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveSearchRequest {
    pub session_ref: String,
    #[serde(default)]
    pub search_query: Option<String>,
    #[serde(default)]
    pub sources: Vec<String>,
}

impl LiveSearchRequest {
    /// The search text; the session reference stands in when no query is given.
    pub fn query(&self) -> String {
        self.search_query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .unwrap_or_else(|| self.session_ref.trim())
            .to_string()
    }

    /// Source names as the client sent them, trimmed, one per distinct source.
    /// Unknown names are skipped; `Source::parse_list` rejects them first.
    pub fn requested_sources(&self) -> Vec<String> {
        let mut seen: Vec<Source> = Vec::new();
        let mut names = Vec::new();
        for raw in &self.sources {
            if let Ok(source) = raw.parse::<Source>() {
                if !seen.contains(&source) {
                    seen.push(source);
                    names.push(raw.trim().to_string());
                }
            }
        }
        names
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveSearchResponse {
    pub job_id: String,
    pub message: String,
    pub query: String,
    /// Echoes the names used in the request, aliases included.
    pub sources: Vec<String>,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
