use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ScoutConfig {
    #[serde(default)]
    pub llm: LLMConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub jobs: JobsConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LLMConfig {
    pub provider: String,
    pub model: String,
    pub extraction_provider: Option<String>,
    pub extraction_model: Option<String>,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub max_retries: u32,
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            provider: "gemini".to_string(),
            model: "gemini-2.5-computer-use-preview-10-2025".to_string(),
            extraction_provider: None,
            extraction_model: None,
            api_key: None,
            base_url: None,
            max_retries: 2,
        }
    }
}

impl LLMConfig {
    /// Provider used for the one-shot page extraction; falls back to the decision provider.
    pub fn extraction_provider(&self) -> &str {
        self.extraction_provider.as_deref().unwrap_or(&self.provider)
    }
}

/// Virtual screen and driver settings shared by every browser session of a run.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub screen_width: u32,
    pub screen_height: u32,
    pub headless: bool,
    pub navigation_timeout_ms: u64,
    pub settle_timeout_ms: u64,
    pub settle_pause_ms: u64,
    pub node_binary: String,
    pub capture_markup: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            screen_width: 1440,
            screen_height: 900,
            headless: true,
            navigation_timeout_ms: 30_000,
            settle_timeout_ms: 5_000,
            settle_pause_ms: 500,
            node_binary: "node".to_string(),
            capture_markup: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AgentConfig {
    pub max_turns: usize,
    pub max_results: usize,
    pub extraction_markup_chars: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_turns: 20,
            max_results: 10,
            extraction_markup_chars: 20_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct JobsConfig {
    pub ttl_secs: u64,
    pub sweep_interval_secs: u64,
    pub max_jobs: usize,
}

impl JobsConfig {
    /// Longest accepted `ttl_secs` and `sweep_interval_secs`: 30 days.
    pub const MAX_SECS: u64 = 30 * 24 * 60 * 60;
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 3600,
            sweep_interval_secs: 60,
            max_jobs: 1000,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub api_token: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            api_token: None,
        }
    }
}
