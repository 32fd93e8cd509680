use std::path::Path;
use crate::errors::ScoutError;
use super::types::{JobsConfig, ScoutConfig};
use super::schema::CONFIG_SCHEMA;
use tracing::warn;

pub async fn parse_config(path: &Path) -> Result<ScoutConfig, ScoutError> {
    if !path.exists() {
        return Err(ScoutError::Config(format!("Config file not found: {}", path.display())));
    }

    let metadata = tokio::fs::metadata(path).await?;
    if metadata.len() > 1_048_576 {
        return Err(ScoutError::Config("Config file exceeds 1MB limit".into()));
    }

    let content = tokio::fs::read_to_string(path).await?;
    parse_config_str(&content)
}

/// Parse, schema-check and validate YAML config text.
pub fn parse_config_str(content: &str) -> Result<ScoutConfig, ScoutError> {
    // An empty file is a valid all-defaults config
    if content.trim().is_empty() {
        return Ok(ScoutConfig::default());
    }

    let yaml: serde_yaml::Value = serde_yaml::from_str(content)?;

    validate_schema(&yaml)?;

    let config: ScoutConfig = serde_yaml::from_value(yaml)?;

    validate_semantics(&config)?;

    Ok(config)
}

/// Load the config file when one is given, otherwise fall back to defaults.
pub async fn load_or_default(path: Option<&Path>) -> Result<ScoutConfig, ScoutError> {
    match path {
        Some(p) => parse_config(p).await,
        None => Ok(ScoutConfig::default()),
    }
}

/// Validate config against the JSON schema for structural correctness.
fn validate_schema(yaml: &serde_yaml::Value) -> Result<(), ScoutError> {
    let json_value = serde_json::to_value(yaml)
        .map_err(|e| ScoutError::Config(format!("Config conversion error: {}", e)))?;

    let compiled = jsonschema::JSONSchema::compile(&CONFIG_SCHEMA)
        .map_err(|e| ScoutError::Config(format!("Schema compilation error: {}", e)))?;

    if let Err(errors) = compiled.validate(&json_value) {
        // Advisory: typed parsing below is the hard gate
        for e in errors {
            warn!(validation_error = %e, path = %e.instance_path, "Config schema warning");
        }
    }

    Ok(())
}

fn validate_semantics(config: &ScoutConfig) -> Result<(), ScoutError> {
    if config.browser.screen_width == 0 || config.browser.screen_height == 0 {
        return Err(ScoutError::Config("browser screen dimensions must be positive".into()));
    }
    if config.agent.max_turns == 0 {
        return Err(ScoutError::Config("agent.max_turns must be at least 1".into()));
    }
    if config.agent.max_results == 0 {
        return Err(ScoutError::Config("agent.max_results must be at least 1".into()));
    }
    if config.jobs.ttl_secs > JobsConfig::MAX_SECS || config.jobs.sweep_interval_secs > JobsConfig::MAX_SECS {
        return Err(ScoutError::Config(format!(
            "jobs.ttl_secs and jobs.sweep_interval_secs must not exceed {} (30 days)",
            JobsConfig::MAX_SECS
        )));
    }
    if config.jobs.max_jobs == 0 {
        return Err(ScoutError::Config("jobs.max_jobs must be at least 1".into()));
    }
    if config.llm.api_key.as_deref().is_some_and(str::is_empty) {
        warn!("llm.api_key is set but empty; falling back to environment");
    }
    Ok(())
}
