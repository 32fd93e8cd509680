use std::path::Path;
use std::sync::Arc;
use tracing::info;
use crate::browser::PlaywrightLauncher;
use crate::config::credentials::{provider_env_var, resolve_api_key};
use crate::config::{parser::load_or_default, ScoutConfig};
use crate::errors::{RetryConfig, ScoutError};
use crate::jobs::{JobOrchestrator, JobStore};
use crate::llm::{create_decision_model, create_vision_model};
use crate::scrapers::{default_scrapers, ScraperDeps};
use super::commands::RuntimeArgs;

/// Load the config file (or defaults) and apply command-line overrides.
pub async fn load_config(args: &RuntimeArgs) -> Result<ScoutConfig, ScoutError> {
    let mut config = load_or_default(args.config.as_deref().map(Path::new)).await?;
    if let Some(provider) = &args.provider {
        config.llm.provider = provider.clone();
    }
    if let Some(model) = &args.model {
        config.llm.model = model.clone();
    }
    if let Some(provider) = &args.extraction_provider {
        config.llm.extraction_provider = Some(provider.clone());
    }
    if let Some(model) = &args.extraction_model {
        config.llm.extraction_model = Some(model.clone());
    }
    if args.headed {
        config.browser.headless = false;
    }
    if let Some(turns) = args.max_turns {
        config.agent.max_turns = turns.max(1);
    }
    Ok(config)
}

fn require_key(explicit: Option<&str>, configured: Option<&str>, provider: &str) -> Result<String, ScoutError> {
    resolve_api_key(explicit, configured, provider).ok_or_else(|| {
        let hint = provider_env_var(provider).map(|v| format!(" (set {})", v)).unwrap_or_default();
        ScoutError::Authentication(format!("No API key for provider {}{}", provider, hint))
    })
}

/// Wire models, browser launcher and scrapers into an orchestrator.
pub fn build_orchestrator(config: &ScoutConfig, api_key: Option<&str>) -> Result<JobOrchestrator, ScoutError> {
    let llm = &config.llm;
    let decision_key = require_key(api_key, llm.api_key.as_deref(), &llm.provider)?;
    let decision = create_decision_model(&llm.provider, &decision_key, Some(llm.model.as_str()), llm.base_url.as_deref())?;

    let vision_provider = llm.extraction_provider();
    let vision_key = if vision_provider == llm.provider {
        decision_key.clone()
    } else {
        require_key(None, None, vision_provider)?
    };
    // A custom base URL belongs to the decision provider
    let vision_base = if vision_provider == llm.provider { llm.base_url.as_deref() } else { None };
    let vision = create_vision_model(vision_provider, &vision_key, llm.extraction_model.as_deref(), vision_base)?;

    info!(
        decision_model = decision.model_name(),
        vision_provider = vision.provider_name(),
        vision_model = vision.model_name(),
        "Models configured"
    );

    let deps = ScraperDeps {
        sessions: Arc::new(PlaywrightLauncher::new(config.browser.clone())),
        decision: Arc::from(decision),
        vision: Arc::from(vision),
        browser: config.browser.clone(),
        agent: config.agent.clone(),
        retry: RetryConfig::default().with_max_retries(llm.max_retries),
    };

    Ok(JobOrchestrator::new(
        JobStore::new(&config.jobs),
        default_scrapers(deps),
        config.agent.max_results,
    ))
}
