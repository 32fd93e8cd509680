use crate::errors::ScoutError;
use super::provider::{DecisionModel, VisionModel};
use super::gemini::{GeminiComputerUse, GeminiVision};
use super::openai::OpenAIVision;

/// Only Gemini exposes the computer-use tool the turn loop speaks.
pub fn create_decision_model(
    provider_name: &str,
    api_key: &str,
    model: Option<&str>,
    base_url: Option<&str>,
) -> Result<Box<dyn DecisionModel>, ScoutError> {
    match provider_name {
        "gemini" => Ok(Box::new(GeminiComputerUse::new(api_key, model, base_url))),
        other => Err(ScoutError::Config(format!(
            "Provider {} has no computer-use support; use gemini",
            other
        ))),
    }
}

pub fn create_vision_model(
    provider_name: &str,
    api_key: &str,
    model: Option<&str>,
    base_url: Option<&str>,
) -> Result<Box<dyn VisionModel>, ScoutError> {
    match provider_name {
        "gemini" => Ok(Box::new(GeminiVision::new(api_key, model, base_url))),
        "openai" => match base_url {
            Some(url) => Ok(Box::new(OpenAIVision::with_base_url(api_key, model, url))),
            None => Ok(Box::new(OpenAIVision::new(api_key, model))),
        },
        other => Err(ScoutError::Config(format!("Unknown LLM provider: {}", other))),
    }
}
