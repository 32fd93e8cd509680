use async_trait::async_trait;
use crate::agent::context::TurnContext;
use crate::errors::ScoutError;
use super::types::{Decision, LLMResponse};

/// The reasoning step of the turn loop.
#[async_trait]
pub trait DecisionModel: Send + Sync {
    /// Propose the next actions for the accumulated context.
    ///
    /// `Ok(None)` means the model returned no usable candidate at all.
    async fn decide(&self, context: &TurnContext) -> Result<Option<Decision>, ScoutError>;

    /// Model identifier
    fn model_name(&self) -> &str;
}

/// One-shot image + text completion used for page extraction.
#[async_trait]
pub trait VisionModel: Send + Sync {
    async fn describe(&self, prompt: &str, screenshot_png: &[u8]) -> Result<LLMResponse, ScoutError>;

    /// Provider name for logging
    fn provider_name(&self) -> &str;

    /// Model identifier
    fn model_name(&self) -> &str;
}
