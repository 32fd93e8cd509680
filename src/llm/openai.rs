use async_trait::async_trait;
use base64::prelude::*;
use reqwest::Client;
use serde_json::{json, Value};
use crate::config::credentials::redact_credentials;
use crate::errors::ScoutError;
use super::provider::VisionModel;
use super::types::LLMResponse;

/// Extraction backend using OpenAI-compatible chat completions with an image part.
pub struct OpenAIVision {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAIVision {
    pub fn new(api_key: &str, model: Option<&str>) -> Self {
        Self::with_base_url(api_key, model, "https://api.openai.com/v1")
    }

    pub fn with_base_url(api_key: &str, model: Option<&str>, base_url: &str) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            model: model.unwrap_or("gpt-4o").to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl VisionModel for OpenAIVision {
    async fn describe(&self, prompt: &str, screenshot_png: &[u8]) -> Result<LLMResponse, ScoutError> {
        let image_url = format!("data:image/png;base64,{}", BASE64_STANDARD.encode(screenshot_png));
        let body = json!({
            "model": self.model,
            "messages": [{
                "role": "user",
                "content": [
                    {"type": "text", "text": prompt},
                    {"type": "image_url", "image_url": {"url": image_url}}
                ]
            }],
            "max_tokens": 4096,
        });

        let resp = self.client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| ScoutError::Network(format!("OpenAI request failed: {}", e)))?;

        let status = resp.status();
        if status.as_u16() == 429 {
            return Err(ScoutError::RateLimit("OpenAI rate limit".into()));
        }
        if status.as_u16() == 401 {
            return Err(ScoutError::Authentication("Invalid OpenAI API key".into()));
        }

        let data: Value = resp.json().await
            .map_err(|e| ScoutError::MalformedResponse(format!("OpenAI response body: {}", e)))?;

        if let Some(error) = data.get("error") {
            let message = error["message"].as_str().unwrap_or("Unknown");
            return Err(ScoutError::LLMApi(redact_credentials(message, &[self.api_key.as_str()])));
        }

        let content = data["choices"][0]["message"]["content"].as_str()
            .ok_or_else(|| ScoutError::MalformedResponse("no content in OpenAI response".into()))?
            .to_string();

        Ok(LLMResponse {
            content,
            input_tokens: data["usage"]["prompt_tokens"].as_u64(),
            output_tokens: data["usage"]["completion_tokens"].as_u64(),
            model: self.model.clone(),
        })
    }

    fn provider_name(&self) -> &str { "openai" }
    fn model_name(&self) -> &str { &self.model }
}
