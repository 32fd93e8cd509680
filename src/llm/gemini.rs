use async_trait::async_trait;
use base64::prelude::*;
use reqwest::Client;
use serde_json::{json, Value};
use crate::agent::context::{ContextEntry, TurnContext};
use crate::config::credentials::redact_credentials;
use crate::errors::ScoutError;
use super::provider::{DecisionModel, VisionModel};
use super::types::{Decision, FunctionCall, LLMResponse};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_COMPUTER_USE_MODEL: &str = "gemini-2.5-computer-use-preview-10-2025";
pub const DEFAULT_VISION_MODEL: &str = "gemini-2.5-flash";

/// Screenshots older than this many observations are dropped from the request.
const SCREENSHOTS_IN_CONTEXT: usize = 3;

/// Shared HTTP plumbing for the Gemini `generateContent` endpoint.
struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    fn new(api_key: &str, model: &str, base_url: Option<&str>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            base_url: base_url.unwrap_or(DEFAULT_BASE_URL).trim_end_matches('/').to_string(),
        }
    }

    async fn generate(&self, body: &Value) -> Result<Value, ScoutError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);

        let resp = self.client.post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| ScoutError::Network(format!("Gemini request failed: {}", e)))?;

        match resp.status().as_u16() {
            429 => return Err(ScoutError::RateLimit("Gemini rate limit".into())),
            401 | 403 => return Err(ScoutError::Authentication("Gemini rejected the API key".into())),
            _ => {}
        }

        let data: Value = resp.json().await
            .map_err(|e| ScoutError::MalformedResponse(format!("Gemini response body: {}", e)))?;

        if let Some(error) = data.get("error") {
            let message = error["message"].as_str().unwrap_or("Unknown");
            return Err(ScoutError::LLMApi(redact_credentials(message, &[self.api_key.as_str()])));
        }

        Ok(data)
    }
}

fn inline_png(bytes: &[u8]) -> Value {
    json!({"inlineData": {"mimeType": "image/png", "data": BASE64_STANDARD.encode(bytes)}})
}

fn usage(data: &Value) -> (Option<u64>, Option<u64>) {
    (
        data["usageMetadata"]["promptTokenCount"].as_u64(),
        data["usageMetadata"]["candidatesTokenCount"].as_u64(),
    )
}

/// Decision step backed by the Gemini computer-use tool.
pub struct GeminiComputerUse {
    inner: GeminiClient,
}

impl GeminiComputerUse {
    pub fn new(api_key: &str, model: Option<&str>, base_url: Option<&str>) -> Self {
        Self {
            inner: GeminiClient::new(api_key, model.unwrap_or(DEFAULT_COMPUTER_USE_MODEL), base_url),
        }
    }
}

/// Translate the turn history into Gemini `contents`.
pub fn build_contents(context: &TurnContext) -> Vec<Value> {
    let window = context.screenshot_window(SCREENSHOTS_IN_CONTEXT);
    let mut contents = Vec::with_capacity(context.entries().len());

    for (index, entry) in context.entries().iter().enumerate() {
        let include_screenshot = window.contains(&index);
        match entry {
            ContextEntry::Request { text, screenshot } => {
                let mut parts = vec![json!({"text": text})];
                if let (true, Some(png)) = (include_screenshot, screenshot) {
                    parts.push(inline_png(png));
                }
                contents.push(json!({"role": "user", "parts": parts}));
            }
            ContextEntry::Response(decision) => {
                let mut parts = Vec::new();
                if !decision.text.is_empty() {
                    parts.push(json!({"text": decision.text}));
                }
                for call in &decision.calls {
                    parts.push(json!({"functionCall": {"name": call.name, "args": call.args}}));
                }
                contents.push(json!({"role": "model", "parts": parts}));
            }
            ContextEntry::FunctionResults(results) => {
                let parts: Vec<Value> = results.iter().map(|r| {
                    let mut response = json!({
                        "functionResponse": {"name": r.name, "response": r.payload()}
                    });
                    if let (true, Some(png)) = (include_screenshot, &r.screenshot) {
                        response["functionResponse"]["parts"] = json!([inline_png(png)]);
                    }
                    response
                }).collect();
                contents.push(json!({"role": "user", "parts": parts}));
            }
        }
    }

    contents
}

/// Pull text and function calls out of the first candidate.
pub fn parse_decision(data: &Value) -> Option<Decision> {
    let parts = data["candidates"].get(0)?["content"]["parts"].as_array()?;

    let mut decision = Decision::default();
    let mut texts = Vec::new();
    for part in parts {
        if let Some(text) = part["text"].as_str() {
            texts.push(text.to_string());
        }
        if let Some(call) = part.get("functionCall") {
            if let Some(name) = call["name"].as_str() {
                decision.calls.push(FunctionCall::new(name, call["args"].clone()));
            }
        }
    }
    decision.text = texts.join("\n");
    Some(decision)
}

#[async_trait]
impl DecisionModel for GeminiComputerUse {
    async fn decide(&self, context: &TurnContext) -> Result<Option<Decision>, ScoutError> {
        let body = json!({
            "contents": build_contents(context),
            "tools": [{"computerUse": {"environment": "ENVIRONMENT_BROWSER"}}],
            "generationConfig": {
                "temperature": 1.0,
            }
        });

        let data = self.inner.generate(&body).await?;
        let (input_tokens, output_tokens) = usage(&data);
        tracing::debug!(model = %self.inner.model, ?input_tokens, ?output_tokens, "Decision received");
        Ok(parse_decision(&data))
    }

    fn model_name(&self) -> &str { &self.inner.model }
}

/// Plain multimodal completion used by the page extractor.
pub struct GeminiVision {
    inner: GeminiClient,
}

impl GeminiVision {
    pub fn new(api_key: &str, model: Option<&str>, base_url: Option<&str>) -> Self {
        Self {
            inner: GeminiClient::new(api_key, model.unwrap_or(DEFAULT_VISION_MODEL), base_url),
        }
    }
}

#[async_trait]
impl VisionModel for GeminiVision {
    async fn describe(&self, prompt: &str, screenshot_png: &[u8]) -> Result<LLMResponse, ScoutError> {
        let body = json!({
            "contents": [{"role": "user", "parts": [{"text": prompt}, inline_png(screenshot_png)]}],
            "generationConfig": {
                "maxOutputTokens": 16384,
            }
        });

        let data = self.inner.generate(&body).await?;
        let content = data["candidates"][0]["content"]["parts"]
            .as_array()
            .map(|parts| parts.iter().filter_map(|p| p["text"].as_str()).collect::<Vec<_>>().join(""))
            .unwrap_or_default();
        let (input_tokens, output_tokens) = usage(&data);

        Ok(LLMResponse {
            content,
            input_tokens,
            output_tokens,
            model: self.inner.model.clone(),
        })
    }

    fn provider_name(&self) -> &str { "gemini" }
    fn model_name(&self) -> &str { &self.inner.model }
}
