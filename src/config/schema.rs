use serde_json::{json, Value};
use std::sync::LazyLock;

pub static CONFIG_SCHEMA: LazyLock<Value> = LazyLock::new(|| {
    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "type": "object",
        "additionalProperties": false,
        "properties": {
            "llm": {
                "type": "object",
                "properties": {
                    "provider": { "type": "string", "enum": ["gemini", "openai"] },
                    "model": { "type": "string" },
                    "extraction_provider": { "type": "string", "enum": ["gemini", "openai"] },
                    "extraction_model": { "type": "string" },
                    "api_key": { "type": "string" },
                    "base_url": { "type": "string" },
                    "max_retries": { "type": "integer", "minimum": 0 }
                }
            },
            "browser": {
                "type": "object",
                "properties": {
                    "screen_width": { "type": "integer", "minimum": 1 },
                    "screen_height": { "type": "integer", "minimum": 1 },
                    "headless": { "type": "boolean" },
                    "navigation_timeout_ms": { "type": "integer", "minimum": 1 },
                    "settle_timeout_ms": { "type": "integer", "minimum": 0 },
                    "settle_pause_ms": { "type": "integer", "minimum": 0 },
                    "node_binary": { "type": "string" },
                    "capture_markup": { "type": "boolean" }
                }
            },
            "agent": {
                "type": "object",
                "properties": {
                    "max_turns": { "type": "integer", "minimum": 1 },
                    "max_results": { "type": "integer", "minimum": 1 },
                    "extraction_markup_chars": { "type": "integer", "minimum": 0 }
                }
            },
            "jobs": {
                "type": "object",
                "properties": {
                    "ttl_secs": { "type": "integer", "minimum": 1, "maximum": 2592000 },
                    "sweep_interval_secs": { "type": "integer", "minimum": 1, "maximum": 2592000 },
                    "max_jobs": { "type": "integer", "minimum": 1 }
                }
            },
            "server": {
                "type": "object",
                "properties": {
                    "host": { "type": "string" },
                    "port": { "type": "integer", "minimum": 1, "maximum": 65535 },
                    "api_token": { "type": "string" }
                }
            }
        }
    })
});
