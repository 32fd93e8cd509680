use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMResponse {
    pub content: String,
    pub input_tokens: Option<u64>,
    pub output_tokens: Option<u64>,
    pub model: String,
}

/// One function call proposed by the decision model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default)]
    pub args: Map<String, Value>,
}

impl FunctionCall {
    pub fn new(name: &str, args: Value) -> Self {
        let args = match args {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self { name: name.to_string(), args }
    }
}

/// A single decision round-trip: proposed calls plus any free-text commentary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub text: String,
    pub calls: Vec<FunctionCall>,
}

impl Decision {
    pub fn text(text: &str) -> Self {
        Self { text: text.to_string(), calls: Vec::new() }
    }

    pub fn with_calls(text: &str, calls: Vec<FunctionCall>) -> Self {
        Self { text: text.to_string(), calls }
    }

    pub fn has_actions(&self) -> bool {
        !self.calls.is_empty()
    }
}
