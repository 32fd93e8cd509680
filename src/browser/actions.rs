use serde_json::{Map, Value};
use crate::errors::ScoutError;
use crate::llm::types::FunctionCall;
use super::coords::NORMALIZED_MAX;

/// Default `scroll_at` distance in normalized units.
const DEFAULT_SCROLL_MAGNITUDE: f64 = 800.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    Up,
    Down,
    Left,
    Right,
}

impl ScrollDirection {
    fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "up" => Some(Self::Up),
            "down" => Some(Self::Down),
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            _ => None,
        }
    }

    /// Unit wheel vector for this direction.
    pub fn unit(&self) -> (i64, i64) {
        match self {
            Self::Up => (0, -1),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
        }
    }
}

/// One simulated UI operation, in normalized [0,1000] coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    OpenBrowser,
    Navigate { url: String },
    ClickAt { x: f64, y: f64 },
    HoverAt { x: f64, y: f64 },
    TypeTextAt { x: f64, y: f64, text: String, press_enter: bool, clear_before_typing: bool },
    ScrollDocument { direction: ScrollDirection },
    ScrollAt { x: f64, y: f64, direction: ScrollDirection, magnitude: f64 },
    KeyCombination { keys: Vec<String> },
    GoBack,
    GoForward,
    WaitFixed,
    DragAndDrop { x: f64, y: f64, destination_x: f64, destination_y: f64 },
    Unknown { name: String },
}

impl Action {
    /// Parse a proposed function call. Malformed arguments are an error;
    /// unrecognised names become `Action::Unknown`.
    pub fn from_call(call: &FunctionCall) -> Result<Self, ScoutError> {
        let args = &call.args;
        let action = match call.name.as_str() {
            "open_web_browser" | "open_browser" => Action::OpenBrowser,
            "navigate" => Action::Navigate { url: string_arg(args, "url")? },
            "click_at" => Action::ClickAt { x: number_arg(args, "x")?, y: number_arg(args, "y")? },
            "hover_at" => Action::HoverAt { x: number_arg(args, "x")?, y: number_arg(args, "y")? },
            "type_text_at" => Action::TypeTextAt {
                x: number_arg(args, "x")?,
                y: number_arg(args, "y")?,
                text: string_arg(args, "text")?,
                press_enter: bool_arg(args, "press_enter", true),
                clear_before_typing: bool_arg(args, "clear_before_typing", true),
            },
            "scroll_document" => Action::ScrollDocument { direction: direction_arg(args)? },
            "scroll_at" => Action::ScrollAt {
                x: number_arg(args, "x")?,
                y: number_arg(args, "y")?,
                direction: direction_arg(args)?,
                magnitude: optional_coordinate_arg(args, "magnitude")?.unwrap_or(DEFAULT_SCROLL_MAGNITUDE),
            },
            "key_combination" => Action::KeyCombination { keys: keys_arg(args)? },
            "go_back" => Action::GoBack,
            "go_forward" => Action::GoForward,
            "wait_5_seconds" | "wait_fixed" => Action::WaitFixed,
            "drag_and_drop" => Action::DragAndDrop {
                x: number_arg(args, "x")?,
                y: number_arg(args, "y")?,
                destination_x: number_arg(args, "destination_x")?,
                destination_y: number_arg(args, "destination_y")?,
            },
            other => Action::Unknown { name: other.to_string() },
        };
        Ok(action)
    }

    /// Short label used in agent logs.
    pub fn label(&self) -> String {
        match self {
            Action::OpenBrowser => "open_browser".into(),
            Action::Navigate { url } => format!("navigate {}", url),
            Action::ClickAt { x, y } => format!("click_at ({}, {})", x, y),
            Action::HoverAt { x, y } => format!("hover_at ({}, {})", x, y),
            Action::TypeTextAt { text, .. } => format!("type_text_at \"{}\"", text),
            Action::ScrollDocument { direction } => format!("scroll_document {:?}", direction).to_lowercase(),
            Action::ScrollAt { direction, .. } => format!("scroll_at {:?}", direction).to_lowercase(),
            Action::KeyCombination { keys } => format!("key_combination {}", keys.join("+")),
            Action::GoBack => "go_back".into(),
            Action::GoForward => "go_forward".into(),
            Action::WaitFixed => "wait_fixed".into(),
            Action::DragAndDrop { .. } => "drag_and_drop".into(),
            Action::Unknown { name } => format!("unknown {}", name),
        }
    }
}

/// Policy decision attached to a proposed call.
#[derive(Debug, Clone, PartialEq)]
pub struct SafetyDecision {
    pub decision: String,
    pub explanation: Option<String>,
}

impl SafetyDecision {
    pub fn from_call(call: &FunctionCall) -> Option<Self> {
        let raw = call.args.get("safety_decision")?;
        let decision = raw["decision"].as_str()?.to_string();
        Some(Self {
            decision,
            explanation: raw["explanation"].as_str().map(|s| s.to_string()),
        })
    }

    /// `require_confirmation` blocks execution; nothing acknowledges it automatically.
    pub fn requires_confirmation(&self) -> bool {
        self.decision == "require_confirmation"
    }

    pub fn block_reason(&self) -> String {
        match &self.explanation {
            Some(why) => format!("blocked: requires user confirmation ({})", why),
            None => "blocked: requires user confirmation".to_string(),
        }
    }
}

/// A required coordinate in normalized [0,1000] space.
fn number_arg(args: &Map<String, Value>, key: &str) -> Result<f64, ScoutError> {
    optional_coordinate_arg(args, key)?
        .ok_or_else(|| ScoutError::InvalidAction(format!("missing numeric argument '{}'", key)))
}

fn optional_coordinate_arg(args: &Map<String, Value>, key: &str) -> Result<Option<f64>, ScoutError> {
    match optional_number_arg(args, key)? {
        Some(v) if !v.is_finite() => Err(ScoutError::InvalidAction(format!("argument '{}' is not a finite number", key))),
        Some(v) if !(0.0..=NORMALIZED_MAX).contains(&v) => Err(ScoutError::InvalidAction(
            format!("argument '{}' is outside 0..={}: {}", key, NORMALIZED_MAX, v),
        )),
        other => Ok(other),
    }
}

fn optional_number_arg(args: &Map<String, Value>, key: &str) -> Result<Option<f64>, ScoutError> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n.as_f64()
            .map(Some)
            .ok_or_else(|| ScoutError::InvalidAction(format!("argument '{}' is not a finite number", key))),
        Some(Value::String(s)) => s.trim().parse::<f64>()
            .map(Some)
            .map_err(|_| ScoutError::InvalidAction(format!("argument '{}' is not numeric: {}", key, s))),
        Some(other) => Err(ScoutError::InvalidAction(format!("argument '{}' is not numeric: {}", key, other))),
    }
}

fn string_arg(args: &Map<String, Value>, key: &str) -> Result<String, ScoutError> {
    args.get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| ScoutError::InvalidAction(format!("missing string argument '{}'", key)))
}

fn bool_arg(args: &Map<String, Value>, key: &str, default: bool) -> bool {
    args.get(key).and_then(|v| v.as_bool()).unwrap_or(default)
}

fn direction_arg(args: &Map<String, Value>) -> Result<ScrollDirection, ScoutError> {
    let raw = string_arg(args, "direction")?;
    ScrollDirection::parse(&raw)
        .ok_or_else(|| ScoutError::InvalidAction(format!("unknown scroll direction '{}'", raw)))
}

/// Accepts `"control+a"` or `["Control", "A"]`.
fn keys_arg(args: &Map<String, Value>) -> Result<Vec<String>, ScoutError> {
    let keys: Vec<String> = match args.get("keys") {
        Some(Value::String(s)) => s.split('+').map(|k| k.trim().to_string()).collect(),
        Some(Value::Array(items)) => items.iter().filter_map(|v| v.as_str()).map(|s| s.to_string()).collect(),
        _ => Vec::new(),
    };
    let keys: Vec<String> = keys.into_iter().filter(|k| !k.is_empty()).collect();
    if keys.is_empty() {
        return Err(ScoutError::InvalidAction("key_combination needs at least one key".into()));
    }
    Ok(keys)
}
