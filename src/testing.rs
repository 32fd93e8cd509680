//! In-process fakes for the browser and model seams.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use async_trait::async_trait;
use crate::agent::context::TurnContext;
use crate::browser::{PageSession, SessionFactory};
use crate::errors::ScoutError;
use crate::llm::provider::{DecisionModel, VisionModel};
use crate::llm::types::{Decision, LLMResponse};

const FAKE_PNG: &[u8] = &[0x89, b'P', b'N', b'G'];

/// Records every input primitive as a short string such as `click 10,20`.
/// Screenshots, URL reads, markup reads and closes are not recorded.
pub struct FakePage {
    url: Mutex<String>,
    content: String,
    calls: Mutex<Vec<String>>,
    failing: Option<String>,
    closes: Arc<AtomicUsize>,
}

impl FakePage {
    pub fn new(url: &str) -> Self {
        Self {
            url: Mutex::new(url.to_string()),
            content: "<html></html>".to_string(),
            calls: Mutex::new(Vec::new()),
            failing: None,
            closes: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Fail every primitive whose recorded verb is `verb`, after recording it.
    pub fn failing_on(mut self, verb: &str) -> Self {
        self.failing = Some(verb.to_string());
        self
    }

    pub fn with_content(mut self, html: &str) -> Self {
        self.content = html.to_string();
        self
    }

    pub fn with_close_counter(mut self, closes: Arc<AtomicUsize>) -> Self {
        self.closes = closes;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) -> Result<(), ScoutError> {
        let verb = call.split_whitespace().next().unwrap_or("").to_string();
        self.calls.lock().unwrap().push(call);
        match &self.failing {
            Some(failing) if *failing == verb => Err(ScoutError::Browser(format!("{} failed", verb))),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl PageSession for FakePage {
    async fn navigate(&self, url: &str) -> Result<(), ScoutError> {
        self.record(format!("navigate {}", url))?;
        *self.url.lock().unwrap() = url.to_string();
        Ok(())
    }
    async fn mouse_click(&self, x: i64, y: i64) -> Result<(), ScoutError> {
        self.record(format!("click {},{}", x, y))
    }
    async fn mouse_move(&self, x: i64, y: i64) -> Result<(), ScoutError> {
        self.record(format!("move {},{}", x, y))
    }
    async fn mouse_down(&self) -> Result<(), ScoutError> {
        self.record("down".into())
    }
    async fn mouse_up(&self) -> Result<(), ScoutError> {
        self.record("up".into())
    }
    async fn mouse_wheel(&self, dx: i64, dy: i64) -> Result<(), ScoutError> {
        self.record(format!("wheel {},{}", dx, dy))
    }
    async fn keyboard_type(&self, text: &str) -> Result<(), ScoutError> {
        self.record(format!("type {}", text))
    }
    async fn keyboard_press(&self, key: &str) -> Result<(), ScoutError> {
        self.record(format!("press {}", key))
    }
    async fn go_back(&self) -> Result<(), ScoutError> {
        self.record("back".into())
    }
    async fn go_forward(&self) -> Result<(), ScoutError> {
        self.record("forward".into())
    }
    async fn wait_for_network_idle(&self, timeout_ms: u64) -> Result<(), ScoutError> {
        self.record(format!("wait_idle {}", timeout_ms))
    }
    async fn screenshot(&self) -> Result<Vec<u8>, ScoutError> {
        Ok(FAKE_PNG.to_vec())
    }
    async fn content(&self) -> Result<String, ScoutError> {
        Ok(self.content.clone())
    }
    async fn current_url(&self) -> Result<String, ScoutError> {
        Ok(self.url.lock().unwrap().clone())
    }
    async fn close(&self) -> Result<(), ScoutError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Hands out `FakePage`s that share one close counter.
pub struct FakeSessionFactory {
    opens: AtomicUsize,
    closes: Arc<AtomicUsize>,
    content: String,
    fail_open: bool,
}

impl FakeSessionFactory {
    pub fn new(closes: Arc<AtomicUsize>) -> Self {
        Self { opens: AtomicUsize::new(0), closes, content: "<html></html>".into(), fail_open: false }
    }

    pub fn with_content(mut self, html: &str) -> Self {
        self.content = html.to_string();
        self
    }

    pub fn failing_to_open(mut self) -> Self {
        self.fail_open = true;
        self
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionFactory for FakeSessionFactory {
    async fn open(&self) -> Result<Box<dyn PageSession>, ScoutError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        if self.fail_open {
            return Err(ScoutError::Browser("browser failed to launch".into()));
        }
        Ok(Box::new(
            FakePage::new("about:blank")
                .with_content(&self.content)
                .with_close_counter(self.closes.clone()),
        ))
    }
}

enum Script {
    Always(Decision),
    Sequence(Mutex<VecDeque<Option<Decision>>>),
    Failing(String),
    Panicking(String),
}

/// Decision model driven by a fixed script. Counts round-trips and keeps the
/// last context it was shown.
pub struct ScriptedDecision {
    script: Script,
    delay: Duration,
    calls: AtomicUsize,
    last_context: Mutex<Option<TurnContext>>,
}

impl ScriptedDecision {
    fn with_script(script: Script) -> Self {
        Self { script, delay: Duration::ZERO, calls: AtomicUsize::new(0), last_context: Mutex::new(None) }
    }

    pub fn always(decision: Decision) -> Self {
        Self::with_script(Script::Always(decision))
    }

    /// Replay `steps` in order; once exhausted, answer with an action-free response.
    pub fn sequence(steps: Vec<Option<Decision>>) -> Self {
        Self::with_script(Script::Sequence(Mutex::new(steps.into())))
    }

    pub fn failing(message: &str) -> Self {
        Self::with_script(Script::Failing(message.to_string()))
    }

    /// Panics on the first call, like a model client with a broken invariant.
    pub fn panicking(message: &str) -> Self {
        Self::with_script(Script::Panicking(message.to_string()))
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_context(&self) -> Option<TurnContext> {
        self.last_context.lock().unwrap().clone()
    }
}

#[async_trait]
impl DecisionModel for ScriptedDecision {
    async fn decide(&self, context: &TurnContext) -> Result<Option<Decision>, ScoutError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_context.lock().unwrap() = Some(context.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match &self.script {
            Script::Always(decision) => Ok(Some(decision.clone())),
            Script::Sequence(steps) => Ok(steps
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Some(Decision::text("finished")))),
            Script::Failing(message) => Err(ScoutError::Internal(message.clone())),
            Script::Panicking(message) => panic!("{}", message),
        }
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

/// Vision model with a canned reply; records every prompt.
pub struct FakeVision {
    reply: Option<String>,
    prompts: Mutex<Vec<String>>,
}

impl FakeVision {
    pub fn replying(text: &str) -> Self {
        Self { reply: Some(text.to_string()), prompts: Mutex::new(Vec::new()) }
    }

    pub fn failing() -> Self {
        Self { reply: None, prompts: Mutex::new(Vec::new()) }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl VisionModel for FakeVision {
    async fn describe(&self, prompt: &str, _screenshot_png: &[u8]) -> Result<LLMResponse, ScoutError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match &self.reply {
            Some(text) => Ok(LLMResponse {
                content: text.clone(),
                input_tokens: None,
                output_tokens: None,
                model: "fake-vision".into(),
            }),
            None => Err(ScoutError::Internal("vision model unavailable".into())),
        }
    }

    fn provider_name(&self) -> &str {
        "fake"
    }

    fn model_name(&self) -> &str {
        "fake-vision"
    }
}
