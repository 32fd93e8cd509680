use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use serde::Serialize;
use tracing::{info, warn};
use crate::browser::{Action, ActionExecutor, PageSession, SafetyDecision};
use crate::errors::{with_retry, RetryConfig, ScoutError};
use crate::llm::provider::DecisionModel;
use crate::llm::types::FunctionCall;
use super::completion::{CompletionSignal, NoActionsOnly};
use super::context::{FunctionResponse, TurnContext};
use super::log::{AgentLogger, AgentStatus};

pub const DEFAULT_MAX_TURNS: usize = 20;

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalState {
    /// The model returned a response with no actions.
    Completed,
    /// The completion signal fired after a turn's actions ran.
    EarlyExit,
    /// Turn cap reached without a terminal response.
    MaxTurns,
    /// The decision step produced no usable candidate.
    NoCandidate,
}

impl TerminalState {
    /// `MaxTurns` and `NoCandidate` end the run without the model saying it is done.
    pub fn is_conclusive(&self) -> bool {
        matches!(self, TerminalState::Completed | TerminalState::EarlyExit)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TurnOutcome {
    pub state: TerminalState,
    pub turns: usize,
    /// Non-empty commentary from every response, newline-joined.
    pub summary: String,
    pub final_url: Option<String>,
}

/// Observe / decide / act loop over one browser page.
///
/// An instance runs at most one loop at a time; a second concurrent `run`
/// fails with `AlreadyRunning` instead of sharing the page.
pub struct AgentTurnLoop {
    decision: Arc<dyn DecisionModel>,
    executor: ActionExecutor,
    completion: Arc<dyn CompletionSignal>,
    logger: AgentLogger,
    retry: RetryConfig,
    max_turns: usize,
    active: AtomicBool,
}

struct RunGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

impl AgentTurnLoop {
    pub fn new(decision: Arc<dyn DecisionModel>, executor: ActionExecutor, logger: AgentLogger) -> Self {
        Self {
            decision,
            executor,
            completion: Arc::new(NoActionsOnly),
            logger,
            retry: RetryConfig::default(),
            max_turns: DEFAULT_MAX_TURNS,
            active: AtomicBool::new(false),
        }
    }

    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = max_turns.max(1);
        self
    }

    pub fn with_completion(mut self, completion: Arc<dyn CompletionSignal>) -> Self {
        self.completion = completion;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn is_running(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Drive an already-open page to a terminal state. The caller owns the
    /// session's lifetime; see `browser::with_session`.
    pub async fn run(
        &self,
        page: &dyn PageSession,
        start_url: &str,
        goal: &str,
    ) -> Result<TurnOutcome, ScoutError> {
        let _guard = self.acquire()?;
        self.drive(page, start_url, goal).await
    }

    fn acquire(&self) -> Result<RunGuard<'_>, ScoutError> {
        self.active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| ScoutError::AlreadyRunning(self.logger.agent_name().to_string()))?;
        Ok(RunGuard { flag: &self.active })
    }

    async fn drive(&self, page: &dyn PageSession, start_url: &str, goal: &str) -> Result<TurnOutcome, ScoutError> {
        self.logger.log("Opening start page", AgentStatus::Searching, Some(start_url.to_string()));
        let opened = self.executor.execute(page, &Action::Navigate { url: start_url.to_string() }).await;
        if let Some(error) = opened.error {
            return Err(ScoutError::Browser(format!("could not open {}: {}", start_url, error)));
        }

        let initial = self.executor.observe(page).await;
        self.logger.log_with_screenshot(
            "Page loaded",
            AgentStatus::Searching,
            Some(initial.url.clone()),
            initial.screenshot.as_deref(),
        );
        let mut context = TurnContext::seed(goal, initial);

        for turn in 1..=self.max_turns {
            self.logger.log(&format!("Turn {}", turn), AgentStatus::Analyzing, None);

            let decision = {
                let model = &self.decision;
                let ctx = &context;
                with_retry("decide", &self.retry, move || model.decide(ctx)).await?
            };

            let Some(decision) = decision else {
                warn!(agent = %self.logger.agent_name(), turn, "Decision step returned no candidate");
                self.logger.log("No candidate response", AgentStatus::Idle, None);
                return Ok(self.finish(TerminalState::NoCandidate, turn, &context, page).await);
            };

            context.push_decision(decision.clone());
            if !decision.text.trim().is_empty() {
                self.logger.log("Reasoning", AgentStatus::Analyzing, Some(decision.text.trim().to_string()));
            }

            if !decision.has_actions() {
                self.logger.log("Task complete", AgentStatus::Completed, None);
                return Ok(self.finish(TerminalState::Completed, turn, &context, page).await);
            }

            let mut results = Vec::with_capacity(decision.calls.len());
            for call in &decision.calls {
                results.push(self.apply_call(page, call).await);
            }
            context.push_results(results);

            if self.completion.is_done(&decision) {
                self.logger.log("Results visible", AgentStatus::Completed, Some("Stopping on completion signal".into()));
                return Ok(self.finish(TerminalState::EarlyExit, turn, &context, page).await);
            }
        }

        self.logger.log(
            "Turn limit reached",
            AgentStatus::Idle,
            Some(format!("Stopped after {} turns", self.max_turns)),
        );
        Ok(self.finish(TerminalState::MaxTurns, self.max_turns, &context, page).await)
    }

    async fn apply_call(&self, page: &dyn PageSession, call: &FunctionCall) -> FunctionResponse {
        if let Some(safety) = SafetyDecision::from_call(call) {
            if safety.requires_confirmation() {
                let reason = safety.block_reason();
                self.logger.log(&format!("Blocked {}", call.name), AgentStatus::Idle, Some(reason.clone()));
                let observation = self.executor.observe(page).await;
                return FunctionResponse::new(&call.name, observation, Some(reason));
            }
        }

        match Action::from_call(call) {
            Ok(action) => {
                self.logger.log(&action.label(), AgentStatus::Searching, None);
                let (outcome, observation) = self.executor.execute_and_observe(page, &action).await;
                if let Some(error) = &outcome.error {
                    self.logger.error(&format!("Action {} failed", call.name), error);
                }
                FunctionResponse::new(&call.name, observation, outcome.error)
            }
            Err(e) => {
                self.logger.error(&format!("Rejected {}", call.name), &e);
                let observation = self.executor.observe(page).await;
                FunctionResponse::new(&call.name, observation, Some(e.to_string()))
            }
        }
    }

    async fn finish(
        &self,
        state: TerminalState,
        turns: usize,
        context: &TurnContext,
        page: &dyn PageSession,
    ) -> TurnOutcome {
        let final_url = page.current_url().await.ok();
        info!(agent = %self.logger.agent_name(), ?state, turns, "Turn loop finished");
        TurnOutcome { state, turns, summary: context.commentary(), final_url }
    }
}
