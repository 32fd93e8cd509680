use std::time::Duration;
use serde::Serialize;
use crate::agent::context::Observation;
use crate::config::BrowserConfig;
use crate::errors::ScoutError;
use super::actions::Action;
use super::coords::ScreenSize;
use super::session::PageSession;
use tracing::{debug, warn};

const FIXED_WAIT: Duration = Duration::from_secs(5);
const DRAG_STEPS: i64 = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ActionOutcome {
    pub fn ok() -> Self {
        Self { success: true, error: None }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self { success: false, error: Some(error.into()) }
    }
}

/// How long to let the page settle after every action.
#[derive(Debug, Clone, Copy)]
pub struct SettlePolicy {
    pub network_idle_timeout_ms: u64,
    pub pause: Duration,
}

impl SettlePolicy {
    pub fn from_config(config: &BrowserConfig) -> Self {
        Self {
            network_idle_timeout_ms: config.settle_timeout_ms,
            pause: Duration::from_millis(config.settle_pause_ms),
        }
    }

    pub fn none() -> Self {
        Self { network_idle_timeout_ms: 0, pause: Duration::ZERO }
    }
}

/// Applies decided actions to a live page. Never returns an error: primitive
/// failures come back as a failed `ActionOutcome`.
#[derive(Debug, Clone)]
pub struct ActionExecutor {
    screen: ScreenSize,
    settle: SettlePolicy,
    fixed_wait: Duration,
}

impl ActionExecutor {
    pub fn new(screen: ScreenSize, settle: SettlePolicy) -> Self {
        Self { screen, settle, fixed_wait: FIXED_WAIT }
    }

    pub fn from_config(config: &BrowserConfig) -> Self {
        Self::new(
            ScreenSize::new(config.screen_width, config.screen_height),
            SettlePolicy::from_config(config),
        )
    }

    /// Override the `wait_fixed` duration.
    pub fn with_fixed_wait(mut self, wait: Duration) -> Self {
        self.fixed_wait = wait;
        self
    }

    pub fn screen(&self) -> ScreenSize {
        self.screen
    }

    pub async fn execute(&self, page: &dyn PageSession, action: &Action) -> ActionOutcome {
        let result = self.apply(page, action).await;
        self.settle(page).await;
        match result {
            Ok(()) => ActionOutcome::ok(),
            Err(e) => {
                warn!(action = %action.label(), error = %e, "Action failed");
                ActionOutcome::failed(e.to_string())
            }
        }
    }

    /// Execute, then capture the page state regardless of the outcome.
    pub async fn execute_and_observe(&self, page: &dyn PageSession, action: &Action) -> (ActionOutcome, Observation) {
        let outcome = self.execute(page, action).await;
        (outcome, self.observe(page).await)
    }

    /// Current URL and screenshot; capture failures leave fields empty.
    pub async fn observe(&self, page: &dyn PageSession) -> Observation {
        let url = page.current_url().await.unwrap_or_else(|e| {
            debug!(error = %e, "Could not read current URL");
            String::new()
        });
        let screenshot = match page.screenshot().await {
            Ok(png) => Some(png),
            Err(e) => {
                warn!(error = %e, "Screenshot capture failed");
                None
            }
        };
        Observation { url, screenshot }
    }

    async fn settle(&self, page: &dyn PageSession) {
        if self.settle.network_idle_timeout_ms > 0 {
            if let Err(e) = page.wait_for_network_idle(self.settle.network_idle_timeout_ms).await {
                debug!(error = %e, "Page did not reach network idle");
            }
        }
        if !self.settle.pause.is_zero() {
            tokio::time::sleep(self.settle.pause).await;
        }
    }

    async fn apply(&self, page: &dyn PageSession, action: &Action) -> Result<(), ScoutError> {
        let screen = self.screen;
        match action {
            Action::OpenBrowser => Ok(()),
            Action::Navigate { url } => page.navigate(&normalize_url(url)).await,
            Action::ClickAt { x, y } => {
                let (px, py) = screen.to_pixels(*x, *y);
                page.mouse_click(px, py).await
            }
            Action::HoverAt { x, y } => {
                let (px, py) = screen.to_pixels(*x, *y);
                page.mouse_move(px, py).await
            }
            Action::TypeTextAt { x, y, text, press_enter, clear_before_typing } => {
                let (px, py) = screen.to_pixels(*x, *y);
                page.mouse_click(px, py).await?;
                if *clear_before_typing {
                    page.keyboard_press("Control+A").await?;
                    page.keyboard_press("Delete").await?;
                }
                page.keyboard_type(text).await?;
                if *press_enter {
                    page.keyboard_press("Enter").await?;
                }
                Ok(())
            }
            Action::ScrollDocument { direction } => {
                let (cx, cy) = screen.center();
                let (ux, uy) = direction.unit();
                page.mouse_move(cx, cy).await?;
                page.mouse_wheel(ux * screen.width as i64, uy * screen.height as i64).await
            }
            Action::ScrollAt { x, y, direction, magnitude } => {
                let (px, py) = screen.to_pixels(*x, *y);
                let (ux, uy) = direction.unit();
                let dx = screen.denormalize_x(*magnitude);
                let dy = screen.denormalize_y(*magnitude);
                page.mouse_move(px, py).await?;
                page.mouse_wheel(ux * dx, uy * dy).await
            }
            Action::KeyCombination { keys } => {
                let chord = keys.iter().map(|k| playwright_key(k)).collect::<Vec<_>>().join("+");
                page.keyboard_press(&chord).await
            }
            Action::GoBack => page.go_back().await,
            Action::GoForward => page.go_forward().await,
            Action::WaitFixed => {
                tokio::time::sleep(self.fixed_wait).await;
                Ok(())
            }
            Action::DragAndDrop { x, y, destination_x, destination_y } => {
                let (sx, sy) = screen.to_pixels(*x, *y);
                let (dx, dy) = screen.to_pixels(*destination_x, *destination_y);
                page.mouse_move(sx, sy).await?;
                page.mouse_down().await?;
                for step in 1..=DRAG_STEPS {
                    page.mouse_move(interpolate(sx, dx, step), interpolate(sy, dy, step)).await?;
                }
                page.mouse_up().await
            }
            Action::Unknown { name } => Err(ScoutError::InvalidAction(format!("unsupported action: {}", name))),
        }
    }
}

/// Point `step` of `DRAG_STEPS` on the segment from `from` to `to`, computed
/// in i128 so the product cannot overflow.
fn interpolate(from: i64, to: i64, step: i64) -> i64 {
    let (from, to) = (from as i128, to as i128);
    let point = from + (to - from) * step as i128 / DRAG_STEPS as i128;
    point.clamp(i64::MIN as i128, i64::MAX as i128) as i64
}

fn normalize_url(url: &str) -> String {
    let trimmed = url.trim();
    if trimmed.contains("://") || trimmed.starts_with("about:") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    }
}

/// Map model key names onto Playwright key names.
pub fn playwright_key(key: &str) -> String {
    match key.trim().to_ascii_lowercase().as_str() {
        "control" | "ctrl" => "Control".into(),
        "shift" => "Shift".into(),
        "alt" | "option" => "Alt".into(),
        "meta" | "cmd" | "command" | "super" => "Meta".into(),
        "enter" | "return" => "Enter".into(),
        "esc" | "escape" => "Escape".into(),
        "tab" => "Tab".into(),
        "space" => "Space".into(),
        "backspace" => "Backspace".into(),
        "delete" | "del" => "Delete".into(),
        "home" => "Home".into(),
        "end" => "End".into(),
        "pageup" => "PageUp".into(),
        "pagedown" => "PageDown".into(),
        "up" | "arrowup" => "ArrowUp".into(),
        "down" | "arrowdown" => "ArrowDown".into(),
        "left" | "arrowleft" => "ArrowLeft".into(),
        "right" | "arrowright" => "ArrowRight".into(),
        k if k.len() > 1 && k.starts_with('f') && k[1..].chars().all(|c| c.is_ascii_digit()) => k.to_uppercase(),
        _ => {
            let raw = key.trim();
            if raw.chars().count() == 1 { raw.to_lowercase() } else { raw.to_string() }
        }
    }
}
