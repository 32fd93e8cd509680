use std::process::Stdio;
use std::time::Duration;
use async_trait::async_trait;
use base64::prelude::*;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;
use crate::config::BrowserConfig;
use crate::errors::ScoutError;
use super::session::{PageSession, SessionFactory};
use tracing::{debug, info, warn};

/// Extra time granted on top of the navigation timeout before a command is abandoned.
const COMMAND_GRACE: Duration = Duration::from_secs(5);
const STARTUP_TIMEOUT: Duration = Duration::from_secs(30);

/// Node.js driver: keeps one Chromium page alive and answers JSON-line commands on stdio.
const DRIVER_SCRIPT: &str = r#"const readline = require('readline');
const { chromium } = require('playwright');
const opts = JSON.parse(process.env.SCOUT_BROWSER_OPTIONS || '{}');
const reply = (msg) => process.stdout.write(JSON.stringify(msg) + '\n');

(async () => {
  const browser = await chromium.launch({
    headless: opts.headless !== false,
    args: ['--no-sandbox', '--disable-dev-shm-usage'],
  });
  const context = await browser.newContext({
    viewport: { width: opts.width, height: opts.height },
    ignoreHTTPSErrors: true,
  });
  const page = await context.newPage();
  page.setDefaultTimeout(opts.timeout);
  reply({ id: 0, ok: true, result: 'ready' });

  const rl = readline.createInterface({ input: process.stdin });
  for await (const line of rl) {
    let cmd;
    try { cmd = JSON.parse(line); } catch (e) { continue; }
    try {
      let result = null;
      switch (cmd.action) {
        case 'navigate':
          await page.goto(cmd.url, { waitUntil: 'domcontentloaded', timeout: opts.timeout });
          break;
        case 'mouse_click': await page.mouse.click(cmd.x, cmd.y); break;
        case 'mouse_move': await page.mouse.move(cmd.x, cmd.y); break;
        case 'mouse_down': await page.mouse.down(); break;
        case 'mouse_up': await page.mouse.up(); break;
        case 'wheel': await page.mouse.wheel(cmd.dx, cmd.dy); break;
        case 'type': await page.keyboard.type(cmd.text); break;
        case 'press': await page.keyboard.press(cmd.key); break;
        case 'back': await page.goBack({ timeout: opts.timeout }); break;
        case 'forward': await page.goForward({ timeout: opts.timeout }); break;
        case 'wait_idle': await page.waitForLoadState('networkidle', { timeout: cmd.timeout }); break;
        case 'screenshot': result = (await page.screenshot({ type: 'png' })).toString('base64'); break;
        case 'content': result = await page.content(); break;
        case 'url': result = page.url(); break;
        case 'quit':
          reply({ id: cmd.id, ok: true, result: null });
          await browser.close();
          process.exit(0);
        default:
          throw new Error('unknown command: ' + cmd.action);
      }
      reply({ id: cmd.id, ok: true, result });
    } catch (e) {
      reply({ id: cmd.id, ok: false, error: String((e && e.message) || e) });
    }
  }
  await browser.close();
})().catch((e) => {
  reply({ id: 0, ok: false, error: String((e && e.message) || e) });
  process.exit(1);
});
"#;

#[derive(Debug, Deserialize)]
struct DriverReply {
    id: u64,
    ok: bool,
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<String>,
}

struct DriverIo {
    child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
    next_id: u64,
}

impl DriverIo {
    async fn read_reply(&mut self, id: u64, timeout: Duration) -> Result<DriverReply, ScoutError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let line = tokio::time::timeout_at(deadline, self.stdout.next_line())
                .await
                .map_err(|_| ScoutError::Timeout("Browser command timed out".into()))??
                .ok_or_else(|| ScoutError::Browser("Browser driver exited".into()))?;

            match serde_json::from_str::<DriverReply>(&line) {
                // Replies to abandoned (timed out) commands are skipped
                Ok(reply) if reply.id == id => return Ok(reply),
                Ok(reply) => debug!(expected = id, got = reply.id, "Skipping stale driver reply"),
                Err(_) => debug!(line = %line, "Ignoring non-protocol driver output"),
            }
        }
    }
}

/// A persistent Playwright page driven through a Node.js child process.
///
/// One session owns one Chromium instance. Commands are serialized; cookies and
/// DOM state persist across actions until `close()`.
pub struct PlaywrightSession {
    session_id: String,
    io: Mutex<Option<DriverIo>>,
    command_timeout: Duration,
}

impl PlaywrightSession {
    pub async fn launch(config: &BrowserConfig) -> Result<Self, ScoutError> {
        let session_id = uuid::Uuid::new_v4().to_string();
        let options = json!({
            "width": config.screen_width,
            "height": config.screen_height,
            "headless": config.headless,
            "timeout": config.navigation_timeout_ms,
        });

        let mut child = Command::new(&config.node_binary)
            .arg("-e")
            .arg(DRIVER_SCRIPT)
            .env("SCOUT_BROWSER_OPTIONS", options.to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ScoutError::Browser(format!("Failed to start {}: {}", config.node_binary, e)))?;

        let stdin = child.stdin.take()
            .ok_or_else(|| ScoutError::Browser("Driver stdin unavailable".into()))?;
        let stdout = child.stdout.take()
            .ok_or_else(|| ScoutError::Browser("Driver stdout unavailable".into()))?;

        let mut io = DriverIo {
            child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
            next_id: 0,
        };

        let ready = io.read_reply(0, STARTUP_TIMEOUT).await?;
        if !ready.ok {
            return Err(ScoutError::Browser(format!(
                "Browser failed to start: {}",
                ready.error.unwrap_or_default()
            )));
        }
        info!(session = %session_id, width = config.screen_width, height = config.screen_height, "Browser session started");

        Ok(Self {
            session_id,
            io: Mutex::new(Some(io)),
            command_timeout: Duration::from_millis(config.navigation_timeout_ms) + COMMAND_GRACE,
        })
    }

    async fn send(&self, mut cmd: Value) -> Result<Value, ScoutError> {
        let mut guard = self.io.lock().await;
        let io = guard.as_mut()
            .ok_or_else(|| ScoutError::Browser("Browser session is closed".into()))?;

        io.next_id += 1;
        let id = io.next_id;
        cmd["id"] = json!(id);

        let mut line = serde_json::to_string(&cmd)?;
        line.push('\n');
        io.stdin.write_all(line.as_bytes()).await?;
        io.stdin.flush().await?;

        let reply = io.read_reply(id, self.command_timeout).await?;
        if reply.ok {
            Ok(reply.result)
        } else {
            Err(ScoutError::Browser(reply.error.unwrap_or_else(|| "unknown driver error".into())))
        }
    }

    async fn send_text(&self, cmd: Value) -> Result<String, ScoutError> {
        let result = self.send(cmd).await?;
        Ok(result.as_str().unwrap_or_default().to_string())
    }
}

#[async_trait]
impl PageSession for PlaywrightSession {
    async fn navigate(&self, url: &str) -> Result<(), ScoutError> {
        self.send(json!({"action": "navigate", "url": url})).await.map(|_| ())
    }

    async fn mouse_click(&self, x: i64, y: i64) -> Result<(), ScoutError> {
        self.send(json!({"action": "mouse_click", "x": x, "y": y})).await.map(|_| ())
    }

    async fn mouse_move(&self, x: i64, y: i64) -> Result<(), ScoutError> {
        self.send(json!({"action": "mouse_move", "x": x, "y": y})).await.map(|_| ())
    }

    async fn mouse_down(&self) -> Result<(), ScoutError> {
        self.send(json!({"action": "mouse_down"})).await.map(|_| ())
    }

    async fn mouse_up(&self) -> Result<(), ScoutError> {
        self.send(json!({"action": "mouse_up"})).await.map(|_| ())
    }

    async fn mouse_wheel(&self, dx: i64, dy: i64) -> Result<(), ScoutError> {
        self.send(json!({"action": "wheel", "dx": dx, "dy": dy})).await.map(|_| ())
    }

    async fn keyboard_type(&self, text: &str) -> Result<(), ScoutError> {
        self.send(json!({"action": "type", "text": text})).await.map(|_| ())
    }

    async fn keyboard_press(&self, key: &str) -> Result<(), ScoutError> {
        self.send(json!({"action": "press", "key": key})).await.map(|_| ())
    }

    async fn go_back(&self) -> Result<(), ScoutError> {
        self.send(json!({"action": "back"})).await.map(|_| ())
    }

    async fn go_forward(&self) -> Result<(), ScoutError> {
        self.send(json!({"action": "forward"})).await.map(|_| ())
    }

    async fn wait_for_network_idle(&self, timeout_ms: u64) -> Result<(), ScoutError> {
        self.send(json!({"action": "wait_idle", "timeout": timeout_ms})).await.map(|_| ())
    }

    async fn screenshot(&self) -> Result<Vec<u8>, ScoutError> {
        let encoded = self.send_text(json!({"action": "screenshot"})).await?;
        BASE64_STANDARD.decode(encoded.as_bytes())
            .map_err(|e| ScoutError::Browser(format!("Invalid screenshot encoding: {}", e)))
    }

    async fn content(&self) -> Result<String, ScoutError> {
        self.send_text(json!({"action": "content"})).await
    }

    async fn current_url(&self) -> Result<String, ScoutError> {
        self.send_text(json!({"action": "url"})).await
    }

    async fn close(&self) -> Result<(), ScoutError> {
        let Some(mut io) = self.io.lock().await.take() else {
            return Ok(());
        };

        let quit = format!("{}\n", json!({"action": "quit", "id": io.next_id + 1}));
        if io.stdin.write_all(quit.as_bytes()).await.is_err() {
            debug!(session = %self.session_id, "Driver stdin already closed");
        }
        match tokio::time::timeout(Duration::from_secs(5), io.child.wait()).await {
            Ok(_) => {}
            Err(_) => {
                warn!(session = %self.session_id, "Browser driver did not exit, killing");
                let _ = io.child.kill().await;
            }
        }
        info!(session = %self.session_id, "Browser session closed");
        Ok(())
    }
}

/// Launches one fresh Playwright session per request.
pub struct PlaywrightLauncher {
    config: BrowserConfig,
}

impl PlaywrightLauncher {
    pub fn new(config: BrowserConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl SessionFactory for PlaywrightLauncher {
    async fn open(&self) -> Result<Box<dyn PageSession>, ScoutError> {
        let session = PlaywrightSession::launch(&self.config).await?;
        Ok(Box::new(session))
    }
}
