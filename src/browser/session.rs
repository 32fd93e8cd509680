use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use async_trait::async_trait;
use futures::FutureExt;
use tracing::warn;
use crate::errors::ScoutError;

/// Browser primitives for one live page. Coordinates are viewport pixels.
#[async_trait]
pub trait PageSession: Send + Sync {
    async fn navigate(&self, url: &str) -> Result<(), ScoutError>;
    async fn mouse_click(&self, x: i64, y: i64) -> Result<(), ScoutError>;
    async fn mouse_move(&self, x: i64, y: i64) -> Result<(), ScoutError>;
    async fn mouse_down(&self) -> Result<(), ScoutError>;
    async fn mouse_up(&self) -> Result<(), ScoutError>;
    async fn mouse_wheel(&self, dx: i64, dy: i64) -> Result<(), ScoutError>;
    async fn keyboard_type(&self, text: &str) -> Result<(), ScoutError>;
    /// Press a key or chord such as `Enter` or `Control+A`.
    async fn keyboard_press(&self, key: &str) -> Result<(), ScoutError>;
    async fn go_back(&self) -> Result<(), ScoutError>;
    async fn go_forward(&self) -> Result<(), ScoutError>;
    async fn wait_for_network_idle(&self, timeout_ms: u64) -> Result<(), ScoutError>;
    /// PNG bytes of the current viewport.
    async fn screenshot(&self) -> Result<Vec<u8>, ScoutError>;
    async fn content(&self) -> Result<String, ScoutError>;
    async fn current_url(&self) -> Result<String, ScoutError>;
    /// Tear down the session. Safe to call more than once.
    async fn close(&self) -> Result<(), ScoutError>;
}

/// Opens isolated browser sessions; never shared between scrapers.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn open(&self) -> Result<Box<dyn PageSession>, ScoutError>;
}

/// Open a session, run `work` on it and close it exactly once.
///
/// A panic inside `work` is caught and returned as `ScoutError::Internal`
/// after the session has been closed.
pub async fn with_session<T, F, Fut>(sessions: &dyn SessionFactory, work: F) -> Result<T, ScoutError>
where
    F: FnOnce(Arc<dyn PageSession>) -> Fut,
    Fut: Future<Output = Result<T, ScoutError>>,
{
    let page: Arc<dyn PageSession> = Arc::from(sessions.open().await?);
    let result = AssertUnwindSafe(work(page.clone())).catch_unwind().await;
    if let Err(e) = page.close().await {
        warn!(error = %e, "Failed to close browser session");
    }
    result.unwrap_or_else(|payload| Err(ScoutError::Internal(format!("panicked: {}", panic_message(payload.as_ref())))))
}

/// Text of a caught panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use crate::testing::FakeSessionFactory;

    #[tokio::test]
    async fn test_session_closed_once_on_success() {
        let closes = Arc::new(AtomicUsize::new(0));
        let sessions = FakeSessionFactory::new(closes.clone());
        let url = with_session(&sessions, |page| async move { page.current_url().await }).await.unwrap();
        assert_eq!(url, "about:blank");
        assert_eq!(sessions.opens(), 1);
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_session_closed_once_on_error() {
        let closes = Arc::new(AtomicUsize::new(0));
        let sessions = FakeSessionFactory::new(closes.clone());
        let result: Result<(), _> = with_session(&sessions, |_page| async {
            Err(ScoutError::Browser("gone".into()))
        }).await;
        assert!(matches!(result, Err(ScoutError::Browser(_))));
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    fn corrupted() -> Result<(), ScoutError> {
        panic!("driver state corrupted")
    }

    #[tokio::test]
    async fn test_panic_is_caught_and_session_closed() {
        let closes = Arc::new(AtomicUsize::new(0));
        let sessions = FakeSessionFactory::new(closes.clone());
        let result = with_session(&sessions, |_page| async { corrupted() }).await;
        match result {
            Err(ScoutError::Internal(msg)) => assert!(msg.contains("driver state corrupted")),
            other => panic!("expected internal error, got {:?}", other),
        }
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_open_failure_skips_work() {
        let sessions = FakeSessionFactory::new(Arc::new(AtomicUsize::new(0))).failing_to_open();
        let mut ran = false;
        let result = with_session(&sessions, |_page| {
            ran = true;
            async { Ok(()) }
        }).await;
        assert!(result.is_err());
        assert!(!ran);
    }
}
