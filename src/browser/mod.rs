pub mod actions;
pub mod coords;
pub mod executor;
pub mod playwright;
pub mod session;

pub use actions::{Action, SafetyDecision, ScrollDirection};
pub use coords::ScreenSize;
pub use executor::{ActionExecutor, ActionOutcome, SettlePolicy};
pub use playwright::{PlaywrightLauncher, PlaywrightSession};
pub use session::{panic_message, with_session, PageSession, SessionFactory};
