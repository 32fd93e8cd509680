pub mod completion;
pub mod context;
pub mod extractor;
pub mod log;
pub mod turn_loop;

pub use completion::{CompletionSignal, NoActionsOnly, SentinelPhrases};
pub use context::{ContextEntry, FunctionResponse, Observation, TurnContext};
pub use extractor::{Extraction, PageDataExtractor};
pub use log::{AgentLogEntry, AgentLogger, AgentStatus, LogCallback};
pub use turn_loop::{AgentTurnLoop, TerminalState, TurnOutcome};
