pub mod provider;
pub mod openai;
pub mod gemini;
pub mod router;
pub mod types;

pub use provider::{DecisionModel, VisionModel};
pub use router::{create_decision_model, create_vision_model};
pub use types::{Decision, FunctionCall, LLMResponse};
