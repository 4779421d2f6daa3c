//! The model-facing pipeline: prompt construction, invocation, and the
//! layered extraction that turns free-text model output into canonical
//! finding records.
//!
//! Data flows strictly upward: prompts -> provider -> resolve -> extract ->
//! normalize -> [`scanner::Detector`] output. Each stage is independently
//! testable and emits its own telemetry.

pub mod config;
pub mod extract;
pub mod mock_provider;
pub mod normalize;
pub mod prompts;
pub mod provider;
pub mod resolve;
pub mod scanner;

pub use config::LLMConfig;
pub use extract::{extract_candidates, Extraction, ExtractionStage};
pub use mock_provider::MockLLMProvider;
pub use normalize::normalize;
pub use prompts::{number_source_lines, PromptBuilder, PromptTemplate};
pub use provider::{ChatMessage, LLMError, LLMProvider, LLMRequest, OpenAIProvider, Role};
pub use resolve::resolve_text;
pub use scanner::{Detector, DetectorConfig};
