//! pharmaguard-llm — LLM backend abstraction and best-effort narrative
//! explanations for fused pharmacogenomic decisions.

pub mod backend;
pub mod explain;

pub use backend::{LlmBackend, LlmError, OllamaBackend, OpenAiBackend};
pub use explain::{CaseSummary, NarrativeExplainer};
