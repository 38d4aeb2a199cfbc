//! medscout-llm — LLM backend abstraction for report synthesis and
//! candidate extraction assistance.

pub mod backend;

pub use backend::{LlmBackend, LlmError, LlmRequest, LlmResponse, Message};
