//! LLM provider implementations for AgentFlow.
//!
//! One implementation covers nearly every hosted backend: the
//! OpenAI-compatible chat-completions API (OpenRouter, OpenAI, Ollama,
//! vLLM, Together, Fireworks, ...).

pub mod openai_compat;

pub use openai_compat::OpenAiCompatProvider;
