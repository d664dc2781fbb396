//! LLM provider implementations.

pub mod openrouter;

pub use openrouter::OpenRouterClient;
