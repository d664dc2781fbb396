//! LLM integration crate for lorebase.
//!
//! Provides a provider-agnostic abstraction for chat completion: a list
//! of role/content turns goes in, a single text reply comes out. The
//! shipped provider talks to OpenRouter's OpenAI-compatible API.
//!
//! # Example
//! ```no_run
//! use lorebase_llm::{ChatMessage, ChatRequest, LlmClient, create_client};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = create_client("openrouter", None, Some("sk-..."))?;
//! let request = ChatRequest::new(vec![ChatMessage::user("Hello!")], "openai/gpt-oss-20b:free");
//! let completion = client.complete(&request).await?;
//! println!("{}", completion.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;

// Re-export main types
pub use client::{ChatCompletion, ChatMessage, ChatRequest, ChatUsage, LlmClient, Role};
pub use factory::create_client;
pub use providers::OpenRouterClient;
