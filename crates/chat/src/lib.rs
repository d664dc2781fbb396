//! Chat sessions for lorebase.
//!
//! Persists conversation history in SQLite and orchestrates each chat
//! turn: stored history plus retrieved knowledge-base context go to the
//! LLM, and both sides of the exchange are written back to the history.

pub mod history;
pub mod service;

// Re-export commonly used types
pub use history::{HistoryStore, SessionRecord, StoredMessage};
pub use service::{ChatReply, ChatService};
