//! Error types for lorebase.
//!
//! This module defines a unified error enum covering every error category
//! in the application: configuration, I/O, knowledge base, index
//! construction, LLM, chat history, and serialization.

use thiserror::Error;

/// Unified error type for lorebase.
///
/// All fallible functions in the workspace return `Result<T, AppError>`.
/// We never panic — errors must be represented and propagated.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Knowledge base errors (loading, searching)
    #[error("Knowledge error: {0}")]
    Knowledge(String),

    /// Fatal index construction errors.
    ///
    /// Raised when embedding produces an inconsistent result during a
    /// rebuild. Unlike per-file read failures this indicates a logic bug,
    /// so the whole load aborts.
    #[error("Index build error: {0}")]
    IndexBuild(String),

    /// LLM provider errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// Chat session and history errors
    #[error("Chat error: {0}")]
    Chat(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
