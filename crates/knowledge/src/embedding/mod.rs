//! Embedding providers for the document store.
//!
//! An embedding provider maps a piece of text to a fixed-length vector
//! that can be compared by cosine similarity. The provider is pluggable
//! behind [`EmbeddingProvider`] so a real semantic model can replace the
//! default lexical-hash surrogate without touching the store or the
//! search logic.

pub mod hashing;

pub use hashing::HashingProvider;

use lorebase_core::{AppError, AppResult};
use std::sync::Arc;

/// Default embedding vector dimension.
pub const DEFAULT_EMBEDDING_DIM: usize = 100;

/// Trait for embedding providers.
///
/// Embedding is a pure in-memory computation: it always returns a vector
/// of exactly `dimensions()` entries and never fails. Empty input maps to
/// the zero vector (scaled by the stabilizing epsilon), never NaN or Inf.
pub trait EmbeddingProvider: Send + Sync + std::fmt::Debug {
    /// Get provider name (e.g., "hashing")
    fn provider_name(&self) -> &str;

    /// Get embedding dimensions
    fn dimensions(&self) -> usize;

    /// Generate the embedding for a single text.
    fn embed(&self, text: &str) -> Vec<f32>;
}

/// Create an embedding provider by name.
pub fn create_provider(name: &str, dimensions: usize) -> AppResult<Arc<dyn EmbeddingProvider>> {
    match name {
        "hashing" => Ok(Arc::new(HashingProvider::new(dimensions))),

        _ => Err(AppError::Knowledge(format!(
            "Unknown embedding provider: '{}'. Supported providers: hashing",
            name
        ))),
    }
}
