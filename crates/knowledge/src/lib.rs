//! In-memory knowledge base: chunking, embedding, and similarity search.
//!
//! Documents under a directory are split into overlapping word-windows,
//! embedded into fixed-length vectors, and ranked against query
//! embeddings by cosine similarity. The whole index lives in memory and
//! is rebuilt from scratch on every [`DocumentStore::load`]; nothing is
//! persisted between runs.

pub mod chunker;
pub mod context;
pub mod embedding;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use embedding::{create_provider, EmbeddingProvider, HashingProvider, DEFAULT_EMBEDDING_DIM};
pub use store::DocumentStore;
pub use types::{
    Chunk, ChunkMetadata, DocumentSummary, IndexStats, KnowledgeConfig, LoadStats, SearchResult,
};
