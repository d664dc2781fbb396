//! Knowledge base type definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for a document store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    /// Chunk size in words
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Overlap between consecutive chunks, in words
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// Embedding vector dimension
    #[serde(default = "default_embedding_dim")]
    pub embedding_dim: usize,
}

fn default_chunk_size() -> usize {
    1000
}

fn default_chunk_overlap() -> usize {
    200
}

fn default_embedding_dim() -> usize {
    100
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            embedding_dim: default_embedding_dim(),
        }
    }
}

/// Metadata attached to every chunk, recorded at load time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Path of the source document
    pub source: PathBuf,

    /// SHA-256 hash of the raw file content (hex), kept for change
    /// detection
    pub content_hash: String,

    /// Size of the source file in bytes
    pub size_bytes: u64,

    /// Modification time of the source file
    pub last_modified: DateTime<Utc>,

    /// Position of this chunk within its source document
    pub chunk_index: usize,
}

/// A contiguous word-window of a source document.
///
/// Chunks are created during a full reload pass and are immutable until
/// the next reload replaces them wholesale. `content` is never empty:
/// whitespace-only sources produce no chunks at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Text content of the window
    pub content: String,

    /// Source metadata
    pub metadata: ChunkMetadata,
}

/// A single ranked retrieval hit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// The matching chunk
    pub chunk: Chunk,

    /// Cosine similarity to the query, in [-1, 1]
    pub score: f32,
}

/// Per-source summary of the loaded index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSummary {
    /// Source document path
    pub source: PathBuf,

    /// Number of chunks produced from this source
    pub chunks: usize,

    /// Size of the source file in bytes
    pub size_bytes: u64,

    /// Modification time of the source file
    pub last_modified: DateTime<Utc>,
}

/// Statistics from a load operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadStats {
    /// Number of documents indexed
    pub documents: usize,

    /// Number of chunks created
    pub chunks: usize,

    /// Total bytes read
    pub bytes_processed: u64,

    /// Number of files skipped due to read errors
    pub skipped: usize,

    /// Duration in seconds
    pub duration_secs: f64,
}

/// Index size counters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct IndexStats {
    /// Number of distinct source documents
    pub sources: usize,

    /// Number of indexed chunks
    pub chunks: usize,
}
