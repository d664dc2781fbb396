//! In-memory document store and similarity search.

use crate::chunker;
use crate::context;
use crate::embedding::EmbeddingProvider;
use crate::types::{
    Chunk, ChunkMetadata, DocumentSummary, IndexStats, KnowledgeConfig, LoadStats, SearchResult,
};
use chrono::{DateTime, Utc};
use lorebase_core::{AppError, AppResult};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, RwLock};
use std::time::Instant;
use walkdir::WalkDir;

/// File extensions eligible for indexing (lowercase).
///
/// Binary formats in this list (pdf, doc, docx) are decoded as lossy
/// UTF-8 and index as garbled text. Accepted limitation.
const SUPPORTED_EXTENSIONS: &[&str] = &[
    "txt", "md", "markdown", "pdf", "doc", "docx", "csv", "json",
];

/// Stabilizing denominator term for cosine similarity.
const SCORE_EPSILON: f32 = 1e-9;

/// The chunk/vector pair built by one load pass.
///
/// `vectors[i]` is the embedding of `chunks[i]`; the two sequences always
/// have equal length.
#[derive(Debug, Default)]
struct IndexState {
    chunks: Vec<Chunk>,
    vectors: Vec<Vec<f32>>,
}

/// In-memory index over a directory of documents.
///
/// The store is shared behind an `Arc` and handed to call sites
/// explicitly; there is no process-global instance. [`DocumentStore::load`]
/// is the single write operation: it builds a complete new index off to
/// the side and publishes it with one pointer swap under the write lock,
/// so concurrent readers observe either the old index or the new one,
/// never a mix.
pub struct DocumentStore {
    config: KnowledgeConfig,
    provider: Arc<dyn EmbeddingProvider>,
    state: RwLock<Arc<IndexState>>,
}

impl DocumentStore {
    /// Create an empty store using the given embedding provider.
    pub fn new(config: KnowledgeConfig, provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            config,
            provider,
            state: RwLock::new(Arc::new(IndexState::default())),
        }
    }

    /// Rebuild the index from every eligible document under `directory`.
    ///
    /// Files are filtered by extension and read as lossy UTF-8. A file
    /// that cannot be read is logged and skipped; the load continues with
    /// the remaining files. Prior index state is discarded wholesale once
    /// the new state is complete.
    pub fn load(&self, directory: &Path) -> AppResult<LoadStats> {
        let start = Instant::now();
        tracing::info!("Loading knowledge base from {:?}", directory);

        let mut chunks: Vec<Chunk> = Vec::new();
        let mut documents = 0usize;
        let mut bytes_processed = 0u64;
        let mut skipped = 0usize;

        for entry in WalkDir::new(directory).follow_links(false) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Skipping unreadable directory entry: {}", e);
                    skipped += 1;
                    continue;
                }
            };

            let file_type = entry.file_type();
            if !(file_type.is_file() || file_type.is_symlink()) {
                continue;
            }

            let path = entry.path();
            if !is_supported(path) {
                continue;
            }

            match self.read_document(path) {
                Ok((file_chunks, size_bytes)) => {
                    documents += 1;
                    bytes_processed += size_bytes;
                    chunks.extend(file_chunks);
                }
                Err(e) => {
                    tracing::warn!("Skipping {:?}: {}", path, e);
                    skipped += 1;
                }
            }
        }

        // Embed every chunk, keeping vectors index-aligned with chunks.
        let mut vectors = Vec::with_capacity(chunks.len());
        for chunk in &chunks {
            let vector = self.provider.embed(&chunk.content);
            if vector.len() != self.provider.dimensions() {
                return Err(AppError::IndexBuild(format!(
                    "Provider '{}' returned a {}-dimensional vector, expected {}",
                    self.provider.provider_name(),
                    vector.len(),
                    self.provider.dimensions()
                )));
            }
            vectors.push(vector);
        }

        let stats = LoadStats {
            documents,
            chunks: chunks.len(),
            bytes_processed,
            skipped,
            duration_secs: start.elapsed().as_secs_f64(),
        };

        // Publish the finished index with a single pointer swap.
        let next = Arc::new(IndexState { chunks, vectors });
        *self.state.write().unwrap() = next;

        tracing::info!(
            "Indexed {} documents ({} chunks, {} bytes, {} skipped) in {:.2}s",
            stats.documents,
            stats.chunks,
            stats.bytes_processed,
            stats.skipped,
            stats.duration_secs
        );

        Ok(stats)
    }

    /// Read one document and split it into metadata-carrying chunks.
    fn read_document(&self, path: &Path) -> AppResult<(Vec<Chunk>, u64)> {
        let file_meta = std::fs::metadata(path)?;
        let raw = std::fs::read(path)?;

        let text = String::from_utf8_lossy(&raw);
        let content_hash = format!("{:x}", Sha256::digest(&raw));
        let size_bytes = file_meta.len();
        let last_modified: DateTime<Utc> = file_meta.modified()?.into();

        let windows = chunker::chunk_words(&text, self.config.chunk_size, self.config.chunk_overlap);

        let chunks = windows
            .into_iter()
            .enumerate()
            .map(|(chunk_index, content)| Chunk {
                content,
                metadata: ChunkMetadata {
                    source: path.to_path_buf(),
                    content_hash: content_hash.clone(),
                    size_bytes,
                    last_modified,
                    chunk_index,
                },
            })
            .collect();

        tracing::debug!("Processed {:?}: {} bytes", path, size_bytes);

        Ok((chunks, size_bytes))
    }

    /// Rank stored chunks against `query` and return the `top_k` best.
    ///
    /// Results come back in descending cosine-similarity order; ties keep
    /// an unspecified but stable order. An empty store yields an empty
    /// vector, and `top_k` larger than the store yields everything.
    pub fn search(&self, query: &str, top_k: usize) -> Vec<SearchResult> {
        let state = self.state.read().unwrap().clone();

        if state.chunks.is_empty() {
            return Vec::new();
        }

        let query_vector = self.provider.embed(query);

        let mut results: Vec<SearchResult> = state
            .chunks
            .iter()
            .zip(state.vectors.iter())
            .map(|(chunk, vector)| SearchResult {
                chunk: chunk.clone(),
                score: cosine_similarity(&query_vector, vector),
            })
            .collect();

        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(top_k);

        tracing::debug!("Retrieved {} chunks (requested top-{})", results.len(), top_k);

        results
    }

    /// Retrieve the `top_k` most similar chunks and format them as a
    /// prompt-ready context block. Returns an empty string when the store
    /// has nothing relevant.
    pub fn relevant_context(&self, query: &str, top_k: usize) -> String {
        let results = self.search(query, top_k);
        context::format_context(&results)
    }

    /// Summarize the loaded index per source document.
    pub fn documents(&self) -> Vec<DocumentSummary> {
        let state = self.state.read().unwrap().clone();

        let mut sources: BTreeMap<_, DocumentSummary> = BTreeMap::new();
        for chunk in &state.chunks {
            let summary = sources
                .entry(chunk.metadata.source.clone())
                .or_insert_with(|| DocumentSummary {
                    source: chunk.metadata.source.clone(),
                    chunks: 0,
                    size_bytes: chunk.metadata.size_bytes,
                    last_modified: chunk.metadata.last_modified,
                });
            summary.chunks += 1;
        }

        sources.into_values().collect()
    }

    /// Get source and chunk counts for the loaded index.
    pub fn stats(&self) -> IndexStats {
        let state = self.state.read().unwrap().clone();

        let sources = state
            .chunks
            .iter()
            .map(|c| &c.metadata.source)
            .collect::<std::collections::HashSet<_>>()
            .len();

        IndexStats {
            sources,
            chunks: state.chunks.len(),
        }
    }

    /// Number of chunks currently indexed.
    pub fn len(&self) -> usize {
        self.state.read().unwrap().chunks.len()
    }

    /// Whether the index holds no chunks.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Check whether a path carries a supported extension.
fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| SUPPORTED_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Calculate cosine similarity between two vectors.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    dot / (norm_a * norm_b + SCORE_EPSILON)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashingProvider;
    use std::fs;
    use tempfile::TempDir;

    /// Test provider that scores by presence of known marker words, so
    /// ranking assertions do not depend on hash values.
    #[derive(Debug)]
    struct MarkerProvider {
        markers: Vec<&'static str>,
    }

    impl MarkerProvider {
        fn new(markers: Vec<&'static str>) -> Self {
            Self { markers }
        }
    }

    impl EmbeddingProvider for MarkerProvider {
        fn provider_name(&self) -> &str {
            "marker"
        }

        fn dimensions(&self) -> usize {
            self.markers.len()
        }

        fn embed(&self, text: &str) -> Vec<f32> {
            let lower = text.to_lowercase();
            self.markers
                .iter()
                .map(|m| lower.split_whitespace().filter(|w| w == m).count() as f32)
                .collect()
        }
    }

    fn store_with(config: KnowledgeConfig) -> DocumentStore {
        DocumentStore::new(config, Arc::new(HashingProvider::default()))
    }

    fn small_chunks_config() -> KnowledgeConfig {
        KnowledgeConfig {
            chunk_size: 2,
            chunk_overlap: 0,
            embedding_dim: 100,
        }
    }

    #[test]
    fn test_load_splits_into_expected_chunks() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), "apple banana cherry apple banana").unwrap();

        let store = store_with(small_chunks_config());
        let stats = store.load(dir.path()).unwrap();

        assert_eq!(stats.documents, 1);
        assert_eq!(stats.chunks, 3);
        assert_eq!(stats.skipped, 0);
        assert_eq!(store.len(), 3);

        let results = store.search("apple", 10);
        let contents: Vec<&str> = results.iter().map(|r| r.chunk.content.as_str()).collect();
        assert!(contents.contains(&"apple banana"));
        assert!(contents.contains(&"cherry apple"));
        assert!(contents.contains(&"banana"));
    }

    #[test]
    fn test_search_ordering_is_deterministic() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), "apple banana cherry apple banana").unwrap();

        let store = store_with(small_chunks_config());
        store.load(dir.path()).unwrap();

        let first = store.search("apple", 3);
        let second = store.search("apple", 3);

        let order = |results: &[SearchResult]| {
            results
                .iter()
                .map(|r| r.chunk.content.clone())
                .collect::<Vec<_>>()
        };
        assert_eq!(order(&first), order(&second));

        for window in first.windows(2) {
            assert!(window[0].score >= window[1].score);
        }
        for result in &first {
            assert!(result.score >= -1.0 - 1e-5 && result.score <= 1.0 + 1e-5);
        }
    }

    #[test]
    fn test_search_ranks_by_similarity() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("fruit.txt"), "apple apple apple").unwrap();
        fs::write(dir.path().join("mixed.txt"), "apple pear pear").unwrap();
        fs::write(dir.path().join("other.txt"), "pear pear pear").unwrap();

        let provider = Arc::new(MarkerProvider::new(vec!["apple", "pear"]));
        let store = DocumentStore::new(
            KnowledgeConfig {
                chunk_size: 10,
                chunk_overlap: 0,
                embedding_dim: 2,
            },
            provider,
        );
        store.load(dir.path()).unwrap();

        let results = store.search("apple", 3);
        assert_eq!(results.len(), 3);

        assert_eq!(results[0].chunk.content, "apple apple apple");
        assert!((results[0].score - 1.0).abs() < 1e-5);
        assert_eq!(results[1].chunk.content, "apple pear pear");
        assert!(results[1].score > results[2].score);
        assert!(results[2].score.abs() < 1e-5);
    }

    #[test]
    fn test_search_empty_store() {
        let store = store_with(KnowledgeConfig::default());
        assert!(store.search("anything", 5).is_empty());
        assert!(store.is_empty());
    }

    #[test]
    fn test_search_top_k_exceeds_store() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), "one two three four").unwrap();

        let store = store_with(small_chunks_config());
        store.load(dir.path()).unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.search("one", 50).len(), 2);
        assert_eq!(store.search("one", 1).len(), 1);
    }

    #[test]
    fn test_reload_discards_prior_state() {
        let d1 = TempDir::new().unwrap();
        fs::write(d1.path().join("old.txt"), "stale words here").unwrap();

        let d2 = TempDir::new().unwrap();
        fs::write(d2.path().join("new.txt"), "fresh words here").unwrap();

        let store = store_with(KnowledgeConfig::default());
        store.load(d1.path()).unwrap();
        store.load(d2.path()).unwrap();

        let results = store.search("words", 10);
        assert!(!results.is_empty());
        for result in &results {
            assert!(
                result.chunk.metadata.source.starts_with(d2.path()),
                "stale chunk from {:?}",
                result.chunk.metadata.source
            );
        }
    }

    #[test]
    fn test_unsupported_extensions_ignored() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("notes.txt"), "indexed text").unwrap();
        fs::write(dir.path().join("binary.exe"), "ignored").unwrap();
        fs::write(dir.path().join("noext"), "ignored").unwrap();

        let store = store_with(KnowledgeConfig::default());
        let stats = store.load(dir.path()).unwrap();

        assert_eq!(stats.documents, 1);
        assert_eq!(stats.skipped, 0);
    }

    #[test]
    fn test_recursive_traversal() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("sub").join("deeper");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join("top.md"), "top level").unwrap();
        fs::write(nested.join("leaf.txt"), "nested text").unwrap();

        let store = store_with(KnowledgeConfig::default());
        let stats = store.load(dir.path()).unwrap();

        assert_eq!(stats.documents, 2);
    }

    #[test]
    fn test_partial_failure_skips_unreadable_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), "first valid file").unwrap();
        fs::write(dir.path().join("b.txt"), "second valid file").unwrap();
        // A dangling symlink passes the extension filter but fails to read.
        std::os::unix::fs::symlink(dir.path().join("missing"), dir.path().join("broken.txt"))
            .unwrap();

        let store = store_with(KnowledgeConfig::default());
        let stats = store.load(dir.path()).unwrap();

        assert_eq!(stats.documents, 2);
        assert_eq!(stats.skipped, 1);

        let results = store.search("valid file", 10);
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_empty_file_yields_no_chunks() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("empty.txt"), "").unwrap();
        fs::write(dir.path().join("blank.txt"), "   \n\t ").unwrap();

        let store = store_with(KnowledgeConfig::default());
        let stats = store.load(dir.path()).unwrap();

        assert_eq!(stats.chunks, 0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_chunk_metadata_recorded() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("doc.txt");
        fs::write(&path, "alpha beta gamma delta").unwrap();

        let store = store_with(small_chunks_config());
        store.load(dir.path()).unwrap();

        let results = store.search("alpha", 10);
        let chunk = &results
            .iter()
            .find(|r| r.chunk.metadata.chunk_index == 0)
            .unwrap()
            .chunk;

        assert_eq!(chunk.metadata.source, path);
        assert_eq!(chunk.metadata.size_bytes, 22);
        assert_eq!(chunk.metadata.content_hash.len(), 64);
    }

    #[test]
    fn test_documents_grouped_by_source() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), "one two three four").unwrap();
        fs::write(dir.path().join("b.txt"), "five six").unwrap();

        let store = store_with(small_chunks_config());
        store.load(dir.path()).unwrap();

        let documents = store.documents();
        assert_eq!(documents.len(), 2);

        let a = documents
            .iter()
            .find(|d| d.source.ends_with("a.txt"))
            .unwrap();
        assert_eq!(a.chunks, 2);

        let stats = store.stats();
        assert_eq!(stats.sources, 2);
        assert_eq!(stats.chunks, 3);
    }

    #[test]
    fn test_concurrent_search_during_reload() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), "shared words for searching").unwrap();

        let store = Arc::new(store_with(KnowledgeConfig::default()));
        store.load(dir.path()).unwrap();

        let reader = {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                for _ in 0..100 {
                    let results = store.search("words", 5);
                    // Readers see a complete index: zero or one chunk
                    // here, never an inconsistent pair.
                    assert!(results.len() <= 1);
                }
            })
        };

        for _ in 0..10 {
            store.load(dir.path()).unwrap();
        }

        reader.join().unwrap();
    }

    #[test]
    fn test_wrong_dimension_vector_aborts_load() {
        #[derive(Debug)]
        struct BadProvider;

        impl EmbeddingProvider for BadProvider {
            fn provider_name(&self) -> &str {
                "bad"
            }

            fn dimensions(&self) -> usize {
                100
            }

            fn embed(&self, _text: &str) -> Vec<f32> {
                vec![0.0; 3]
            }
        }

        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), "some text").unwrap();

        let store = DocumentStore::new(KnowledgeConfig::default(), Arc::new(BadProvider));
        let err = store.load(dir.path()).unwrap_err();

        assert!(matches!(err, lorebase_core::AppError::IndexBuild(_)));
        // The broken load published nothing
        assert!(store.is_empty());
    }

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &[1.0, 0.0, 0.0]) - 1.0).abs() < 0.001);
        assert!((cosine_similarity(&a, &[0.0, 1.0, 0.0])).abs() < 0.001);

        // Zero vectors stay finite thanks to the epsilon denominator
        let zero = vec![0.0, 0.0, 0.0];
        let score = cosine_similarity(&zero, &a);
        assert!(score.is_finite());
        assert_eq!(score, 0.0);

        // Length mismatch scores zero
        assert_eq!(cosine_similarity(&a, &[1.0, 0.0]), 0.0);
    }
}
