//! Word-hash embedding provider.

use crate::embedding::EmbeddingProvider;
use std::collections::HashSet;

/// Stabilizing denominator term so normalization never divides by zero.
const NORM_EPSILON: f32 = 1e-9;

/// Lexical-hash embedding provider for local, offline operation.
///
/// Produces deterministic vectors from the hashed distinct words of a
/// text. This is a bag-of-words surrogate for a real embedding model: it
/// yields lexical-hash collision similarity rather than semantic
/// similarity, but it is cheap, dependency-free, and fully reproducible,
/// which is what the in-memory index needs.
#[derive(Debug)]
pub struct HashingProvider {
    dimensions: usize,
}

impl HashingProvider {
    /// Create a new hashing provider with the given dimensions.
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    /// Deterministic hash of a word, folded over its bytes.
    fn word_hash(word: &str) -> u64 {
        word.bytes()
            .fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64))
    }
}

impl Default for HashingProvider {
    fn default() -> Self {
        Self::new(crate::embedding::DEFAULT_EMBEDDING_DIM)
    }
}

impl EmbeddingProvider for HashingProvider {
    fn provider_name(&self) -> &str {
        "hashing"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn embed(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];

        // Distinct words in first-occurrence order, capped at one word
        // per vector slot.
        let lower = text.to_lowercase();
        let mut seen = HashSet::new();
        let mut slot = 0usize;

        for word in lower.split_whitespace() {
            if !seen.insert(word) {
                continue;
            }
            if slot == self.dimensions {
                break;
            }

            let value = (Self::word_hash(word) % 100) as f32 / 100.0;
            vector[slot % self.dimensions] = value;
            slot += 1;
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        for v in &mut vector {
            *v /= norm + NORM_EPSILON;
        }

        vector
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn l2_norm(v: &[f32]) -> f32 {
        v.iter().map(|x| x * x).sum::<f32>().sqrt()
    }

    #[test]
    fn test_dimensions() {
        let provider = HashingProvider::new(100);
        assert_eq!(provider.dimensions(), 100);
        assert_eq!(provider.provider_name(), "hashing");
        assert_eq!(provider.embed("hello world").len(), 100);
    }

    #[test]
    fn test_deterministic() {
        let provider = HashingProvider::default();
        let text = "the quick brown fox jumps over the lazy dog";

        assert_eq!(provider.embed(text), provider.embed(text));
    }

    #[test]
    fn test_normalized() {
        let provider = HashingProvider::default();

        for text in ["hello world", "apple", "many distinct words in here"] {
            let norm = l2_norm(&provider.embed(text));
            assert!((norm - 1.0).abs() < 1e-4, "norm for {:?} was {}", text, norm);
        }
    }

    #[test]
    fn test_empty_text_is_zero_vector() {
        let provider = HashingProvider::default();
        let vector = provider.embed("");

        assert_eq!(vector.len(), 100);
        assert!(vector.iter().all(|&x| x == 0.0));
        assert!(vector.iter().all(|x| x.is_finite()));
    }

    #[test]
    fn test_whitespace_only_is_zero_vector() {
        let provider = HashingProvider::default();
        let vector = provider.embed("  \n\t ");
        assert!(vector.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_case_insensitive() {
        let provider = HashingProvider::default();
        assert_eq!(provider.embed("Apple Banana"), provider.embed("apple banana"));
    }

    #[test]
    fn test_duplicates_collapse() {
        let provider = HashingProvider::default();
        assert_eq!(
            provider.embed("apple apple apple banana"),
            provider.embed("apple banana")
        );
    }

    #[test]
    fn test_different_texts_differ() {
        let provider = HashingProvider::default();
        assert_ne!(provider.embed("hello world"), provider.embed("goodbye moon"));
    }

    #[test]
    fn test_caps_at_dimension_count() {
        let provider = HashingProvider::new(10);
        let words: Vec<String> = (0..50).map(|i| format!("word{}", i)).collect();
        let vector = provider.embed(&words.join(" "));

        assert_eq!(vector.len(), 10);
        assert!((l2_norm(&vector) - 1.0).abs() < 1e-4);
    }
}
