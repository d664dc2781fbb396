//! Word-window chunking with configurable size and overlap.

/// Split text into overlapping windows of whole words.
///
/// Each window holds `size` words and the next window starts
/// `size - overlap` words after the previous one. The window that reaches
/// the end of the word sequence is emitted and iteration stops there,
/// so the final window may hold fewer than `size` words.
///
/// Empty or whitespace-only input produces no chunks. When
/// `overlap >= size` the step falls back to `size` so iteration always
/// advances.
///
/// For `0 <= overlap < size` and a text of `n > overlap` words, the
/// number of windows is `ceil((n - overlap) / (size - overlap))`.
pub fn chunk_words(text: &str, size: usize, overlap: usize) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();

    if words.is_empty() || size == 0 {
        return vec![];
    }

    let step = if size > overlap { size - overlap } else { size };

    let mut chunks = Vec::new();
    let mut start = 0;

    loop {
        let end = (start + size).min(words.len());
        chunks.push(words[start..end].join(" "));

        if end == words.len() {
            break;
        }
        start += step;
    }

    tracing::debug!(
        "Chunked {} words into {} chunks (size: {}, overlap: {})",
        words.len(),
        chunks.len(),
        size,
        overlap
    );

    chunks
}
