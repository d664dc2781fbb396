//! Formatting of search results into a prompt-ready context block.

use crate::types::SearchResult;

/// Header line marking the block as retrieved knowledge-base content.
const CONTEXT_HEADER: &str = "Relevant information from the knowledge base:";

/// Separator between document sections.
const SECTION_SEPARATOR: &str = "\n\n---\n\n";

/// Render search results as a single labeled context block.
///
/// The block opens with a header that marks everything below it as
/// retrieved knowledge-base content (not user or assistant text), then
/// lists each chunk as a numbered `[Document N]` section. No results
/// yield an empty string so callers can skip injection entirely.
pub fn format_context(results: &[SearchResult]) -> String {
    if results.is_empty() {
        return String::new();
    }

    let sections: Vec<String> = results
        .iter()
        .enumerate()
        .map(|(i, result)| format!("[Document {}]\n{}", i + 1, result.chunk.content))
        .collect();

    format!("{}\n\n{}", CONTEXT_HEADER, sections.join(SECTION_SEPARATOR))
}
