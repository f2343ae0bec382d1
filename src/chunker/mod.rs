
use serde::{Deserialize, Serialize};

/// Segments shorter than this are dropped as noise (e.g. a bare header line)
pub const MIN_CHUNK_LENGTH: usize = 50;

/// Configuration for document chunking
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Minimum chunk length in characters; shorter segments are discarded
    pub min_chunk_length: usize,
}

impl Default for ChunkingConfig {
    #[inline]
    fn default() -> Self {
        Self {
            min_chunk_length: MIN_CHUNK_LENGTH,
        }
    }
}

/// Split a markdown document into retrievable chunks.
///
/// The text is split at header lines (one or more `#` markers followed by
/// whitespace); each header opens a new segment and remains part of it.
/// Segments are trimmed and those shorter than the configured minimum are
/// dropped. A document without headers is treated as a single segment under
/// the same length rule, so an empty or whitespace-only document yields no
/// chunks. Order follows document order.
#[inline]
pub fn chunk_document(text: &str, config: &ChunkingConfig) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for line in text.lines() {
        if is_header_line(line) {
            push_segment(&mut chunks, &current, config.min_chunk_length);
            current.clear();
        }
        current.push_str(line);
        current.push('\n');
    }
    push_segment(&mut chunks, &current, config.min_chunk_length);

    chunks
}

/// A header line is one or more `#` markers followed by at least one
/// whitespace character, e.g. `# Title` or `### Sub-section`.
fn is_header_line(line: &str) -> bool {
    let rest = line.trim_start_matches('#');
    line.starts_with('#') && rest.starts_with(char::is_whitespace)
}

fn push_segment(chunks: &mut Vec<String>, segment: &str, min_length: usize) {
    let trimmed = segment.trim();
    if trimmed.chars().count() >= min_length {
        chunks.push(trimmed.to_string());
    }
}
