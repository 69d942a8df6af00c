use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::types::{Chunk, ChunkMetadata, DocType, RawDocument};

/// How far (in characters) on either side of a window end a sentence boundary is looked for.
pub const BOUNDARY_WINDOW: usize = 100;

// Priority order. The first marker with any hit in the region wins, even when a
// lower-priority marker sits closer to the window end.
const BOUNDARY_MARKERS: [[char; 2]; 4] = [['.', ' '], ['.', '\n'], ['!', '\n'], ['?', '\n']];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { chunk_size: 1000, chunk_overlap: 200 }
    }
}

impl ChunkingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::InvalidConfig("chunk_size must be greater than 0".to_string()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(Error::InvalidConfig(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

/// Splits document text into overlapping, sentence-aligned chunks.
///
/// Sizes are measured in characters. A chunk never exceeds
/// `chunk_size + BOUNDARY_WINDOW` characters.
#[derive(Debug, Clone)]
pub struct Chunker {
    config: ChunkingConfig,
}

impl Default for Chunker {
    fn default() -> Self {
        Self { config: ChunkingConfig::default() }
    }
}

impl Chunker {
    pub fn new(config: ChunkingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> ChunkingConfig {
        self.config
    }

    pub fn chunk(&self, document: &RawDocument) -> Vec<Chunk> {
        if document.content.is_empty() {
            return Vec::new();
        }
        let pieces = self.split_text(&document.content);
        let total_chunks = pieces.len();
        let original_length = document.content.chars().count();
        let doc_type = DocType::classify(&document.source);
        debug!(source = %document.source, chars = original_length, chunks = total_chunks, %doc_type, "chunked document");

        pieces
            .into_iter()
            .enumerate()
            .map(|(chunk_index, content)| {
                let chunk_length = content.chars().count();
                Chunk {
                    content,
                    source: document.source.clone(),
                    status: document.status.clone(),
                    chunk_index,
                    total_chunks,
                    doc_type,
                    metadata: ChunkMetadata { original_length, chunk_length, extra: document.metadata.clone() },
                }
            })
            .collect()
    }

    /// Window-and-boundary split of `text` into trimmed, non-empty pieces.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        let ChunkingConfig { chunk_size, chunk_overlap } = self.config;
        let chars: Vec<char> = text.chars().collect();
        let len = chars.len();
        if len <= chunk_size {
            let trimmed = text.trim();
            return if trimmed.is_empty() { Vec::new() } else { vec![trimmed.to_string()] };
        }

        let mut pieces = Vec::new();
        let mut start = 0usize;
        while start < len {
            let mut end = start + chunk_size;
            if end < len {
                let search_start = (start + chunk_size).saturating_sub(BOUNDARY_WINDOW).max(start);
                let search_end = (end + BOUNDARY_WINDOW).min(len);
                if let Some(boundary) = find_boundary(&chars, search_start, search_end) {
                    end = boundary;
                }
            }

            let piece: String = chars[start..end.min(len)].iter().collect();
            let piece = piece.trim();
            if !piece.is_empty() {
                pieces.push(piece.to_string());
            }

            // `end` stays unclamped here; a window that overran the text can still leave a short tail.
            let next = end.saturating_sub(chunk_overlap);
            start = if next > start { next } else { end };
        }
        pieces
    }
}

/// Position just past the winning marker inside `[from, to)`, if any.
fn find_boundary(chars: &[char], from: usize, to: usize) -> Option<usize> {
    BOUNDARY_MARKERS
        .iter()
        .find_map(|marker| rfind_in(chars, marker, from, to).map(|pos| pos + marker.len()))
}

/// Last index `i` with `from <= i` and `i + marker.len() <= to` where the marker matches.
fn rfind_in(chars: &[char], marker: &[char], from: usize, to: usize) -> Option<usize> {
    if to < from + marker.len() {
        return None;
    }
    (from..=to - marker.len()).rev().find(|&i| chars[i..i + marker.len()] == *marker)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn rfind_in_respects_region_end() {
        let text = chars("ab. cd. ef");
        // ". " at 2 and 6; region ending at 7 cannot contain the second match fully
        assert_eq!(rfind_in(&text, &['.', ' '], 0, 7), Some(2));
        assert_eq!(rfind_in(&text, &['.', ' '], 0, 8), Some(6));
        assert_eq!(rfind_in(&text, &['.', ' '], 3, 6), None);
    }

    #[test]
    fn priority_beats_position() {
        // ".\n" sits closer to the end but ". " is tried first.
        let text = chars("one. two.\nthree");
        assert_eq!(find_boundary(&text, 0, text.len()), Some(5));
    }

    #[test]
    fn lower_priority_marker_used_when_higher_absent() {
        let text = chars("first!\nsecond?\nthird");
        assert_eq!(find_boundary(&text, 0, text.len()), Some(7));
    }
}
