use docsage_core::{Chunker, ChunkingConfig, RawDocument};
use proptest::prelude::*;

fn chunker(chunk_size: usize, chunk_overlap: usize) -> Chunker {
    Chunker::new(ChunkingConfig { chunk_size, chunk_overlap: chunk_overlap.min(chunk_size - 1) }).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn split_never_panics(content in "\\PC{0,3000}", chunk_size in 1usize..1500, overlap in 0usize..1500) {
        let _ = chunker(chunk_size, overlap).split_text(&content);
    }

    #[test]
    fn chunks_stay_within_window_bound(content in "[a-z .!?\n]{1,4000}", chunk_size in 1usize..800, overlap in 0usize..400) {
        for piece in chunker(chunk_size, overlap).split_text(&content) {
            prop_assert!(piece.chars().count() <= chunk_size + 100);
            prop_assert!(!piece.is_empty());
        }
    }

    #[test]
    fn short_content_is_single_trimmed_chunk(content in "[a-zA-Z .\n]{1,200}") {
        let pieces = chunker(200, 20).split_text(&content);
        let trimmed = content.trim();
        if trimmed.is_empty() {
            prop_assert!(pieces.is_empty());
        } else {
            prop_assert_eq!(pieces, vec![trimmed.to_string()]);
        }
    }

    #[test]
    fn indices_are_contiguous(content in "[a-z. ]{1,3000}", chunk_size in 50usize..500) {
        let doc = RawDocument::new("notes.txt", content);
        let chunks = chunker(chunk_size, chunk_size / 5).chunk(&doc);
        for (i, c) in chunks.iter().enumerate() {
            prop_assert_eq!(c.chunk_index, i);
            prop_assert_eq!(c.total_chunks, chunks.len());
            prop_assert!(c.chunk_index < c.total_chunks);
        }
    }
}
