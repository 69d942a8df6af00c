use anyhow::Result;
use tracing::{debug, error, info};

use docsage_core::config::Settings;
use docsage_core::{Chunker, ChunkingConfig, CollectionStats, Metadata, RawDocument, SearchResult};
use docsage_embed::get_embedder;
use docsage_vector::{open_store, VectorIndex};

pub mod prompt;

/// Chunk → embed → index on the way in, embed → nearest neighbours on the way out.
pub struct RetrievalPipeline {
    chunker: Chunker,
    index: VectorIndex,
}

impl RetrievalPipeline {
    /// Fails with `Error::InvalidConfig` when the chunking parameters are inconsistent.
    pub fn new(chunking: ChunkingConfig, index: VectorIndex) -> docsage_core::Result<Self> {
        Ok(Self { chunker: Chunker::new(chunking)?, index })
    }

    /// Wire embedder, store and chunker from validated settings.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        settings.validate()?;
        let embedder = get_embedder(&settings.embedding.model)?;
        let store = open_store(&settings.index, embedder.dim())?;
        Ok(Self::new(settings.chunking, VectorIndex::new(store, embedder))?)
    }

    /// Number of records added for `document`; 0 when it has no content, failed
    /// extraction, or the index rejected the write.
    pub fn ingest(&mut self, document: &RawDocument) -> usize {
        if !document.is_indexable() {
            debug!(source = %document.source, status = %document.status, "nothing to ingest");
            return 0;
        }
        let chunks = self.chunker.chunk(document);
        if chunks.is_empty() {
            return 0;
        }
        match self.index.try_insert(&chunks) {
            Ok(added) => {
                info!(source = %document.source, chunks = added, "ingested document");
                added
            }
            Err(e) => {
                error!(source = %document.source, error = %e, "ingest failed");
                0
            }
        }
    }

    pub fn ingest_all<'a>(&mut self, documents: impl IntoIterator<Item = &'a RawDocument>) -> usize {
        documents.into_iter().map(|d| self.ingest(d)).sum()
    }

    /// Ranked chunks for `question`; the raw question is the query text.
    pub fn answer_context(&self, question: &str, max_results: usize) -> Vec<SearchResult> {
        self.index.search(question, max_results, None)
    }

    pub fn search_filtered(&self, question: &str, max_results: usize, filter: &Metadata) -> Vec<SearchResult> {
        let filter = (!filter.is_empty()).then_some(filter);
        self.index.search(question, max_results, filter)
    }

    pub fn stats(&self) -> CollectionStats {
        self.index.stats()
    }

    pub fn reset(&mut self) -> bool {
        self.index.reset()
    }
}
