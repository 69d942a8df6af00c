use tracing::{error, info, warn};
use uuid::Uuid;

use docsage_core::{
    Chunk, CollectionStats, Embedder, Error, IndexedRecord, Metadata, Result, SearchResult,
    VectorStore,
};

/// Texts are sent to the embedder in slices of this size.
const EMBED_BATCH: usize = 32;

/// Embedding-backed index over a `VectorStore`.
///
/// The plain methods (`insert`, `search`, `stats`, `reset`) never fail: embedding and
/// storage errors are logged and turned into `false` or an empty result. The `try_*`
/// twins return them instead.
pub struct VectorIndex {
    store: Box<dyn VectorStore>,
    embedder: Box<dyn Embedder>,
}

impl VectorIndex {
    pub fn new(store: Box<dyn VectorStore>, embedder: Box<dyn Embedder>) -> Self {
        Self { store, embedder }
    }

    fn embed_all(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for batch in texts.chunks(EMBED_BATCH) {
            let vectors =
                self.embedder.embed_batch(batch).map_err(|e| Error::Embedding(e.to_string()))?;
            if vectors.len() != batch.len() {
                return Err(Error::Embedding(format!(
                    "expected {} vectors, got {}",
                    batch.len(),
                    vectors.len()
                )));
            }
            out.extend(vectors);
        }
        if let Some(bad) = out.iter().find(|v| v.len() != self.embedder.dim()) {
            return Err(Error::Embedding(format!(
                "embedder '{}' returned dimension {}, declared {}",
                self.embedder.embedder_id(),
                bad.len(),
                self.embedder.dim()
            )));
        }
        Ok(out)
    }

    /// Embed and store every chunk with content; returns how many records were added.
    pub fn try_insert(&mut self, chunks: &[Chunk]) -> Result<usize> {
        let kept: Vec<&Chunk> = chunks
            .iter()
            .filter(|c| {
                let empty = c.content.is_empty();
                if empty {
                    warn!(source = %c.source, chunk_index = c.chunk_index, "skipping empty chunk");
                }
                !empty
            })
            .collect();
        if kept.is_empty() {
            return Ok(0);
        }
        let texts: Vec<String> = kept.iter().map(|c| c.content.clone()).collect();
        let vectors = self.embed_all(&texts)?;
        let records: Vec<IndexedRecord> = kept
            .iter()
            .zip(vectors)
            .map(|(c, vector)| IndexedRecord {
                id: Uuid::new_v4().to_string(),
                vector,
                text: c.content.clone(),
                metadata: c.flatten_metadata(),
            })
            .collect();
        self.store.add(&records).map_err(|e| Error::Storage(e.to_string()))?;
        info!(collection = self.store.collection_name(), added = records.len(), "indexed chunks");
        Ok(records.len())
    }

    /// `true` when at least one record was stored.
    pub fn insert(&mut self, chunks: &[Chunk]) -> bool {
        match self.try_insert(chunks) {
            Ok(added) => added > 0,
            Err(e) => {
                error!(error = %e, chunks = chunks.len(), "insert failed");
                false
            }
        }
    }

    /// Results in ascending distance; `score = 1 - distance`. An empty query or a zero
    /// limit returns nothing without touching the embedder.
    pub fn try_search(
        &self,
        query: &str,
        limit: usize,
        filter: Option<&Metadata>,
    ) -> Result<Vec<SearchResult>> {
        if query.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }
        let vector = self
            .embed_all(&[query.to_string()])?
            .pop()
            .ok_or_else(|| Error::Embedding("no query vector".to_string()))?;
        let neighbors =
            self.store.query(&vector, limit, filter).map_err(|e| Error::Storage(e.to_string()))?;
        let results: Vec<SearchResult> =
            neighbors.into_iter().map(SearchResult::from_neighbor).collect();
        info!(collection = self.store.collection_name(), limit, hits = results.len(), "search");
        Ok(results)
    }

    pub fn search(
        &self,
        query: &str,
        limit: usize,
        filter: Option<&Metadata>,
    ) -> Vec<SearchResult> {
        self.try_search(query, limit, filter).unwrap_or_else(|e| {
            error!(error = %e, "search failed");
            Vec::new()
        })
    }

    pub fn try_stats(&self) -> Result<CollectionStats> {
        let total_documents = self.store.count().map_err(|e| Error::Storage(e.to_string()))?;
        Ok(CollectionStats {
            total_documents,
            collection_name: self.store.collection_name().to_string(),
            embedding_model: self.embedder.embedder_id().to_string(),
        })
    }

    /// Stats with `total_documents = 0` when the store cannot be counted.
    pub fn stats(&self) -> CollectionStats {
        self.try_stats().unwrap_or_else(|e| {
            error!(error = %e, "stats failed");
            CollectionStats {
                total_documents: 0,
                collection_name: self.store.collection_name().to_string(),
                embedding_model: self.embedder.embedder_id().to_string(),
            }
        })
    }

    pub fn try_reset(&mut self) -> Result<()> {
        self.store.reset().map_err(|e| Error::Storage(e.to_string()))?;
        info!(collection = self.store.collection_name(), "index reset");
        Ok(())
    }

    pub fn reset(&mut self) -> bool {
        match self.try_reset() {
            Ok(()) => true,
            Err(e) => {
                error!(error = %e, "reset failed");
                false
            }
        }
    }
}
