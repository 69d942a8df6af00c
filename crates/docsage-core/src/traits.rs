use crate::types::{IndexedRecord, Metadata, Neighbor};

/// Maps text to fixed-length vectors. Implementations must be deterministic for
/// a given `embedder_id` and always return `dim()` values per input.
pub trait Embedder: Send + Sync {
    fn embedder_id(&self) -> &str;
    fn dim(&self) -> usize;
    fn max_len(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;

    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])?
            .pop()
            .ok_or_else(|| anyhow::anyhow!("embedder '{}' returned no vector", self.embedder_id()))
    }
}

/// Add/query contract of a vector collection. Distances must be monotonic:
/// smaller means more similar.
pub trait VectorStore: Send + Sync {
    fn collection_name(&self) -> &str;
    fn add(&mut self, records: &[IndexedRecord]) -> anyhow::Result<()>;
    fn query(&self, vector: &[f32], limit: usize, filter: Option<&Metadata>) -> anyhow::Result<Vec<Neighbor>>;
    fn count(&self) -> anyhow::Result<usize>;
    /// Drop every record and leave an empty collection behind. Must be idempotent.
    fn reset(&mut self) -> anyhow::Result<()>;
}
