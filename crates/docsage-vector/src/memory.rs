//! In-process vector store: brute-force cosine distance over a `Vec` of records.
//! Nothing is persisted; used for tests and `index.backend = "memory"`.

use docsage_core::{IndexedRecord, Metadata, Neighbor, VectorStore};

/// Cosine distance in `[0, 2]`; a zero-magnitude vector is treated as orthogonal to everything.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    (1.0 - dot / (norm_a * norm_b)).clamp(0.0, 2.0)
}

pub fn matches_filter(metadata: &Metadata, filter: Option<&Metadata>) -> bool {
    filter.map_or(true, |f| f.iter().all(|(k, v)| metadata.get(k) == Some(v)))
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    collection: String,
    records: Vec<IndexedRecord>,
}

impl MemoryStore {
    pub fn new(collection: impl Into<String>) -> Self {
        Self { collection: collection.into(), records: Vec::new() }
    }
}

impl VectorStore for MemoryStore {
    fn collection_name(&self) -> &str {
        &self.collection
    }

    fn add(&mut self, records: &[IndexedRecord]) -> anyhow::Result<()> {
        self.records.extend_from_slice(records);
        Ok(())
    }

    fn query(
        &self,
        vector: &[f32],
        limit: usize,
        filter: Option<&Metadata>,
    ) -> anyhow::Result<Vec<Neighbor>> {
        let mut scored: Vec<(f32, &IndexedRecord)> = self
            .records
            .iter()
            .filter(|r| matches_filter(&r.metadata, filter))
            .map(|r| (cosine_distance(vector, &r.vector), r))
            .collect();
        // stable sort keeps insertion order among equal distances
        scored.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        Ok(scored
            .into_iter()
            .take(limit)
            .map(|(distance, r)| Neighbor {
                id: r.id.clone(),
                text: r.text.clone(),
                metadata: r.metadata.clone(),
                distance,
            })
            .collect())
    }

    fn count(&self) -> anyhow::Result<usize> {
        Ok(self.records.len())
    }

    fn reset(&mut self) -> anyhow::Result<()> {
        self.records.clear();
        Ok(())
    }
}
