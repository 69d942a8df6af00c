use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use docsage_core::types::keys;
use docsage_core::{Chunker, Embedder, Error, IndexedRecord, Metadata, Neighbor, RawDocument, VectorStore};
use docsage_embed::HashEmbedder;
use docsage_vector::{MemoryStore, VectorIndex};

/// Hash embedder that counts how many texts it was asked to embed.
struct CountingEmbedder {
    inner: HashEmbedder,
    calls: Arc<AtomicUsize>,
}

impl Embedder for CountingEmbedder {
    fn embedder_id(&self) -> &str { self.inner.embedder_id() }
    fn dim(&self) -> usize { self.inner.dim() }
    fn max_len(&self) -> usize { self.inner.max_len() }
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(texts.len(), Ordering::SeqCst);
        self.inner.embed_batch(texts)
    }
}

struct WrongDimEmbedder;

impl Embedder for WrongDimEmbedder {
    fn embedder_id(&self) -> &str { "wrong" }
    fn dim(&self) -> usize { 8 }
    fn max_len(&self) -> usize { 128 }
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|_| vec![1.0; 4]).collect())
    }
}

struct FailingStore;

impl VectorStore for FailingStore {
    fn collection_name(&self) -> &str { "broken" }
    fn add(&mut self, _records: &[IndexedRecord]) -> anyhow::Result<()> { anyhow::bail!("disk full") }
    fn query(&self, _vector: &[f32], _limit: usize, _filter: Option<&Metadata>) -> anyhow::Result<Vec<Neighbor>> { anyhow::bail!("unreachable backend") }
    fn count(&self) -> anyhow::Result<usize> { anyhow::bail!("unreachable backend") }
    fn reset(&mut self) -> anyhow::Result<()> { anyhow::bail!("read-only") }
}

fn counting_index() -> (VectorIndex, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let embedder = CountingEmbedder { inner: HashEmbedder::new(64), calls: calls.clone() };
    (VectorIndex::new(Box::new(MemoryStore::new("documentation_chunks")), Box::new(embedder)), calls)
}

fn chunks_of(source: &str, text: &str) -> Vec<docsage_core::Chunk> {
    Chunker::default().chunk(&RawDocument::new(source, text))
}

#[test]
fn insert_then_exact_query_scores_highest() {
    let (mut index, _) = counting_index();
    assert!(index.insert(&chunks_of("install.md", "Install the tool with cargo install docsage.")));
    assert!(index.insert(&chunks_of("config.md", "Configuration lives in config.toml next to the binary.")));
    assert!(index.insert(&chunks_of("faq.txt", "Quarterly numbers are not covered by this documentation.")));

    let results = index.search("Configuration lives in config.toml next to the binary.", 3, None);
    assert_eq!(results.len(), 3);
    assert_eq!(results[0].source(), Some("config.md"));
    assert!((results[0].score - 1.0).abs() < 1e-4);
    assert!(results.windows(2).all(|w| w[0].distance <= w[1].distance));
    for r in &results {
        assert!((r.score - (1.0 - r.distance)).abs() < 1e-6);
        assert!(r.distance >= 0.0);
    }
}

#[test]
fn empty_query_skips_embedder() {
    let (mut index, calls) = counting_index();
    index.insert(&chunks_of("a.md", "Some text."));
    let before = calls.load(Ordering::SeqCst);
    assert!(index.search("", 5, None).is_empty());
    assert_eq!(calls.load(Ordering::SeqCst), before);
}

#[test]
fn whitespace_query_is_still_searched() {
    let (mut index, calls) = counting_index();
    index.insert(&chunks_of("a.md", "Some text."));
    let before = calls.load(Ordering::SeqCst);
    assert_eq!(index.search("   ", 5, None).len(), 1);
    assert_eq!(calls.load(Ordering::SeqCst), before + 1);
}

#[test]
fn empty_chunks_are_skipped() {
    let (mut index, calls) = counting_index();
    assert!(!index.insert(&[]));
    let mut blank = chunks_of("a.md", "text");
    blank[0].content = String::new();
    assert!(!index.insert(&blank));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(index.stats().total_documents, 0);

    // only an empty string counts as empty
    blank[0].content = "   ".to_string();
    assert!(index.insert(&blank));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(index.stats().total_documents, 1);
}

#[test]
fn filter_matches_every_key() {
    let (mut index, _) = counting_index();
    index.insert(&chunks_of("a.md", "Shared words about setup."));
    index.insert(&chunks_of("b.html", "Shared words about setup."));

    let mut filter = Metadata::new();
    filter.insert(keys::SOURCE.to_string(), "b.html".to_string());
    let hits = index.search("setup", 10, Some(&filter));
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].metadata[keys::DOC_TYPE], "html");

    filter.insert(keys::DOC_TYPE.to_string(), "markdown".to_string());
    assert!(index.search("setup", 10, Some(&filter)).is_empty());
}

#[test]
fn equal_distances_keep_insertion_order() {
    let (mut index, _) = counting_index();
    for source in ["first.txt", "second.txt", "third.txt"] {
        index.insert(&chunks_of(source, "identical body"));
    }
    let sources: Vec<_> = index.search("identical body", 3, None).iter().map(|r| r.source().unwrap_or_default().to_string()).collect();
    assert_eq!(sources, vec!["first.txt", "second.txt", "third.txt"]);
}

#[test]
fn stats_and_reset() {
    let (mut index, _) = counting_index();
    index.insert(&chunks_of("a.md", "One."));
    index.insert(&chunks_of("b.md", "Two."));
    let stats = index.stats();
    assert_eq!(stats.total_documents, 2);
    assert_eq!(stats.collection_name, "documentation_chunks");
    assert_eq!(stats.embedding_model, "hash:64");

    assert!(index.reset());
    assert_eq!(index.stats().total_documents, 0);
    assert!(index.reset(), "reset is idempotent");
    assert!(index.search("One.", 5, None).is_empty());
}

#[test]
fn upstream_failures_degrade_to_empty() {
    let mut index = VectorIndex::new(Box::new(FailingStore), Box::new(HashEmbedder::new(16)));
    assert!(!index.insert(&chunks_of("a.md", "text")));
    assert!(index.search("text", 5, None).is_empty());
    assert!(!index.reset());
    assert_eq!(index.stats().total_documents, 0);

    assert!(matches!(index.try_insert(&chunks_of("a.md", "text")), Err(Error::Storage(_))));
    assert!(matches!(index.try_search("text", 5, None), Err(Error::Storage(_))));
    assert!(matches!(index.try_reset(), Err(Error::Storage(_))));
}

#[test]
fn dimension_mismatch_is_an_embedding_failure() {
    let mut index = VectorIndex::new(Box::new(MemoryStore::new("c")), Box::new(WrongDimEmbedder));
    assert!(matches!(index.try_insert(&chunks_of("a.md", "text")), Err(Error::Embedding(_))));
    assert!(!index.insert(&chunks_of("a.md", "text")));
    assert_eq!(index.stats().total_documents, 0);
}
