//! Domain types shared by the chunker, the vector index and the pipeline.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

pub type RecordId = String;
pub type Metadata = BTreeMap<String, String>;

/// Well-known metadata keys written by the chunker and the index.
pub mod keys {
    pub const SOURCE: &str = "source";
    pub const STATUS: &str = "status";
    pub const CHUNK_INDEX: &str = "chunk_index";
    pub const TOTAL_CHUNKS: &str = "total_chunks";
    pub const DOC_TYPE: &str = "doc_type";
    pub const ORIGINAL_LENGTH: &str = "original_length";
    pub const CHUNK_LENGTH: &str = "chunk_length";
    pub const INGESTED_AT: &str = "ingested_at";
    pub const URL: &str = "url";
    pub const CONTENT_TYPE: &str = "content_type";
}

/// Outcome of extracting a document from its source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocStatus {
    Success,
    UnsupportedFormat(String),
    Error(String),
}

impl DocStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, DocStatus::Success)
    }
}

impl fmt::Display for DocStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocStatus::Success => f.write_str("success"),
            DocStatus::UnsupportedFormat(ext) => write!(f, "Unsupported format: {ext}"),
            DocStatus::Error(reason) => write!(f, "Error: {reason}"),
        }
    }
}

/// Normalized output of a document source: plain text plus provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDocument {
    pub source: String,
    pub content: String,
    pub status: DocStatus,
    pub metadata: Metadata,
}

impl RawDocument {
    pub fn new(source: impl Into<String>, content: impl Into<String>) -> Self {
        Self { source: source.into(), content: content.into(), status: DocStatus::Success, metadata: Metadata::new() }
    }

    pub fn unsupported(source: impl Into<String>, extension: impl Into<String>) -> Self {
        Self { source: source.into(), content: String::new(), status: DocStatus::UnsupportedFormat(extension.into()), metadata: Metadata::new() }
    }

    pub fn failed(source: impl Into<String>, reason: impl Into<String>) -> Self {
        Self { source: source.into(), content: String::new(), status: DocStatus::Error(reason.into()), metadata: Metadata::new() }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// A document is worth chunking only if extraction succeeded and produced text.
    pub fn is_indexable(&self) -> bool {
        self.status.is_success() && !self.content.is_empty()
    }
}

/// Coarse document classification derived from the source string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocType {
    Markdown,
    Html,
    Pdf,
    ApiSpec,
    Config,
    Web,
    Text,
}

impl DocType {
    /// Classify by substring of the lower-cased source; the first matching rule wins.
    pub fn classify(source: &str) -> Self {
        let s = source.to_lowercase();
        if [".md", ".markdown"].iter().any(|ext| s.contains(ext)) {
            DocType::Markdown
        } else if [".html", ".htm"].iter().any(|ext| s.contains(ext)) {
            DocType::Html
        } else if s.contains(".pdf") {
            DocType::Pdf
        } else if [".json", ".yaml", ".yml"].iter().any(|ext| s.contains(ext)) {
            if s.contains("openapi") || s.contains("swagger") { DocType::ApiSpec } else { DocType::Config }
        } else if s.starts_with("http") {
            DocType::Web
        } else {
            DocType::Text
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DocType::Markdown => "markdown",
            DocType::Html => "html",
            DocType::Pdf => "pdf",
            DocType::ApiSpec => "api_spec",
            DocType::Config => "config",
            DocType::Web => "web",
            DocType::Text => "text",
        }
    }
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "markdown" => Ok(DocType::Markdown),
            "html" => Ok(DocType::Html),
            "pdf" => Ok(DocType::Pdf),
            "api_spec" => Ok(DocType::ApiSpec),
            "config" => Ok(DocType::Config),
            "web" => Ok(DocType::Web),
            "text" => Ok(DocType::Text),
            other => Err(Error::NotFound(format!("doc type '{other}'"))),
        }
    }
}

/// Explicit per-chunk metadata. `extra` carries whatever the source attached to
/// the parent document; the two lengths are counted in characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub original_length: usize,
    pub chunk_length: usize,
    pub extra: Metadata,
}

/// A bounded slice of a source document that is independently embedded and indexed.
///
/// - `chunk_index`/`total_chunks`: position within the parent document
/// - `doc_type`: classification of `source`
/// - `metadata`: explicit fields that win over the derived ones when flattened
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub content: String,
    pub source: String,
    pub status: DocStatus,
    pub chunk_index: usize,
    pub total_chunks: usize,
    pub doc_type: DocType,
    pub metadata: ChunkMetadata,
}

impl Chunk {
    /// Flat metadata as stored next to the vector. Derived chunk-level fields go
    /// in first, then inherited document metadata, then the explicit lengths, so
    /// later layers overwrite earlier ones on key collisions.
    pub fn flatten_metadata(&self) -> Metadata {
        let mut out = Metadata::new();
        out.insert(keys::SOURCE.to_string(), self.source.clone());
        out.insert(keys::STATUS.to_string(), self.status.to_string());
        out.insert(keys::CHUNK_INDEX.to_string(), self.chunk_index.to_string());
        out.insert(keys::TOTAL_CHUNKS.to_string(), self.total_chunks.to_string());
        out.insert(keys::DOC_TYPE.to_string(), self.doc_type.to_string());
        out.extend(self.metadata.extra.iter().map(|(k, v)| (k.clone(), v.clone())));
        out.insert(keys::ORIGINAL_LENGTH.to_string(), self.metadata.original_length.to_string());
        out.insert(keys::CHUNK_LENGTH.to_string(), self.metadata.chunk_length.to_string());
        out
    }
}

/// A stored record: owned by the vector store, never mutated, removed only by reset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedRecord {
    pub id: RecordId,
    pub vector: Vec<f32>,
    pub text: String,
    pub metadata: Metadata,
}

/// Raw nearest-neighbour hit returned by a `VectorStore`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub id: RecordId,
    pub text: String,
    pub metadata: Metadata,
    pub distance: f32,
}

/// Ranked retrieval result handed to prompt construction.
///
/// `score` is `1 - distance`; higher is always better.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub content: String,
    pub metadata: Metadata,
    pub score: f32,
    pub distance: f32,
}

impl SearchResult {
    pub fn from_neighbor(n: Neighbor) -> Self {
        Self { score: 1.0 - n.distance, distance: n.distance, content: n.text, metadata: n.metadata }
    }

    pub fn source(&self) -> Option<&str> {
        self.metadata.get(keys::SOURCE).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionStats {
    pub total_documents: usize,
    pub collection_name: String,
    pub embedding_model: String,
}
