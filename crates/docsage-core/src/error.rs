use thiserror::Error;

/// Failure taxonomy shared by every docsage crate.
///
/// `InvalidConfig` is fatal and surfaces at construction time. `Embedding` and
/// `Storage` are upstream failures: the vector index absorbs them into empty
/// results unless the caller asks for the fallible `try_*` variants.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error("Storage failed: {0}")]
    Storage(String),

    #[error("Source extraction failed: {0}")]
    Source(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
