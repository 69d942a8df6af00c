use anyhow::Result;

use docsage_core::config::{IndexBackend, IndexConfig};
use docsage_core::VectorStore;

pub mod index;
pub mod lance;
pub mod memory;
pub mod schema;
pub mod table;

pub use index::VectorIndex;
pub use lance::LanceStore;
pub use memory::MemoryStore;

/// Open the store selected by `config.backend` for vectors of length `dim`.
pub fn open_store(config: &IndexConfig, dim: usize) -> Result<Box<dyn VectorStore>> {
    Ok(match config.backend {
        IndexBackend::Lance => {
            Box::new(LanceStore::open(&config.db_path(), &config.collection, dim)?)
        }
        IndexBackend::Memory => Box::new(MemoryStore::new(config.collection.clone())),
    })
}
