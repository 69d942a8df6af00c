use anyhow::{anyhow, bail, Result};
use std::path::{Path, PathBuf};
use tracing::info;

use docsage_core::Embedder;

pub mod device;
pub mod hash;
pub mod pool;
pub mod sentence;
pub mod tokenize;

pub use hash::{HashEmbedder, DEFAULT_HASH_DIM};
pub use pool::masked_mean_l2;
pub use sentence::SentenceEmbedder;

/// Build the embedder named by `identifier`:
/// - `hash` / `hash:<dim>`: deterministic `HashEmbedder`
/// - anything else: a `SentenceEmbedder` loaded from the resolved model directory
///
/// `APP_USE_FAKE_EMBEDDINGS=1` swaps model identifiers for the hash embedder, which
/// keeps tests and offline runs free of model files.
pub fn get_embedder(identifier: &str) -> Result<Box<dyn Embedder>> {
    if let Some(dim) = parse_hash_identifier(identifier)? {
        return Ok(Box::new(HashEmbedder::new(dim)));
    }
    if use_fake_embeddings() {
        info!(requested = identifier, "APP_USE_FAKE_EMBEDDINGS set, using hash embedder");
        return Ok(Box::new(HashEmbedder::default()));
    }
    let dir = resolve_model_dir(identifier)?;
    Ok(Box::new(SentenceEmbedder::load(identifier, &dir)?))
}

fn use_fake_embeddings() -> bool {
    std::env::var("APP_USE_FAKE_EMBEDDINGS").ok().map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(false)
}

/// `Some(dim)` for `hash` and `hash:<dim>`, `None` for any other identifier.
pub fn parse_hash_identifier(identifier: &str) -> Result<Option<usize>> {
    match identifier.split_once(':') {
        None if identifier == "hash" => Ok(Some(DEFAULT_HASH_DIM)),
        Some(("hash", dim)) => match dim.parse::<usize>() {
            Ok(d) if d > 0 => Ok(Some(d)),
            _ => bail!("invalid hash embedder dimension '{}'", dim),
        },
        _ => Ok(None),
    }
}

/// Model directory lookup order: `identifier` as a path, `APP_MODEL_DIR`, `MODEL_DIR`,
/// then `models/<identifier>` and `../models/<identifier>`.
pub fn resolve_model_dir(identifier: &str) -> Result<PathBuf> {
    let direct = PathBuf::from(identifier);
    if direct.is_dir() {
        return Ok(direct);
    }
    for var in ["APP_MODEL_DIR", "MODEL_DIR"] {
        if let Ok(dir) = std::env::var(var) {
            let p = PathBuf::from(&dir);
            if p.join(identifier).is_dir() {
                return Ok(p.join(identifier));
            }
            if p.join("config.json").exists() {
                info!(var, dir = %p.display(), "using model dir from env");
                return Ok(p);
            }
        }
    }
    for root in ["models", "../models"] {
        let p = Path::new(root).join(identifier);
        if p.is_dir() {
            info!(dir = %p.display(), "using model dir");
            return Ok(p);
        }
    }
    Err(anyhow!(
        "Could not locate model directory for '{}' (set APP_MODEL_DIR or use embedding.model = \"hash\")",
        identifier
    ))
}
