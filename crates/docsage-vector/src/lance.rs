//! Persistent `VectorStore` backed by a LanceDB table.
//!
//! One table per collection. The store owns a tokio runtime and drives the async
//! lancedb API with `block_on`, so it must not be used from inside another runtime.

use anyhow::{anyhow, ensure, Context, Result};
use arrow_array::types::Float32Type;
use arrow_array::{
    Array, FixedSizeListArray, Float32Array, RecordBatch, RecordBatchIterator, StringArray,
};
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{Connection, DistanceType};
use std::path::Path;
use std::sync::Arc;
use tokio::runtime::Runtime;
use tracing::{debug, info, warn};

use docsage_core::types::keys;
use docsage_core::{IndexedRecord, Metadata, Neighbor, VectorStore};

use crate::memory::matches_filter;
use crate::schema::{
    build_chunks_schema, COL_DISTANCE, COL_ID, COL_METADATA, COL_TEXT, COL_VECTOR, FILTER_COLUMNS,
};
use crate::table::{ensure_table, open_db, recreate_table, vector_dim};

pub struct LanceStore {
    rt: Runtime,
    db: Connection,
    table_name: String,
    dim: usize,
    /// Vector width of the table on disk; differs from `dim` after an embedder change
    /// until the collection is reset.
    table_dim: usize,
}

impl LanceStore {
    /// Open (or create) the collection table under `db_path` for vectors of length `dim`.
    ///
    /// An existing table built for another dimension is opened as-is: writes and
    /// queries fail until `reset` rebuilds it, while `count` and `reset` keep working.
    pub fn open(db_path: &Path, table_name: &str, dim: usize) -> Result<Self> {
        ensure!(dim > 0, "vector dimension must be positive");
        std::fs::create_dir_all(db_path)
            .with_context(|| format!("creating {}", db_path.display()))?;
        let rt = Runtime::new()?;
        let uri = db_path.to_string_lossy().to_string();
        let db = rt.block_on(open_db(&uri))?;
        rt.block_on(ensure_table(&db, table_name, build_chunks_schema(dim as i32)))?;
        let table_dim = rt
            .block_on(vector_dim(&db, table_name, COL_VECTOR))?
            .ok_or_else(|| anyhow!("table '{}' has no '{}' column", table_name, COL_VECTOR))?;
        if table_dim != dim {
            warn!(table = table_name, table_dim, dim, "collection dimension differs from embedder; reset required");
        }
        info!(db = %uri, table = table_name, dim, "opened lance collection");
        Ok(Self { rt, db, table_name: table_name.to_string(), dim, table_dim })
    }

    fn check_table_dim(&self) -> Result<()> {
        ensure!(
            self.table_dim == self.dim,
            "collection '{}' stores {}-dim vectors but the embedder produces {}; reset the collection",
            self.table_name,
            self.table_dim,
            self.dim
        );
        Ok(())
    }

    fn records_to_batch(&self, records: &[IndexedRecord]) -> Result<RecordBatch> {
        let schema = build_chunks_schema(self.dim as i32);
        let (mut ids, mut texts, mut metas) = (Vec::new(), Vec::new(), Vec::new());
        let (mut sources, mut statuses, mut doc_types) = (Vec::new(), Vec::new(), Vec::new());
        let mut vectors: Vec<Option<Vec<Option<f32>>>> = Vec::new();
        for r in records {
            ensure!(
                r.vector.len() == self.dim,
                "record {} has dimension {}, table expects {}",
                r.id,
                r.vector.len(),
                self.dim
            );
            ids.push(r.id.clone());
            texts.push(r.text.clone());
            metas.push(serde_json::to_string(&r.metadata)?);
            sources.push(r.metadata.get(keys::SOURCE).cloned());
            statuses.push(r.metadata.get(keys::STATUS).cloned());
            doc_types.push(r.metadata.get(keys::DOC_TYPE).cloned());
            vectors.push(Some(r.vector.iter().map(|&x| Some(x)).collect()));
        }
        let record_batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(ids)),
                Arc::new(StringArray::from(texts)),
                Arc::new(StringArray::from(sources)),
                Arc::new(StringArray::from(statuses)),
                Arc::new(StringArray::from(doc_types)),
                Arc::new(StringArray::from(metas)),
                Arc::new(FixedSizeListArray::from_iter_primitive::<Float32Type, _, _>(
                    vectors.into_iter(),
                    self.dim as i32,
                )),
            ],
        )?;
        Ok(record_batch)
    }
}

/// SQL predicate for the filter keys that have their own column; `None` if no key qualifies.
fn pushdown_predicate(filter: &Metadata) -> Option<String> {
    let clauses: Vec<String> = filter
        .iter()
        .filter(|(k, _)| FILTER_COLUMNS.contains(&k.as_str()))
        .map(|(k, v)| format!("{} = '{}'", k, v.replace('\'', "''")))
        .collect();
    if clauses.is_empty() {
        None
    } else {
        Some(clauses.join(" AND "))
    }
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| anyhow!("column '{}' missing", name))
}

fn batch_to_neighbors(batch: &RecordBatch, out: &mut Vec<Neighbor>) -> Result<()> {
    let ids = string_column(batch, COL_ID)?;
    let texts = string_column(batch, COL_TEXT)?;
    let metas = string_column(batch, COL_METADATA)?;
    let distances = batch
        .column_by_name(COL_DISTANCE)
        .and_then(|c| c.as_any().downcast_ref::<Float32Array>())
        .ok_or_else(|| anyhow!("column '{}' missing", COL_DISTANCE))?;
    for i in 0..batch.num_rows() {
        let metadata: Metadata = serde_json::from_str(metas.value(i))?;
        let distance = if distances.is_null(i) { 1.0 } else { distances.value(i).max(0.0) };
        out.push(Neighbor {
            id: ids.value(i).to_string(),
            text: texts.value(i).to_string(),
            metadata,
            distance,
        });
    }
    Ok(())
}

impl VectorStore for LanceStore {
    fn collection_name(&self) -> &str {
        &self.table_name
    }

    fn add(&mut self, records: &[IndexedRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        self.check_table_dim()?;
        let record_batch = self.records_to_batch(records)?;
        let schema = record_batch.schema();
        let reader = Box::new(RecordBatchIterator::new(vec![Ok(record_batch)].into_iter(), schema));
        self.rt.block_on(async {
            self.db.open_table(&self.table_name).execute().await?.add(reader).execute().await?;
            Ok::<_, anyhow::Error>(())
        })?;
        debug!(table = %self.table_name, rows = records.len(), "appended rows");
        Ok(())
    }

    /// Keys with their own column are pushed into the scan. Any other filter key is
    /// checked after the scan, so the scan then covers every row of the table.
    fn query(
        &self,
        vector: &[f32],
        limit: usize,
        filter: Option<&Metadata>,
    ) -> Result<Vec<Neighbor>> {
        ensure!(
            vector.len() == self.dim,
            "query has dimension {}, table expects {}",
            vector.len(),
            self.dim
        );
        if limit == 0 {
            return Ok(Vec::new());
        }
        let total = self.count()?;
        if total == 0 {
            return Ok(Vec::new());
        }
        self.check_table_dim()?;
        let predicate = filter.and_then(pushdown_predicate);
        let needs_post_filter =
            filter.is_some_and(|f| f.keys().any(|k| !FILTER_COLUMNS.contains(&k.as_str())));
        let fetch = if needs_post_filter { total } else { limit.min(total) };

        let mut neighbors = Vec::new();
        self.rt.block_on(async {
            let table = self.db.open_table(&self.table_name).execute().await?;
            let mut query = table
                .vector_search(vector.to_vec())?
                .distance_type(DistanceType::Cosine)
                .limit(fetch);
            if let Some(p) = &predicate {
                query = query.only_if(p.as_str());
            }
            let mut stream = query.execute().await?;
            while let Some(batch) = stream.try_next().await? {
                batch_to_neighbors(&batch, &mut neighbors)?;
            }
            Ok::<_, anyhow::Error>(())
        })?;

        neighbors.retain(|n| matches_filter(&n.metadata, filter));
        // stable: equal distances keep scan order
        neighbors.sort_by(|a, b| {
            a.distance.partial_cmp(&b.distance).unwrap_or(std::cmp::Ordering::Equal)
        });
        neighbors.truncate(limit);
        debug!(table = %self.table_name, hits = neighbors.len(), fetched = fetch, predicate = ?predicate, "vector query");
        Ok(neighbors)
    }

    fn count(&self) -> Result<usize> {
        self.rt.block_on(async {
            let table = self.db.open_table(&self.table_name).execute().await?;
            Ok(table.count_rows(None).await?)
        })
    }

    /// Drop the table and create it again, empty, for the current dimension.
    fn reset(&mut self) -> Result<()> {
        let schema = build_chunks_schema(self.dim as i32);
        self.rt.block_on(recreate_table(&self.db, &self.table_name, schema))?;
        self.table_dim = self.dim;
        info!(table = %self.table_name, dim = self.dim, "collection reset");
        Ok(())
    }
}
