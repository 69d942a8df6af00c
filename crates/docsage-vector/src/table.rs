//! LanceDB connection and table housekeeping helpers.
use anyhow::Result;
use arrow_array::RecordBatchIterator;
use arrow_schema::DataType;
use lancedb::{connect, Connection};
use std::sync::Arc;

pub async fn open_db(uri: &str) -> Result<Connection> {
    Ok(connect(uri).execute().await?)
}

pub async fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
    Ok(conn.table_names().execute().await?.iter().any(|n| n == name))
}

pub async fn ensure_table(
    conn: &Connection,
    name: &str,
    schema: Arc<arrow_schema::Schema>,
) -> Result<()> {
    if table_exists(conn, name).await? {
        return Ok(());
    }
    // create empty table with 0 rows
    let iter = RecordBatchIterator::new(vec![].into_iter(), schema.clone());
    conn.create_table(name, Box::new(iter)).execute().await?;
    Ok(())
}

/// Drop `name` if present and create it again, empty, with `schema`.
pub async fn recreate_table(
    conn: &Connection,
    name: &str,
    schema: Arc<arrow_schema::Schema>,
) -> Result<()> {
    if table_exists(conn, name).await? {
        conn.drop_table(name, &[]).await?;
    }
    ensure_table(conn, name, schema).await
}

/// Length of the fixed-size list column `column`; `None` when it is missing or not a list.
pub async fn vector_dim(conn: &Connection, name: &str, column: &str) -> Result<Option<usize>> {
    let schema = conn.open_table(name).execute().await?.schema().await?;
    Ok(schema.field_with_name(column).ok().and_then(|f| match f.data_type() {
        DataType::FixedSizeList(_, n) => usize::try_from(*n).ok(),
        _ => None,
    }))
}
