//! LanceDB connection and table helpers.
use anyhow::{bail, Context, Result};
use arrow_array::RecordBatchIterator;
use lancedb::{connect, Connection, Table};
use std::path::Path;
use std::sync::Arc;

use crate::schema::{build_chunks_schema, vector_dim};

pub async fn open_db(uri: &str) -> Result<Connection> {
    Ok(connect(uri).execute().await?)
}

/// Connect to the database stored in `dir`.
pub async fn open_dir(dir: &Path) -> Result<Connection> {
    open_db(dir.to_string_lossy().as_ref())
        .await
        .with_context(|| format!("Failed to open vector database at {}", dir.display()))
}

pub async fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
    let names = conn.table_names().execute().await?;
    Ok(names.iter().any(|n| n == name))
}

pub async fn ensure_table(conn: &Connection, name: &str, schema: Arc<arrow_schema::Schema>) -> Result<()> {
    if table_exists(conn, name).await? {
        return Ok(());
    }
    // create empty table with 0 rows
    let iter = RecordBatchIterator::new(vec![].into_iter(), schema.clone());
    conn.create_table(name, Box::new(iter)).execute().await?;
    tracing::info!(table = name, "created table");
    Ok(())
}

/// Open (creating if needed) the chunks table and check its vector width.
pub async fn ensure_chunks_table(conn: &Connection, name: &str, dim: usize) -> Result<Table> {
    let dim = i32::try_from(dim).context("embedding dimension out of range")?;
    ensure_table(conn, name, build_chunks_schema(dim)).await?;
    let table = conn.open_table(name).execute().await?;
    let existing = vector_dim(&table.schema().await?);
    if existing != Some(dim) {
        bail!(
            "table '{}' stores {}-dimensional vectors but the embedder produces {}",
            name,
            existing.map_or_else(|| "no".to_string(), |d| d.to_string()),
            dim
        );
    }
    Ok(table)
}
