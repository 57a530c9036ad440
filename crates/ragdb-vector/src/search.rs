use anyhow::{anyhow, Context, Result};
use arrow_array::{Array, Float32Array, Int32Array, RecordBatch, StringArray};
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{DistanceType, Table};
use std::path::{Path, PathBuf};

use ragdb_core::types::{Chunk, FileType, HeaderPath, SearchHit};
use crate::table::{open_dir, table_exists};

/// An opened chunks table living in its own directory.
#[derive(Clone)]
pub struct VectorCollection { path: PathBuf, table: Table }

impl std::fmt::Debug for VectorCollection {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("VectorCollection").field("path", &self.path).field("table", &self.table.name()).finish()
	}
}

impl VectorCollection {
	pub(crate) fn from_table(path: &Path, table: Table) -> Self {
		Self { path: path.to_path_buf(), table }
	}

	/// Open an existing collection; fails when the directory or table is missing.
	pub async fn open(path: &Path, table_name: &str) -> Result<Self> {
		if !path.is_dir() {
			return Err(anyhow!("vector collection not found at {}", path.display()));
		}
		let conn = open_dir(path).await?;
		if !table_exists(&conn, table_name).await? {
			return Err(anyhow!("vector collection at {} has no table '{}'", path.display(), table_name));
		}
		let table = conn.open_table(table_name).execute().await?;
		tracing::info!(path = %path.display(), table = table_name, "opened collection");
		Ok(Self::from_table(path, table))
	}

	pub fn path(&self) -> &Path { &self.path }

	pub async fn count_rows(&self) -> Result<usize> {
		Ok(self.table.count_rows(None).await?)
	}

	/// Nearest `k` chunks by cosine distance, best first. `score` is `1 - distance`.
	pub async fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>> {
		if k == 0 || self.count_rows().await? == 0 {
			return Ok(Vec::new());
		}
		let mut stream = self.table
			.vector_search(query.to_vec())?
			.distance_type(DistanceType::Cosine)
			.limit(k)
			.execute()
			.await
			.with_context(|| format!("vector search failed on {}", self.path.display()))?;
		let mut hits = Vec::new();
		while let Some(batch) = stream.try_next().await? {
			hits.extend(batch_to_hits(&batch)?);
		}
		hits.sort_by(|a, b| b.score.total_cmp(&a.score));
		hits.truncate(k);
		Ok(hits)
	}
}

fn strings<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
	batch.column_by_name(name).and_then(|c| c.as_any().downcast_ref::<StringArray>()).ok_or_else(|| anyhow!("missing {} column", name))
}

fn ints<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a Int32Array> {
	batch.column_by_name(name).and_then(|c| c.as_any().downcast_ref::<Int32Array>()).ok_or_else(|| anyhow!("missing {} column", name))
}

fn optional(col: &StringArray, i: usize) -> Option<String> {
	(!col.is_null(i)).then(|| col.value(i).to_string())
}

fn to_usize(v: i32) -> usize { usize::try_from(v).unwrap_or(0) }

/// Decode search result rows back into chunks.
pub fn batch_to_hits(batch: &RecordBatch) -> Result<Vec<SearchHit>> {
	let id = strings(batch, "id")?;
	let source = strings(batch, "source")?;
	let file_type = strings(batch, "file_type")?;
	let language = strings(batch, "language")?;
	let header_cols = [strings(batch, "header1")?, strings(batch, "header2")?, strings(batch, "header3")?, strings(batch, "header4")?];
	let content = strings(batch, "content")?;
	let chunk_index = ints(batch, "chunk_index")?;
	let total_chunks = ints(batch, "total_chunks")?;
	let start = ints(batch, "start")?;
	let overlap = ints(batch, "overlap")?;
	let distance = batch.column_by_name("_distance").and_then(|c| c.as_any().downcast_ref::<Float32Array>());

	let mut hits = Vec::with_capacity(batch.num_rows());
	for i in 0..batch.num_rows() {
		let label = file_type.value(i);
		let file_type = FileType::from_label(label).ok_or_else(|| anyhow!("unknown file_type '{}' in row {}", label, id.value(i)))?;
		let [h1, h2, h3, h4] = header_cols.map(|col| optional(col, i));
		let chunk = Chunk {
			id: id.value(i).to_string(),
			text: content.value(i).to_string(),
			source: source.value(i).to_string(),
			file_type,
			language: optional(language, i),
			headers: HeaderPath { header1: h1, header2: h2, header3: h3, header4: h4 },
			chunk_index: to_usize(chunk_index.value(i)),
			total_chunks: to_usize(total_chunks.value(i)),
			start: to_usize(start.value(i)),
			overlap: to_usize(overlap.value(i)),
		};
		let score = distance.map_or(0.0, |d| 1.0 - d.value(i));
		hits.push(SearchHit { chunk, score });
	}
	Ok(hits)
}
