use anyhow::{ensure, Context, Result};
use arrow_array::{FixedSizeListArray, Int32Array, RecordBatch, RecordBatchIterator, StringArray, TimestampMillisecondArray};
use chrono::Utc;
use lancedb::Table;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use ragdb_core::types::Chunk;
use crate::schema::build_chunks_schema;

fn hash_content(s: &str) -> String {
	blake3::hash(s.as_bytes()).to_hex().to_string()
}

static WRITERS: AtomicU64 = AtomicU64::new(0);

/// Short tag distinguishing rows written by different ingest runs, so that
/// files sharing a relative path keep separate ids within one table.
fn run_tag() -> String {
	let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
	let seq = WRITERS.fetch_add(1, Ordering::Relaxed);
	let seed = format!("{}:{}:{}", std::process::id(), nanos, seq);
	blake3::hash(seed.as_bytes()).to_hex().as_str()[..12].to_string()
}

fn to_i32(v: usize, what: &str) -> Result<i32> {
	i32::try_from(v).with_context(|| format!("{} {} does not fit the table column", what, v))
}

/// Appends embedded chunks to a chunks table.
///
/// Row ids are the chunk id suffixed with the writer's run tag:
/// `{source}:{chunk_index}:{run}`.
pub struct ChunkWriter { table: Table, dim: i32, run: String }

impl ChunkWriter {
	pub fn new(table: Table, dim: usize) -> Result<Self> {
		Ok(Self { table, dim: to_i32(dim, "dimension")?, run: run_tag() })
	}

	pub fn run(&self) -> &str { &self.run }

	pub async fn append(&self, chunks: &[Chunk], vectors: &[Vec<f32>]) -> Result<()> {
		if chunks.is_empty() { return Ok(()); }
		let record_batch = self.to_record_batch(chunks, vectors)?;
		let schema = record_batch.schema();
		let reader = Box::new(RecordBatchIterator::new(vec![Ok(record_batch)].into_iter(), schema));
		self.table.add(reader).execute().await?;
		Ok(())
	}

	pub fn to_record_batch(&self, chunks: &[Chunk], vectors: &[Vec<f32>]) -> Result<RecordBatch> {
		ensure!(chunks.len() == vectors.len(), "chunks ({}) and vectors ({}) length must match", chunks.len(), vectors.len());
		let now = Utc::now().timestamp_millis();
		let mut ids = Vec::with_capacity(chunks.len());
		let mut sources = Vec::with_capacity(chunks.len());
		let mut file_types = Vec::with_capacity(chunks.len());
		let mut languages: Vec<Option<String>> = Vec::with_capacity(chunks.len());
		let mut headers: [Vec<Option<String>>; 4] = Default::default();
		let mut contents = Vec::with_capacity(chunks.len());
		let mut chunk_indices = Vec::with_capacity(chunks.len());
		let mut total_chunks = Vec::with_capacity(chunks.len());
		let mut starts = Vec::with_capacity(chunks.len());
		let mut overlaps = Vec::with_capacity(chunks.len());
		let mut content_hashes = Vec::with_capacity(chunks.len());
		let mut vector_rows: Vec<Option<Vec<Option<f32>>>> = Vec::with_capacity(chunks.len());
		for (chunk, vector) in chunks.iter().zip(vectors) {
			ensure!(vector.len() == self.dim as usize, "vector for {} has {} dims, expected {}", chunk.id, vector.len(), self.dim);
			ids.push(format!("{}:{}", chunk.id, self.run));
			sources.push(chunk.source.clone());
			file_types.push(chunk.file_type.as_str().to_string());
			languages.push(chunk.language.clone());
			for (column, value) in headers.iter_mut().zip(chunk.headers.levels()) {
				column.push(value.clone());
			}
			contents.push(chunk.text.clone());
			chunk_indices.push(to_i32(chunk.chunk_index, "chunk_index")?);
			total_chunks.push(to_i32(chunk.total_chunks, "total_chunks")?);
			starts.push(to_i32(chunk.start, "start")?);
			overlaps.push(to_i32(chunk.overlap, "overlap")?);
			content_hashes.push(hash_content(&chunk.text));
			vector_rows.push(Some(vector.iter().map(|&x| Some(x)).collect()));
		}
		let [h1, h2, h3, h4] = headers;
		let ingested_at = vec![now; chunks.len()];
		let record_batch = RecordBatch::try_new(build_chunks_schema(self.dim), vec![
			Arc::new(StringArray::from(ids)),
			Arc::new(StringArray::from(sources)),
			Arc::new(StringArray::from(file_types)),
			Arc::new(StringArray::from(languages)),
			Arc::new(StringArray::from(h1)),
			Arc::new(StringArray::from(h2)),
			Arc::new(StringArray::from(h3)),
			Arc::new(StringArray::from(h4)),
			Arc::new(StringArray::from(contents)),
			Arc::new(Int32Array::from(chunk_indices)),
			Arc::new(Int32Array::from(total_chunks)),
			Arc::new(Int32Array::from(starts)),
			Arc::new(Int32Array::from(overlaps)),
			Arc::new(StringArray::from(content_hashes)),
			Arc::new(TimestampMillisecondArray::from(ingested_at)),
			Arc::new(FixedSizeListArray::from_iter_primitive::<arrow_array::types::Float32Type, _, _>(vector_rows.into_iter(), self.dim)),
		])?;
		Ok(record_batch)
	}
}
