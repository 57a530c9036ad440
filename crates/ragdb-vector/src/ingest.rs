//! Directory → embedded chunks → collection.
use anyhow::{ensure, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};

use ragdb_core::config::RagConfig;
use ragdb_core::data_processor::{ChunkingConfig, DataProcessor, ProcessReport};
use ragdb_core::traits::Embedder;

use crate::search::VectorCollection;
use crate::table::{ensure_chunks_table, open_dir};
use crate::writer::ChunkWriter;

#[derive(Debug, Clone)]
pub struct IngestReport {
    pub files: ProcessReport,
    pub chunks: usize,
    pub collection_path: PathBuf,
    pub table: String,
    /// Tag appended to every row id written by this run.
    pub run: String,
}

fn progress_bar(len: usize) -> Result<ProgressBar> {
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({percent}%) {msg}")?
            .progress_chars("#>-"),
    );
    Ok(pb)
}

/// Chunk every supported file under `content_dir`, embed the chunks and append
/// them to the collection at `collection_path`, creating it if needed.
pub async fn ingest_directory(
    embedder: &dyn Embedder,
    config: &RagConfig,
    content_dir: &Path,
    collection_path: &Path,
) -> Result<(IngestReport, VectorCollection)> {
    config.validate()?;
    let processor = DataProcessor::with_config(ChunkingConfig {
        chunk_size: config.ingest.chunk_size,
        chunk_overlap: config.ingest.chunk_overlap,
    });
    let corpus = processor.process_directory(content_dir)?;

    println!("Creating vector database with {} document chunks...", corpus.chunks.len());
    std::fs::create_dir_all(collection_path)
        .with_context(|| format!("Failed to create {}", collection_path.display()))?;
    let conn = open_dir(collection_path).await?;
    let table_name = config.vector.table.as_str();
    let table = ensure_chunks_table(&conn, table_name, embedder.dim()).await?;
    let writer = ChunkWriter::new(table.clone(), embedder.dim())?;
    tracing::info!(run = writer.run(), table = table_name, chunks = corpus.chunks.len(), "ingesting");

    let pb = progress_bar(corpus.chunks.len())?;
    for batch in corpus.chunks.chunks(config.ingest.batch_size) {
        let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
        let vectors = embedder.embed_batch(&texts)?;
        ensure!(vectors.len() == batch.len(), "embedder returned {} vectors for {} chunks", vectors.len(), batch.len());
        writer.append(batch, &vectors).await?;
        pb.inc(batch.len() as u64);
    }
    pb.finish_and_clear();
    println!("Vector database created and persisted to {}", collection_path.display());

    let report = IngestReport {
        files: corpus.report,
        chunks: corpus.chunks.len(),
        collection_path: collection_path.to_path_buf(),
        table: table_name.to_string(),
        run: writer.run().to_string(),
    };
    Ok((report, VectorCollection::from_table(collection_path, table)))
}
