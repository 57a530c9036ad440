use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::chunking::{resplit_segments, split_markdown, CharCursor, HeaderSplitError, RecursiveSplitter, SplitOutcome, Span, Window};
use crate::error::{Error, Result};
use crate::types::{Chunk, FileType, HeaderPath};

#[derive(Debug, Clone)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { chunk_size: 1000, chunk_overlap: 200 }
    }
}

/// Which splitting policy produced a file's chunks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkPath {
    /// Code: sliding window over the whole file.
    Uniform,
    /// Markdown family: heading segments, each re-split by size.
    Structured { segments: usize },
    /// Markdown family whose heading split failed; sliding window, no headers.
    Fallback(HeaderSplitError),
}

#[derive(Debug, Clone)]
pub struct FileChunks {
    pub chunks: Vec<Chunk>,
    pub path: ChunkPath,
}

#[derive(Debug, Clone, Default)]
pub struct ProcessReport {
    pub matched: BTreeMap<FileType, usize>,
    pub processed: usize,
    /// Files skipped because they are not valid UTF-8.
    pub skipped: Vec<PathBuf>,
    /// Relative paths of markdown files that fell back to uniform chunking.
    pub fallbacks: Vec<String>,
}

impl ProcessReport {
    pub fn total_matched(&self) -> usize {
        self.matched.values().sum()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProcessedCorpus {
    pub chunks: Vec<Chunk>,
    pub report: ProcessReport,
}

#[derive(Default)]
pub struct DataProcessor {
    chunking_config: ChunkingConfig,
}

impl DataProcessor {
    pub fn new() -> Self { Self::default() }

    pub fn with_config(chunking_config: ChunkingConfig) -> Self { Self { chunking_config } }

    /// Walk `data_dir`, chunk every `.md`, `.R`, `.Rmd` and `.qmd` file.
    ///
    /// A missing directory yields an empty corpus. Files that are not valid
    /// UTF-8 are skipped; any other read error is returned.
    pub fn process_directory(&self, data_dir: &Path) -> Result<ProcessedCorpus> {
        let groups = self.list_files(data_dir);
        let mut corpus = ProcessedCorpus::default();
        for file_type in FileType::ALL {
            let files = groups.get(&file_type).map(Vec::as_slice).unwrap_or_default();
            corpus.report.matched.insert(file_type, files.len());
            println!("Processing {} {} (.{}) files...", files.len(), file_type.display_name(), file_type.extension());
            for file_path in files {
                let Some(content) = self.read_file_content(file_path)? else {
                    tracing::warn!("Could not read {} due to encoding issues. Skipping.", file_path.display());
                    corpus.report.skipped.push(file_path.clone());
                    continue;
                };
                let source = relative_source(file_path, data_dir);
                let file_chunks = self.chunk_file(&content, &source, file_type);
                if let ChunkPath::Fallback(e) = &file_chunks.path {
                    tracing::warn!("Markdown parsing failed for {}, using regular chunking: {}", source, e);
                    corpus.report.fallbacks.push(source.clone());
                }
                tracing::debug!(source = %source, chunks = file_chunks.chunks.len(), "chunked file");
                corpus.report.processed += 1;
                corpus.chunks.extend(file_chunks.chunks);
            }
        }
        println!("Processed {} files into {} chunks", corpus.report.processed, corpus.chunks.len());
        Ok(corpus)
    }

    /// Apply the splitting policy for `file_type` to one file's content.
    pub fn chunk_file(&self, content: &str, source: &str, file_type: FileType) -> FileChunks {
        let splitter = RecursiveSplitter::new(self.chunking_config.chunk_size, self.chunking_config.chunk_overlap);
        let uniform = |text: &str| -> Vec<Window> {
            splitter.split_spans(text).into_iter().map(|span| Window { span, headers: HeaderPath::default() }).collect()
        };
        let (windows, path) = if file_type.is_markdown_family() {
            match split_markdown(content) {
                SplitOutcome::Structured(segments) => {
                    let windows = resplit_segments(content, &segments, &splitter);
                    (windows, ChunkPath::Structured { segments: segments.len() })
                }
                SplitOutcome::Fallback(e) => (uniform(content), ChunkPath::Fallback(e)),
            }
        } else {
            (uniform(content), ChunkPath::Uniform)
        };
        FileChunks { chunks: build_chunks(content, source, file_type, windows), path }
    }

    fn read_file_content(&self, file_path: &Path) -> Result<Option<String>> {
        let bytes = fs::read(file_path).map_err(|source| Error::Io { path: file_path.to_path_buf(), source })?;
        Ok(String::from_utf8(bytes).ok())
    }

    /// Matching files grouped by type, each group sorted by path.
    pub fn list_files(&self, root: &Path) -> BTreeMap<FileType, Vec<PathBuf>> {
        let mut groups: BTreeMap<FileType, Vec<PathBuf>> = BTreeMap::new();
        for entry in walkdir::WalkDir::new(root).into_iter().filter_map(|e| e.ok()).filter(|e| e.file_type().is_file()) {
            if let Some(file_type) = FileType::from_path(entry.path()) {
                groups.entry(file_type).or_default().push(entry.path().to_path_buf());
            }
        }
        for files in groups.values_mut() { files.sort(); }
        groups
    }
}

fn build_chunks(content: &str, source: &str, file_type: FileType, windows: Vec<Window>) -> Vec<Chunk> {
    let total_chunks = windows.len();
    let mut cursor = CharCursor::new(content);
    let mut covered = 0usize;
    windows
        .into_iter()
        .enumerate()
        .map(|(chunk_index, Window { span, headers })| {
            let overlap = if covered > span.start {
                Span { start: span.start, end: covered.min(span.end) }.slice(content).chars().count()
            } else {
                0
            };
            covered = covered.max(span.end);
            Chunk {
                id: format!("{}:{}", source, chunk_index),
                text: span.slice(content).to_string(),
                source: source.to_string(),
                file_type,
                language: file_type.language().map(str::to_string),
                headers,
                chunk_index,
                total_chunks,
                start: cursor.chars_at(span.start),
                overlap,
            }
        })
        .collect()
}

/// Path relative to `root`, always `/`-separated.
fn relative_source(file_path: &Path, root: &Path) -> String {
    let relative = file_path.strip_prefix(root).unwrap_or(file_path);
    relative.components().map(|c| c.as_os_str().to_string_lossy()).collect::<Vec<_>>().join("/")
}
