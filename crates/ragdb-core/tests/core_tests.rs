use std::fs;
use std::io::Write;
use tempfile::TempDir;

use ragdb_core::config::{expand_path, Config, RagConfig};
use ragdb_core::data_processor::{ChunkPath, ChunkingConfig, DataProcessor};
use ragdb_core::types::{Chunk, FileType};

fn reconstruct(chunks: &[Chunk]) -> String {
    chunks.iter().map(Chunk::fresh_text).collect()
}

#[test]
fn process_directory_single_small_file() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    let mut f = fs::File::create(dir.join("notes.md")).unwrap();
    writeln!(f, "Short text").unwrap();

    let corpus = DataProcessor::new().process_directory(dir).expect("process");

    assert_eq!(corpus.chunks.len(), 1, "one small paragraph becomes one chunk");
    let chunk = &corpus.chunks[0];
    assert_eq!(chunk.text.trim(), "Short text");
    assert_eq!(chunk.id, "notes.md:0");
    assert_eq!(chunk.file_type, FileType::Markdown);
    assert_eq!(chunk.total_chunks, 1);
    assert!(chunk.language.is_none());
}

#[test]
fn unrecognized_extensions_are_ignored() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    fs::write(dir.join("a.txt"), "alpha bravo").unwrap();
    fs::write(dir.join("b.r"), "x <- 1").unwrap();
    fs::write(dir.join("c.MD"), "# Title").unwrap();

    let corpus = DataProcessor::new().process_directory(dir).expect("process");
    assert!(corpus.chunks.is_empty());
    assert_eq!(corpus.report.total_matched(), 0);
}

#[test]
fn missing_directory_yields_empty_corpus() {
    let tmp = TempDir::new().unwrap();
    let corpus = DataProcessor::new().process_directory(&tmp.path().join("nope")).expect("process");
    assert!(corpus.chunks.is_empty());
    assert_eq!(corpus.report.processed, 0);
}

#[test]
fn headings_split_into_segments_with_metadata() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    fs::create_dir_all(dir.join("pkg/vignettes")).unwrap();
    let doc = "# Intro\nWhat it does.\n\n## Install\nUse install.packages.\n\n# Usage\nCall fit().\n";
    fs::write(dir.join("pkg/vignettes/guide.Rmd"), doc).unwrap();

    let processor = DataProcessor::new();
    let corpus = processor.process_directory(dir).expect("process");

    assert_eq!(corpus.chunks.len(), 3);
    let sources: Vec<_> = corpus.chunks.iter().map(|c| c.source.as_str()).collect();
    assert!(sources.iter().all(|s| *s == "pkg/vignettes/guide.Rmd"));

    let install = &corpus.chunks[1];
    assert_eq!(install.headers.header1.as_deref(), Some("Intro"));
    assert_eq!(install.headers.header2.as_deref(), Some("Install"));
    assert!(install.text.starts_with("## Install"));

    let usage = &corpus.chunks[2];
    assert_eq!(usage.headers.header1.as_deref(), Some("Usage"));
    assert!(usage.headers.header2.is_none(), "entering a level-1 heading clears deeper levels");

    assert_eq!(reconstruct(&corpus.chunks), doc);
}

#[test]
fn r_source_is_chunked_uniformly_with_language() {
    let processor = DataProcessor::with_config(ChunkingConfig { chunk_size: 40, chunk_overlap: 10 });
    let code = "# helper\nadd <- function(a, b) {\n  a + b\n}\n\nsub <- function(a, b) {\n  a - b\n}\n";
    let out = processor.chunk_file(code, "R/math.R", FileType::R);

    assert_eq!(out.path, ChunkPath::Uniform);
    assert!(out.chunks.len() > 1);
    for chunk in &out.chunks {
        assert_eq!(chunk.language.as_deref(), Some("R"));
        assert!(chunk.headers.is_empty(), "R comments are not headings");
        assert!(chunk.text.chars().count() <= 40);
        assert!(chunk.overlap <= 10);
        assert_eq!(chunk.total_chunks, out.chunks.len());
    }
    assert_eq!(reconstruct(&out.chunks), code);
}

#[test]
fn long_sections_are_resplit_and_reconstruct() {
    let processor = DataProcessor::with_config(ChunkingConfig { chunk_size: 60, chunk_overlap: 15 });
    let body = "Lorem ipsum dolor sit amet, consectetur adipiscing elit. ".repeat(6);
    let doc = format!("# One\n{body}\n\n## Two\n{body}\n");
    let out = processor.chunk_file(&doc, "README.md", FileType::Markdown);

    assert_eq!(out.path, ChunkPath::Structured { segments: 2 });
    assert!(out.chunks.len() > 4);
    for (i, chunk) in out.chunks.iter().enumerate() {
        assert_eq!(chunk.chunk_index, i);
        assert!(chunk.text.chars().count() <= 60);
        assert_eq!(chunk.headers.header1.as_deref(), Some("One"));
    }
    assert_eq!(reconstruct(&out.chunks), doc);
}

#[test]
fn unterminated_fence_falls_back_to_uniform_chunking() {
    let processor = DataProcessor::new();
    let doc = "# Title\n\n```{r}\nx <- 1\n# not a heading\n";
    let out = processor.chunk_file(doc, "report.qmd", FileType::Quarto);

    assert!(matches!(out.path, ChunkPath::Fallback(_)));
    assert_eq!(out.chunks.len(), 1);
    assert!(out.chunks[0].headers.is_empty());
    assert_eq!(out.chunks[0].text, doc);
}

#[test]
fn fallback_files_are_reported() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    fs::write(dir.join("broken.Rmd"), "---\ntitle: never closed\n").unwrap();
    fs::write(dir.join("fine.md"), "# Fine\n").unwrap();

    let corpus = DataProcessor::new().process_directory(dir).expect("process");
    assert_eq!(corpus.report.fallbacks, vec!["broken.Rmd".to_string()]);
    assert_eq!(corpus.report.processed, 2);
}

#[test]
fn non_utf8_files_are_skipped() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    fs::write(dir.join("latin1.R"), [0x78u8, 0x20, 0x3c, 0x2d, 0x20, 0xe9, 0xff]).unwrap();
    fs::write(dir.join("ok.R"), "y <- 2\n").unwrap();

    let corpus = DataProcessor::new().process_directory(dir).expect("process");
    assert_eq!(corpus.chunks.len(), 1);
    assert_eq!(corpus.chunks[0].source, "ok.R");
    assert_eq!(corpus.report.skipped.len(), 1);
    assert_eq!(corpus.report.matched.get(&FileType::R), Some(&2));
}

#[test]
fn empty_file_produces_no_chunks() {
    let out = DataProcessor::new().chunk_file("", "empty.md", FileType::Markdown);
    assert!(out.chunks.is_empty());
}

#[test]
fn defaults_match_documented_values() {
    let cfg = RagConfig::default();
    assert_eq!(cfg.ingest.chunk_size, 1000);
    assert_eq!(cfg.ingest.chunk_overlap, 200);
    assert_eq!(cfg.retrieval.k, 5);
    assert!((cfg.retrieval.doc_weight - 0.7).abs() < f32::EPSILON);
    assert_eq!(cfg.llm.temperature, 0.0);
    assert_eq!(cfg.embedding.model, "sentence-transformers/all-MiniLM-L6-v2");
    cfg.validate().expect("defaults are valid");
}

#[test]
fn toml_overrides_and_validation() {
    let cfg = Config::from_toml_str("[retrieval]\nk = 8\n").expect("load");
    let settings = cfg.settings().unwrap();
    assert_eq!(settings.retrieval.k, 8);
    assert_eq!(settings.ingest.chunk_size, 1000, "untouched sections keep defaults");

    assert!(Config::from_toml_str("[ingest]\nchunk_size = 100\nchunk_overlap = 100\n").is_err());
    assert!(Config::from_toml_str("[retrieval]\ndoc_weight = 1.5\n").is_err());
    assert!(Config::from_toml_str("[retrieval]\nk = 0\n").is_err());
}

#[test]
fn expand_path_leaves_plain_paths_alone() {
    assert_eq!(expand_path("plain/dir"), std::path::PathBuf::from("plain/dir"));
    assert_eq!(expand_path("/abs/db"), std::path::PathBuf::from("/abs/db"));
}
