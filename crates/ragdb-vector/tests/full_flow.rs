use std::fs;
use std::path::Path;

use ragdb_core::config::RagConfig;
use ragdb_core::traits::Embedder;
use ragdb_core::types::FileType;
use ragdb_embed::{FakeEmbedder, MINILM_DIM};
use ragdb_vector::{ingest_directory, VectorCollection};
use tempfile::TempDir;

fn write(root: &Path, rel: &str, body: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, body).unwrap();
}

fn seed_corpus(root: &Path) {
    write(root, "dplyr/README.md", "# dplyr\n\ndplyr is a grammar of data manipulation.\n\n## Filter\n\nUse filter() to keep rows that match a condition.\n");
    write(root, "dplyr/R/filter.R", "filter <- function(.data, ...) {\n  UseMethod(\"filter\")\n}\n");
    write(root, "dplyr/vignettes/intro.Rmd", "---\ntitle: Intro\n---\n\n# Mutate\n\n```{r}\n# add a column\nmutate(df, z = x + y)\n```\n");
    write(root, "dplyr/notes.txt", "ignored");
}

#[tokio::test]
async fn lancedb_full_flow() {
    let tmp = TempDir::new().expect("tmp");
    let content = tmp.path().join("content");
    seed_corpus(&content);
    let collection_path = tmp.path().join("vector_db/r_knowledge_base");
    let embedder = FakeEmbedder::new(MINILM_DIM);
    let config = RagConfig::default();

    let (report, collection) = ingest_directory(&embedder, &config, &content, &collection_path).await.expect("ingest");
    assert_eq!(report.files.processed, 3);
    assert_eq!(report.files.matched.get(&FileType::Markdown), Some(&1));
    assert!(report.chunks >= 3);
    assert_eq!(collection.count_rows().await.unwrap(), report.chunks);
    assert!(collection_path.is_dir());

    let q = embedder.embed_one("filter rows that match a condition").unwrap();
    let hits = collection.search(&q, 3).await.expect("search");
    assert!(!hits.is_empty() && hits.len() <= 3);
    for pair in hits.windows(2) { assert!(pair[0].score >= pair[1].score, "hits are sorted best first"); }
    let top = &hits[0];
    assert_eq!(top.chunk.source, "dplyr/README.md");
    assert_eq!(top.chunk.headers.header2.as_deref(), Some("Filter"));
    assert!(top.score > 0.0 && top.score <= 1.0 + 1e-5);

    let reopened = VectorCollection::open(&collection_path, "chunks").await.expect("reopen");
    let code_hits = reopened.search(&embedder.embed_one("UseMethod filter function").unwrap(), 5).await.unwrap();
    let r_hit = code_hits.iter().find(|h| h.chunk.file_type == FileType::R).expect("R chunk is retrievable");
    assert_eq!(r_hit.chunk.language.as_deref(), Some("R"));
    assert!(r_hit.chunk.headers.is_empty());
}

#[tokio::test]
async fn unrecognised_files_create_empty_collection() {
    let tmp = TempDir::new().unwrap();
    let content = tmp.path().join("content");
    write(&content, "a.txt", "alpha");
    write(&content, "b.py", "print('x')");
    let collection_path = tmp.path().join("db");
    let embedder = FakeEmbedder::new(MINILM_DIM);

    let (report, collection) = ingest_directory(&embedder, &RagConfig::default(), &content, &collection_path).await.unwrap();
    assert_eq!(report.chunks, 0);
    assert_eq!(collection.count_rows().await.unwrap(), 0);
    let reopened = VectorCollection::open(&collection_path, "chunks").await.expect("empty collection still opens");
    assert!(reopened.search(&embedder.embed_one("anything").unwrap(), 5).await.unwrap().is_empty());
}

#[tokio::test]
async fn undecodable_file_is_absent_and_others_ingested() {
    let tmp = TempDir::new().unwrap();
    let content = tmp.path().join("content");
    write(&content, "good.md", "# Good\n\nreadable text\n");
    fs::write(content.join("bad.R"), [0xffu8, 0xfe, 0x00, 0x41]).unwrap();
    let collection_path = tmp.path().join("db");
    let embedder = FakeEmbedder::new(MINILM_DIM);

    let (report, collection) = ingest_directory(&embedder, &RagConfig::default(), &content, &collection_path).await.unwrap();
    assert_eq!(report.files.skipped.len(), 1);
    assert_eq!(collection.count_rows().await.unwrap(), 1);
    let hits = collection.search(&embedder.embed_one("readable").unwrap(), 5).await.unwrap();
    assert!(hits.iter().all(|h| h.chunk.source == "good.md"));
}

#[tokio::test]
async fn reingest_appends() {
    let tmp = TempDir::new().unwrap();
    let content = tmp.path().join("content");
    write(&content, "x.md", "# X\n\nsome text\n");
    let collection_path = tmp.path().join("db");
    let embedder = FakeEmbedder::new(MINILM_DIM);
    let config = RagConfig::default();

    let (first, _) = ingest_directory(&embedder, &config, &content, &collection_path).await.unwrap();
    let (second, collection) = ingest_directory(&embedder, &config, &content, &collection_path).await.unwrap();
    assert_eq!(collection.count_rows().await.unwrap(), 2);
    assert_ne!(first.run, second.run);

    let hits = collection.search(&embedder.embed_one("some text").unwrap(), 5).await.unwrap();
    assert_eq!(hits.len(), 2, "both copies are stored");
    assert_ne!(hits[0].chunk.id, hits[1].chunk.id);
    for hit in &hits {
        assert!(hit.chunk.id.starts_with("x.md:0:"));
    }
    assert!(hits.iter().any(|h| h.chunk.id.ends_with(&first.run)));
    assert!(hits.iter().any(|h| h.chunk.id.ends_with(&second.run)));
}

#[tokio::test]
async fn dimension_mismatch_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let content = tmp.path().join("content");
    write(&content, "x.md", "# X\n");
    let collection_path = tmp.path().join("db");
    let config = RagConfig::default();

    ingest_directory(&FakeEmbedder::new(MINILM_DIM), &config, &content, &collection_path).await.unwrap();
    let err = ingest_directory(&FakeEmbedder::new(16), &config, &content, &collection_path).await;
    assert!(err.is_err());
}

#[tokio::test]
async fn missing_collection_fails_to_open() {
    let tmp = TempDir::new().unwrap();
    assert!(VectorCollection::open(&tmp.path().join("nowhere"), "chunks").await.is_err());
}
