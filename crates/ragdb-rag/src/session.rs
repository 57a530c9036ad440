use anyhow::{Context, Result};
use std::path::Path;

use ragdb_core::config::{validate_retrieval, RagConfig};
use ragdb_core::traits::Embedder;
use ragdb_llm::{ChatModel, PromptTemplate};
use ragdb_vector::{ingest_directory, IngestReport, VectorCollection};

use crate::context::format_context;
use crate::merge::{merge_weighted, WeightedHit};

/// Handles shared by ingestion and querying, created once per process.
pub struct RagSession {
    config: RagConfig,
    embedder: Box<dyn Embedder>,
    chat: Box<dyn ChatModel>,
    template: PromptTemplate,
}

#[derive(Debug, Clone)]
pub struct Answer {
    pub text: String,
    /// Hits that formed the context, best first.
    pub hits: Vec<WeightedHit>,
}

impl RagSession {
    pub fn new(config: RagConfig, embedder: Box<dyn Embedder>, chat: Box<dyn ChatModel>) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, embedder, chat, template: PromptTemplate::default() })
    }

    pub fn embedder(&self) -> &dyn Embedder { self.embedder.as_ref() }

    /// Ingest `content_dir` into the collection at `output_dir/collection_name`.
    pub async fn ingest(&self, content_dir: &Path, output_dir: &Path, collection_name: &str) -> Result<(IngestReport, VectorCollection)> {
        let collection_path = output_dir.join(collection_name);
        ingest_directory(self.embedder.as_ref(), &self.config, content_dir, &collection_path).await
    }

    /// Open the documentation and code collections (they may be the same path).
    pub async fn open(&self, docs_path: &Path, code_path: &Path) -> Result<Retriever<'_>> {
        let table = self.config.vector.table.as_str();
        let docs = VectorCollection::open(docs_path, table).await.context("opening documentation collection")?;
        let code = VectorCollection::open(code_path, table).await.context("opening code collection")?;
        Ok(Retriever {
            session: self,
            docs,
            code,
            k: self.config.retrieval.k,
            doc_weight: self.config.retrieval.doc_weight,
        })
    }
}

pub struct Retriever<'s> {
    session: &'s RagSession,
    docs: VectorCollection,
    code: VectorCollection,
    k: usize,
    doc_weight: f32,
}

impl<'s> Retriever<'s> {
    /// Override `k` and `doc_weight` for this retriever.
    pub fn with_params(mut self, k: usize, doc_weight: f32) -> Result<Self> {
        validate_retrieval(k, doc_weight)?;
        self.k = k;
        self.doc_weight = doc_weight;
        Ok(self)
    }

    /// Top `2k` weighted hits across both collections.
    pub async fn retrieve(&self, question: &str) -> Result<Vec<WeightedHit>> {
        let query = self.session.embedder.embed_one(question)?;
        let docs = if self.doc_weight > 0.0 { self.docs.search(&query, self.k).await? } else { Vec::new() };
        let code = if self.doc_weight < 1.0 { self.code.search(&query, self.k).await? } else { Vec::new() };
        let mut merged = merge_weighted(docs, code, self.doc_weight, self.session.config.retrieval.dedupe);
        merged.truncate(self.k * 2);
        tracing::debug!(hits = merged.len(), "retrieved context");
        Ok(merged)
    }

    pub async fn query(&self, question: &str) -> Result<Answer> {
        let hits = self.retrieve(question).await?;
        let context = format_context(&hits);
        let prompt = self.session.template.render(&context, question);
        let text = self.session.chat.complete(&prompt).await?;
        Ok(Answer { text, hits })
    }
}

/// Anything that can answer one question at a time.
#[async_trait::async_trait]
pub trait QuestionAnswerer: Send + Sync {
    /// Label shown in the interactive banner.
    fn model_name(&self) -> &str;

    async fn answer(&self, question: &str) -> Result<String>;
}

#[async_trait::async_trait]
impl QuestionAnswerer for Retriever<'_> {
    fn model_name(&self) -> &str { self.session.chat.name() }

    async fn answer(&self, question: &str) -> Result<String> {
        Ok(self.query(question).await?.text)
    }
}
