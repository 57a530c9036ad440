//! Configuration loader and path helpers.
//!
//! Uses Figment to merge built-in defaults + `config.toml` + `config.<env>.toml`
//! + `APP_*` env vars into a typed [`RagConfig`]. Provides helpers to expand
//! `~` and `${VAR}` and to resolve relative paths against a known base directory.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

use crate::error::Error;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IngestSettings {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    /// Chunks embedded and written per round trip.
    pub batch_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddingSettings {
    /// HuggingFace repo id of the sentence-transformers checkpoint.
    pub model: String,
    pub max_len: usize,
    /// Local checkpoint directory; when unset the model is fetched from the hub.
    pub model_dir: Option<String>,
    pub use_fake: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VectorSettings {
    pub table: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievalSettings {
    pub k: usize,
    pub doc_weight: f32,
    pub dedupe: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LlmSettings {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub api_url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RagConfig {
    pub ingest: IngestSettings,
    pub embedding: EmbeddingSettings,
    pub vector: VectorSettings,
    pub retrieval: RetrievalSettings,
    pub llm: LlmSettings,
}

impl Default for IngestSettings {
    fn default() -> Self { Self { chunk_size: 1000, chunk_overlap: 200, batch_size: 256 } }
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self { model: "sentence-transformers/all-MiniLM-L6-v2".to_string(), max_len: 256, model_dir: None, use_fake: false }
    }
}

impl Default for VectorSettings {
    fn default() -> Self { Self { table: "chunks".to_string() } }
}

impl Default for RetrievalSettings {
    fn default() -> Self { Self { k: 5, doc_weight: 0.7, dedupe: true } }
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: "claude-3-7-sonnet-20250219".to_string(),
            max_tokens: 1024,
            temperature: 0.0,
            api_url: "https://api.anthropic.com/v1/messages".to_string(),
        }
    }
}

impl RagConfig {
    pub fn validate(&self) -> Result<(), Error> {
        let ingest = &self.ingest;
        if ingest.chunk_size == 0 {
            return Err(Error::InvalidConfig("ingest.chunk_size must be positive".into()));
        }
        if ingest.chunk_overlap >= ingest.chunk_size {
            return Err(Error::InvalidConfig(format!(
                "ingest.chunk_overlap ({}) must be smaller than ingest.chunk_size ({})",
                ingest.chunk_overlap, ingest.chunk_size
            )));
        }
        if ingest.batch_size == 0 {
            return Err(Error::InvalidConfig("ingest.batch_size must be positive".into()));
        }
        validate_retrieval(self.retrieval.k, self.retrieval.doc_weight)
    }
}

/// `k` must be positive and `doc_weight` within `[0, 1]`.
pub fn validate_retrieval(k: usize, doc_weight: f32) -> Result<(), Error> {
    if k == 0 {
        return Err(Error::InvalidConfig("retrieval.k must be positive".into()));
    }
    if !(0.0..=1.0).contains(&doc_weight) {
        return Err(Error::InvalidConfig(format!("retrieval.doc_weight must be within [0, 1], got {}", doc_weight)));
    }
    Ok(())
}

pub struct Config {
    figment: Figment,
}

impl Config {
    /// Defaults, then `config.toml`, `config.<env>.toml` and `APP_*` env vars
    /// (`APP_RETRIEVAL__K=8` sets `retrieval.k`).
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::from(Serialized::defaults(RagConfig::default())).merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.validate_for_env(&env_name)?;
        Ok(config)
    }

    /// Defaults overlaid with an inline TOML document.
    pub fn from_toml_str(toml: &str) -> anyhow::Result<Self> {
        let figment = Figment::from(Serialized::defaults(RagConfig::default())).merge(Toml::string(toml));
        let config = Self { figment };
        config.settings()?.validate()?;
        Ok(config)
    }

    pub fn settings(&self) -> anyhow::Result<RagConfig> {
        self.figment.extract().map_err(|e| anyhow::anyhow!("Failed to read configuration: {}", e))
    }

    fn validate_for_env(&self, env: &str) -> anyhow::Result<()> {
        let settings = self.settings()?;
        settings.validate()?;
        match env {
            "prod" | "production" if settings.embedding.use_fake => {
                Err(Error::InvalidConfig("embedding.use_fake is not allowed in production".into()).into())
            }
            _ => Ok(()),
        }
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}
