use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use ragdb_core::config::{expand_path, validate_retrieval, Config, RagConfig};
use ragdb_embed::get_default_embedder;
use ragdb_llm::ClaudeClient;
use ragdb_rag::{run_interactive, RagSession};

#[derive(Parser, Debug)]
#[command(name = "ragdb", version, about = "Retrieval-augmented Q&A over R package docs and code")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Chunk, embed and store every .md, .R, .Rmd and .qmd file under a directory
    Ingest(IngestArgs),
    /// Answer one question, or start an interactive session
    Query(QueryArgs),
}

#[derive(Args, Debug)]
struct IngestArgs {
    /// Directory containing R package sources and documentation
    #[arg(long)]
    content_dir: String,
    #[arg(long, default_value = "./vector_db")]
    output_dir: String,
    #[arg(long, default_value = "r_knowledge_base")]
    collection_name: String,
}

#[derive(Args, Debug)]
struct QueryArgs {
    /// Path to a collection created by `ingest`
    #[arg(long)]
    db_path: String,
    /// Ask a single question instead of starting the interactive loop
    #[arg(long)]
    question: Option<String>,
    #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
    /// Hits retrieved from each collection
    #[arg(long)]
    top_k: Option<usize>,
    /// Weight of documentation hits in [0, 1]; code gets the rest
    #[arg(long)]
    doc_weight: Option<f32>,
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

async fn ingest(settings: RagConfig, args: IngestArgs) -> Result<()> {
    let content_dir = expand_path(&args.content_dir);
    let output_dir = expand_path(&args.output_dir);
    println!("Ingesting all R-related files from {}...", content_dir.display());

    let embedder = get_default_embedder(&settings.embedding)?;
    let chat = ClaudeClient::new(None, &settings.llm);
    let session = RagSession::new(settings, embedder, Box::new(chat))?;
    let (report, _) = session.ingest(&content_dir, &output_dir, &args.collection_name).await?;

    if !report.files.skipped.is_empty() {
        println!("Skipped {} undecodable files", report.files.skipped.len());
    }
    println!("Ingestion complete. Vector database stored in: {}", report.collection_path.display());
    Ok(())
}

async fn query(mut settings: RagConfig, args: QueryArgs) -> Result<()> {
    if let Some(k) = args.top_k {
        settings.retrieval.k = k;
    }
    if let Some(w) = args.doc_weight {
        settings.retrieval.doc_weight = w;
    }
    validate_retrieval(settings.retrieval.k, settings.retrieval.doc_weight)?;

    let chat = ClaudeClient::new(args.api_key, &settings.llm);
    if !chat.has_api_key() {
        println!("Warning: No Anthropic API key provided. Set it with --api-key or ANTHROPIC_API_KEY environment variable.");
    }
    let embedder = get_default_embedder(&settings.embedding)?;
    let session = RagSession::new(settings, embedder, Box::new(chat))?;

    let db_path: PathBuf = expand_path(&args.db_path);
    let retriever = session.open(&db_path, &db_path).await?;

    match args.question {
        Some(question) => {
            let answer = retriever.query(&question).await?;
            println!("\nAnswer:");
            println!("{}", answer.text);
        }
        None => {
            let stdin = std::io::stdin();
            let mut stdout = std::io::stdout();
            run_interactive(&retriever, stdin.lock(), &mut stdout).await?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = Config::load().map_err(|e| { eprintln!("Error loading config: {}", e); e })?;
    let settings = config.settings()?;
    tracing::debug!(?settings, "loaded configuration");

    match cli.command {
        Command::Ingest(args) => ingest(settings, args).await,
        Command::Query(args) => query(settings, args).await,
    }
}
