use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use vecsearch_common::{logger, AppConfig};
use vecsearch_embedding::HttpEmbeddingClient;
use vecsearch_vector::{CancellationToken, JsonFileStore, QueryRequest, RankedResult, VectorSearchEngine};

/// Find project root by looking for .git directory
fn find_project_root() -> Option<PathBuf> {
    let mut current_dir = std::env::current_dir().ok()?;

    loop {
        if current_dir.join(".git").exists() {
            return Some(current_dir);
        }

        if !current_dir.pop() {
            break;
        }
    }

    None
}

/// Load .env file from project root
fn load_dotenv_from_project_root() {
    match find_project_root().map(|root| root.join(".env")) {
        Some(env_path) if env_path.exists() => {
            dotenv::from_path(&env_path).ok();
        }
        _ => {
            dotenv::dotenv().ok();
        }
    }
}

#[derive(Parser)]
#[command(name = "vecsearch")]
#[command(about = "vecsearch - store text as embeddings and find similar documents", long_about = None)]
struct Cli {
    /// Document store file (overrides STORE_PATH)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Embedding API base URL (overrides EMBEDDING_API_URL)
    #[arg(long, global = true)]
    embedding_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Embed and store one document
    Ingest {
        /// Document text
        text: String,
    },

    /// Embed and store one document per non-empty line of a file
    IngestBatch {
        /// Input file
        file: PathBuf,
    },

    /// Find documents similar to a query text
    Query {
        /// Query text
        text: String,

        /// Minimum similarity score
        #[arg(long)]
        threshold: Option<f32>,

        /// Maximum number of results
        #[arg(long)]
        top_k: Option<usize>,
    },

    /// Show corpus statistics
    Stats,
}

fn apply_overrides(config: &mut AppConfig, cli: &Cli) {
    if let Some(store) = &cli.store {
        config.store_path = store.clone();
    }
    if let Some(url) = &cli.embedding_url {
        config.embedding_api_url = url.clone();
    }
}

fn read_batch_lines(path: &Path) -> Result<Vec<String>> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(data
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

fn format_results(result: &RankedResult) -> Vec<String> {
    result
        .iter()
        .enumerate()
        .map(|(rank, hit)| format!("{}. [{:.4}] {} {}", rank + 1, hit.score, hit.id, hit.content))
        .collect()
}

/// One-word health of the embedding API for `stats`
async fn embedding_api_status(client: &HttpEmbeddingClient) -> &'static str {
    match client.test_connection().await {
        Ok(true) => "reachable",
        Ok(false) => {
            tracing::warn!("Embedding API at {} answered with a server error", client.base_url());
            "unhealthy"
        }
        Err(e) => {
            tracing::warn!("Embedding API check failed: {}", e);
            "unreachable"
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    load_dotenv_from_project_root();

    let mut config = AppConfig::from_env()?;
    apply_overrides(&mut config, &cli);
    config.validate()?;

    logger::setup_logging(&config.log_dir, &config.log_level)?;

    tracing::info!("vecsearch starting...");
    tracing::info!("  Store: {}", config.store_path.display());
    tracing::info!("  Embedding API: {}", config.embedding_api_url);

    let provider = HttpEmbeddingClient::new(&config.embedding_api_url, config.embedding_timeout())?
        .with_max_attempts(config.embedding_max_attempts);
    let store = JsonFileStore::open(&config.store_path).await?;
    let provider = Arc::new(provider);
    let engine = VectorSearchEngine::from_config(&config, provider.clone(), Arc::new(store));

    match cli.command {
        Commands::Ingest { text } => {
            let record = engine.ingest(&text).await?;
            println!("{}", record.id());
        }
        Commands::IngestBatch { file } => {
            let contents = read_batch_lines(&file)?;
            let records = engine.ingest_batch(&contents).await?;
            for record in &records {
                println!("{}", record.id());
            }
            tracing::info!("Ingested {} documents from {}", records.len(), file.display());
        }
        Commands::Query { text, threshold, top_k } => {
            let mut request = QueryRequest::text(text);
            request.threshold = threshold;
            request.top_k = top_k;

            let token = CancellationToken::new();
            let trigger = token.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::warn!("Interrupt received, cancelling query");
                    trigger.cancel();
                }
            });

            let result = engine.query_with_cancel(request, &token).await?;
            if result.is_empty() {
                println!("No matching documents");
            }
            for line in format_results(&result) {
                println!("{}", line);
            }
        }
        Commands::Stats => {
            let count = engine.stats().await?;
            println!("documents: {}", count);
            println!("embedding api: {}", embedding_api_status(&provider).await);
        }
    }

    Ok(())
}
