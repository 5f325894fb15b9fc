use anyhow::{Context, Result};
use clap::Parser as _;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt as _, util::SubscriberInitExt as _};

use codevec_core::config::{resolve_with_base, Config, Settings};
use codevec_core::source::list_source_files;
use codevec_core::types::{DirectoryReport, SearchResult};
use codevec_core::{Embedder, VectorStore};
use codevec_embed::get_default_embedder;
use codevec_pipeline::{ensure_collection, Indexer, Searcher};
use codevec_vector::open_store;

mod cli;

use cli::{Cli, Commands};

struct App {
    settings: Settings,
    base: PathBuf,
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
}

impl App {
    async fn init() -> Result<Self> {
        let settings = Config::load()?.settings()?;
        let base = std::env::current_dir()?;
        let uri = resolve_with_base(&base, &settings.store.uri);
        let uri = uri.to_string_lossy().to_string();
        let store = open_store(&settings.store, &uri)
            .await
            .map_err(|e| anyhow::anyhow!(e))
            .with_context(|| format!("opening {} store at {}", settings.store.backend, uri))?;
        let embedder = get_default_embedder(&settings.embedding)?;
        ensure_collection(store.as_ref(), &settings.store.collection, settings.embedding.dimension, settings.store.distance)
            .await
            .context("collection bootstrap")?;
        Ok(Self { settings, base, embedder, store })
    }

    async fn index(&self, dir: Option<PathBuf>) -> Result<DirectoryReport> {
        let root = match dir {
            Some(d) => d,
            None => resolve_with_base(&self.base, &self.settings.source.root),
        };
        let files = list_source_files(&root, &self.settings.source.extensions)
            .with_context(|| format!("listing source files under {}", root.display()))?;
        info!(root = %root.display(), "Found {} code files to process", files.len());

        let indexer = Indexer::new(self.embedder.clone(), self.store.clone(), self.settings.store.collection.clone())
            .with_chunker(self.settings.chunking.chunker()?)
            .with_max_concurrency(self.settings.embedding.max_concurrency);

        let pb = progress_bar(files.len() as u64);
        let result = indexer
            .index_sources(&files, |r| {
                pb.set_message(r.path.clone());
                pb.inc(1);
            })
            .await;
        pb.finish_and_clear();
        let report = result?;
        info!(files = report.files_indexed, chunks = report.chunks_written, "Indexing complete");
        Ok(report)
    }

    async fn search(&self, query: &str, limit: Option<usize>) -> Result<Vec<SearchResult>> {
        let searcher = Searcher::new(self.embedder.clone(), self.store.clone(), self.settings.store.collection.clone());
        let limit = limit.unwrap_or(self.settings.query.limit);
        Ok(searcher.search(query, limit).await?)
    }
}

fn progress_bar(len: u64) -> ProgressBar {
    let pb = ProgressBar::new(len);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) {msg}")
    {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb
}

fn print_results(results: &[SearchResult]) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(results)?);
    Ok(())
}

async fn run(command: Commands) -> Result<()> {
    let app = App::init().await?;
    match command {
        Commands::Run => {
            app.index(None).await?;
            let query = app.settings.query.example.clone();
            info!(query = %query, "running example query");
            print_results(&app.search(&query, None).await?)?;
        }
        Commands::Index { dir } => {
            let report = app.index(dir).await?;
            println!("Indexed {} files into {} chunks", report.files_indexed, report.chunks_written);
        }
        Commands::Search { query, limit } => print_results(&app.search(&query, limit).await?)?,
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli.command.unwrap_or(Commands::Run)).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}
