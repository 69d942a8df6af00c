use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use docsage_cli::fetch::{fetch_url, http_client};
use docsage_cli::llm::ChatClient;
use docsage_core::config::{resolve_with_base, Config, Settings};
use docsage_core::source::{load_directory, load_file};
use docsage_core::types::keys;
use docsage_core::{DocType, Metadata, RawDocument};
use docsage_pipeline::prompt;
use docsage_pipeline::RetrievalPipeline;

const NO_RESULTS_ANSWER: &str = "I couldn't find any relevant documentation for your question. Please make sure you have uploaded some documentation first.";

#[derive(Parser)]
#[command(name = "docsage")]
#[command(about = "Ask questions about your technical documentation")]
#[command(version)]
struct Cli {
    /// Path to config file (default: ./config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load and index documentation files, directories or URLs
    Upload {
        #[arg(short, long, num_args = 1..)]
        files: Vec<PathBuf>,

        #[arg(short, long)]
        directory: Option<PathBuf>,

        #[arg(short, long, num_args = 1..)]
        urls: Vec<String>,
    },

    /// Answer a question from the indexed documentation
    Query {
        question: String,

        /// Ask for a code example in this language
        #[arg(short, long)]
        language: Option<String>,

        #[arg(short, long)]
        max_results: Option<usize>,

        /// Print the retrieved context instead of calling the model
        #[arg(long)]
        context_only: bool,
    },

    /// Show ranked chunks for a query without calling the model
    Search {
        query: String,

        #[arg(short, long)]
        limit: Option<usize>,

        /// markdown, html, pdf, api_spec, config, web or text
        #[arg(long)]
        doc_type: Option<DocType>,

        #[arg(long)]
        source: Option<String>,
    },

    /// Show collection statistics
    Stats,

    /// Delete every indexed chunk
    Reset,
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn load_settings(config_path: Option<&Path>) -> Result<Settings> {
    let config = match config_path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .map_err(|e| { eprintln!("Error loading config: {}", e); e })?;
    let mut settings = config.settings()?;
    // relative db paths follow the config file they came from
    if let Some(base) = config_path.and_then(Path::parent) {
        settings.index.db_path = resolve_with_base(base, &settings.index.db_path).to_string_lossy().to_string();
    }
    Ok(settings)
}

fn progress(len: usize) -> Result<ProgressBar> {
    let pb = ProgressBar::new(len as u64);
    pb.set_style(ProgressStyle::default_bar().template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} documents ({percent}%) {msg}")?.progress_chars("#>-"));
    Ok(pb)
}

fn report(doc: &RawDocument, chunks: usize) {
    if doc.status.is_success() {
        println!("  {} -> {} chunks", doc.source, chunks);
    } else {
        println!("  {} -> {}", doc.source, doc.status);
    }
}

fn upload(
    pipeline: &mut RetrievalPipeline,
    files: &[PathBuf],
    directory: Option<&Path>,
    urls: &[String],
) -> Result<()> {
    if files.is_empty() && directory.is_none() && urls.is_empty() {
        anyhow::bail!("nothing to upload: pass --files, --directory or --urls");
    }
    let (mut processed, mut total_chunks) = (0usize, 0usize);
    let mut record = |chunks: usize| {
        if chunks > 0 {
            processed += 1;
            total_chunks += chunks;
        }
    };

    for path in files {
        let doc = load_file(path);
        let chunks = pipeline.ingest(&doc);
        report(&doc, chunks);
        record(chunks);
    }

    if let Some(dir) = directory {
        let docs = load_directory(dir);
        println!("Found {} documents in {}", docs.len(), dir.display());
        let pb = progress(docs.len())?;
        for doc in &docs {
            pb.set_message(doc.source.clone());
            let chunks = pipeline.ingest(doc);
            record(chunks);
            pb.inc(1);
        }
        pb.finish_with_message("done");
    }

    if !urls.is_empty() {
        let client = http_client()?;
        for url in urls {
            let doc = fetch_url(&client, url);
            let chunks = pipeline.ingest(&doc);
            report(&doc, chunks);
            record(chunks);
        }
    }

    println!("Successfully processed {} files/URLs with {} chunks", processed, total_chunks);
    Ok(())
}

fn query(pipeline: &RetrievalPipeline, settings: &Settings, question: &str, language: Option<&str>, max_results: usize, context_only: bool) -> Result<()> {
    if question.trim().is_empty() {
        anyhow::bail!("Question cannot be empty");
    }
    let results = pipeline.answer_context(question, max_results);
    if context_only {
        println!("{}", prompt::build_context(&results));
        return Ok(());
    }
    if results.is_empty() {
        println!("{NO_RESULTS_ANSWER}");
        return Ok(());
    }

    let request = prompt::build_prompt(question, &results, language);
    let client = ChatClient::from_config(&settings.llm)?;
    let answer = client.complete(&request)?;
    println!("{}\n", answer.content);
    println!("Sources:");
    for source in prompt::sources(&results) {
        println!("  - {source}");
    }
    println!("Confidence: {:.3}", prompt::confidence(&results, request.code_mode));
    println!("Model: {} ({} tokens)", answer.model, answer.tokens_used);
    Ok(())
}

fn search(
    pipeline: &RetrievalPipeline,
    query: &str,
    limit: usize,
    doc_type: Option<DocType>,
    source: Option<String>,
) {
    let mut filter = Metadata::new();
    if let Some(t) = doc_type {
        filter.insert(keys::DOC_TYPE.to_string(), t.to_string());
    }
    if let Some(s) = source {
        filter.insert(keys::SOURCE.to_string(), s);
    }
    let results = pipeline.search_filtered(query, limit, &filter);
    println!("Found {} results for: \"{}\"", results.len(), query);
    for (i, r) in results.iter().enumerate() {
        let snippet: String = r.content.chars().take(200).collect::<String>().replace('\n', " ");
        println!("\n  {}. score={:.4}  source={}  chunk={}", i + 1, r.score, r.source().unwrap_or("Unknown"), r.metadata.get(keys::CHUNK_INDEX).map_or("?", String::as_str));
        println!("     {}", snippet);
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let settings = load_settings(cli.config.as_deref())?;
    info!(backend = ?settings.index.backend, collection = %settings.index.collection, model = %settings.embedding.model, "starting");
    let mut pipeline = RetrievalPipeline::from_settings(&settings)?;

    match cli.command {
        Commands::Upload { files, directory, urls } => upload(&mut pipeline, &files, directory.as_deref(), &urls)?,
        Commands::Query { question, language, max_results, context_only } => {
            let n = max_results.unwrap_or(settings.retrieval.max_results);
            query(&pipeline, &settings, &question, language.as_deref(), n, context_only)?
        }
        Commands::Search { query, limit, doc_type, source } => {
            search(&pipeline, &query, limit.unwrap_or(settings.retrieval.max_results), doc_type, source)
        }
        Commands::Stats => {
            let stats = pipeline.stats();
            println!("Collection: {}", stats.collection_name);
            println!("Total chunks: {}", stats.total_documents);
            println!("Embedding model: {}", stats.embedding_model);
        }
        Commands::Reset => {
            if pipeline.reset() {
                println!("Database reset successfully");
            } else {
                warn!("reset failed");
                anyhow::bail!("Failed to reset database");
            }
        }
    }
    Ok(())
}
