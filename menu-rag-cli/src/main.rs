//! `menu-rag`: chat with the dining menu from the terminal.
//!
//! Reads `OPENAI_API_KEY` from the environment. Log verbosity follows
//! `MENU_RAG_LOG` (an `EnvFilter` directive), or `--verbose`.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use menu_rag::catalog::format_amount;
use menu_rag::{
    Answer, CatalogIndex, ConversationState, NutritionAssistant, OpenAICompletionProvider,
    OpenAIEmbeddingProvider, RagConfig, RetrievalEngine,
};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "MENU_RAG_LOG";

#[derive(Parser)]
#[command(name = "menu-rag")]
#[command(about = "Goal-aware dining recommendations grounded on the campus menu")]
#[command(version)]
struct Cli {
    /// Menu JSON with `items` and `documents` arrays
    #[arg(long, default_value = "data/menu_items.json")]
    catalog: PathBuf,

    /// JSON matrix of precomputed item embeddings
    #[arg(long, default_value = "data/embeddings.json")]
    embeddings: PathBuf,

    /// TOML file with engine and generation settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Items to ground each answer on
    #[arg(short = 'k', long)]
    top_k: Option<usize>,

    /// Do not send or record conversation history
    #[arg(long)]
    no_history: bool,

    /// Minimum seconds between two queries
    #[arg(long, default_value = "3")]
    min_interval_secs: u64,

    /// Embedding model; must be the one that produced the catalog vectors
    #[arg(long, default_value = "text-embedding-3-small")]
    embedding_model: String,

    /// Ask the API for truncated embeddings of this size
    /// (text-embedding-3 models only)
    #[arg(long)]
    embedding_dimensions: Option<usize>,

    /// Base URL of an OpenAI-compatible API
    #[arg(long)]
    base_url: Option<String>,

    /// Log at debug level unless MENU_RAG_LOG says otherwise
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn load_config(cli: &Cli) -> Result<RagConfig> {
    let mut config = match &cli.config {
        Some(path) => RagConfig::from_toml_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => RagConfig::builder().top_k(3).build()?,
    };
    if let Some(top_k) = cli.top_k {
        config.top_k = top_k;
    }
    if cli.no_history {
        config.use_history = false;
    }
    config.validate()?;
    Ok(config)
}

fn build_assistant(cli: &Cli, config: RagConfig) -> Result<NutritionAssistant> {
    let catalog = CatalogIndex::load(&cli.catalog, &cli.embeddings).with_context(|| {
        format!(
            "failed to load catalog from {} and {}",
            cli.catalog.display(),
            cli.embeddings.display()
        )
    })?;

    let mut embedder = OpenAIEmbeddingProvider::from_env()?.with_model(&cli.embedding_model);
    if let Some(dims) = cli.embedding_dimensions {
        embedder = embedder.with_dimensions(dims);
    }
    let mut chat_model = OpenAICompletionProvider::from_env()?;
    if let Some(base_url) = &cli.base_url {
        embedder = embedder.with_base_url(base_url);
        chat_model = chat_model.with_base_url(base_url);
    }

    println!(
        "Loaded {} menu items from {} restaurants.",
        catalog.len(),
        catalog.restaurant_count()
    );

    let engine = RetrievalEngine::builder()
        .config(config)
        .catalog(Arc::new(catalog))
        .embedding_provider(Arc::new(embedder))
        .build()?;
    Ok(NutritionAssistant::new(Arc::new(engine), Arc::new(chat_model)))
}

fn print_answer(answer: &Answer) {
    println!("\n{}\n", answer.response);
    if answer.results.used_fallback() {
        println!("(No items matched every filter; showing the closest meals instead.)");
    }
    for (i, candidate) in answer.results.iter().enumerate() {
        let item = &candidate.item;
        println!("  {}. {} ({})", i + 1, item.name, item.restaurant_display());
        println!(
            "     {} cal | P {} | C {} | F {} | fiber {}",
            format_amount(item.calories),
            format_amount(item.protein_g),
            format_amount(item.carbs_g),
            format_amount(item.fat_g),
            format_amount(item.fiber_g),
        );
        if !item.dietary_labels.is_empty() {
            println!("     {}", item.dietary_labels);
        }
    }
    println!();
}

fn print_filters(state: &ConversationState) {
    let filters = state.active_filters();
    if filters.is_empty() {
        println!("No active filters.");
    } else {
        for filter in filters {
            println!("  - {filter}");
        }
    }
}

async fn repl(assistant: &NutritionAssistant, min_interval: Duration) -> Result<()> {
    let mut editor = DefaultEditor::new()?;
    let mut state = ConversationState::new();
    let mut last_request: Option<Instant> = None;

    println!("Ask about meals (e.g. \"high protein vegan dinner, not at Sprout\").");
    println!("Commands: /filters, /reset, /quit\n");

    loop {
        let line = match editor.readline("you> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };
        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        let _ = editor.add_history_entry(query);

        match query {
            "/quit" | "/exit" => break,
            "/reset" => {
                state.reset();
                println!("Conversation and filters cleared.");
                continue;
            }
            "/filters" => {
                print_filters(&state);
                continue;
            }
            _ => {}
        }

        if let Some(elapsed) = last_request.map(|at| at.elapsed()) {
            if elapsed < min_interval {
                let wait = (min_interval - elapsed).as_secs_f32();
                println!("Please wait {wait:.1}s before the next question.");
                continue;
            }
        }
        last_request = Some(Instant::now());

        match assistant.ask(&mut state, query).await {
            Ok(answer) => print_answer(&answer),
            Err(e) if e.is_upstream() => {
                warn!(error = %e, "upstream service unavailable");
                println!("The recommendation service is unavailable right now: {e}");
            }
            Err(e) => return Err(e.into()),
        }
    }

    info!(turns = state.history().len() / 2, "session ended");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(&cli)?;
    let assistant = build_assistant(&cli, config)?;
    repl(&assistant, Duration::from_secs(cli.min_interval_secs)).await
}
