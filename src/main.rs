//! Leadscope CLI
//!
//! Subcommands mirror the original interactive flow: `search` streams leads
//! into the terminal, `select` picks one company, `scrape` snapshots its
//! website, `ask` answers questions against the snapshot with a local LLM.

use clap::Parser;
use leadscope::config::AppConfig;
use leadscope::embedding::EmbeddingEngine;
use leadscope::leads::{LeadClient, LeadEvent, LeadRecord};
use leadscope::llm::{prompt::build_prompt, CompletionProvider, OllamaProvider};
use leadscope::retrieval::{IndexStore, Retriever};
use leadscope::scrape::{snapshot_path, Scraper};
use leadscope::session::Session;
use leadscope::{log_error, log_info, logging};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Stream company leads for an industry and location
    Search {
        /// Industry to search (e.g. mining, restaurant, hotel)
        #[arg(long)]
        industry: String,
        /// Location to search (e.g. "Sudbury, MA, USA")
        #[arg(long)]
        location: String,
    },
    /// Show the saved search results
    List,
    /// Select a company from the results by its number
    Select {
        /// 1-based position in the result list
        number: usize,
    },
    /// Scrape the selected company's website into the corpus snapshot
    Scrape,
    /// Ask a question about the selected company
    Ask {
        /// The question
        question: String,
    },
}

#[derive(Parser, Debug)]
#[command(name = "leadscope")]
#[command(version = "0.1.0")]
#[command(about = "Find company leads and ask questions about them with a local LLM", long_about = None)]
struct Args {
    /// Configuration file path (overrides defaults)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Data directory (default: ~/.local/share/leadscope)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let mut config = AppConfig::load(args.config.as_deref())?;
    if let Some(dir) = args.data_dir {
        config.data_dir = Some(dir);
    }
    config.validate()?;

    logging::init_logger(args.verbose || config.debug)?;
    log_info!("Command: {:?}", args.command);

    let data_dir = config.data_dir();
    tracing::info!("Using data directory {:?}", data_dir);

    match args.command {
        Command::Search { industry, location } => run_search(&config, &industry, &location).await,
        Command::List => run_list(&data_dir),
        Command::Select { number } => run_select(&data_dir, number),
        Command::Scrape => run_scrape(&config).await,
        Command::Ask { question } => run_ask(&config, &question).await,
    }
}

async fn run_search(config: &AppConfig, industry: &str, location: &str) -> anyhow::Result<()> {
    println!("Searching for {} companies in {}...", industry, location);

    let client = LeadClient::new(config.api.url.clone(), config.api.timeout_secs);
    let mut collected: Vec<LeadRecord> = Vec::new();

    let completion = client
        .stream(industry, location, |event| {
            if let LeadEvent::Batch {
                items,
                total_scraped,
            } = event
            {
                for record in items {
                    collected.push(record.clone());
                    print_lead(collected.len(), record);
                }
                println!("  ... receiving data, total found: {}", total_scraped);
            }
        })
        .await
        .map_err(|e| {
            log_error!("Lead stream failed: {}", e);
            anyhow::anyhow!("Failed to connect to the lead-search API: {}", e)
        })?;

    match completion {
        Some(LeadEvent::Completed {
            total_scraped,
            elapsed_time,
        }) => println!(
            "Search complete: {} results in {:.2} seconds.",
            total_scraped, elapsed_time
        ),
        _ => println!("Search ended but no completion confirmation was received."),
    }

    let data_dir = config.data_dir();
    let mut session = Session::load(&data_dir).unwrap_or_default();
    session.set_leads(collected);
    session.save(&data_dir)?;
    println!("Saved {} leads. Pick one with `leadscope select <number>`.", session.leads.len());

    Ok(())
}

fn run_list(data_dir: &PathBuf) -> anyhow::Result<()> {
    let session = Session::load(data_dir)?;
    if session.leads.is_empty() {
        println!("No saved results. Run `leadscope search` first.");
        return Ok(());
    }

    for (i, record) in session.leads.iter().enumerate() {
        print_lead(i + 1, record);
    }
    Ok(())
}

fn run_select(data_dir: &PathBuf, number: usize) -> anyhow::Result<()> {
    let mut session = Session::load(data_dir)?;

    match session.select(number) {
        Ok(record) => {
            println!("Selected: {}", record.company);
            println!("  Industry: {}", record.industry.as_deref().unwrap_or("N/A"));
            println!("  Phone:    {}", record.business_phone.as_deref().unwrap_or("N/A"));
            println!("  Website:  {}", record.website.as_deref().unwrap_or("N/A"));
            println!("  Street:   {}", record.street.as_deref().unwrap_or("N/A"));
            println!("  City:     {}", record.city.as_deref().unwrap_or("N/A"));
            session.save(data_dir)?;
            println!("Run `leadscope scrape` to fetch its website.");
            Ok(())
        }
        Err(e) => {
            println!("{}", e);
            Ok(())
        }
    }
}

async fn run_scrape(config: &AppConfig) -> anyhow::Result<()> {
    let data_dir = config.data_dir();
    let session = Session::load(&data_dir)?;
    let record = match session.selected_lead() {
        Ok(record) => record.clone(),
        Err(e) => {
            println!("{}", e);
            return Ok(());
        }
    };

    println!("Scraping website for {}...", record.company);
    let scraper = Scraper::new(config.scrape.clone());
    let path = scraper.snapshot_company(&record, &data_dir).await?;
    println!("Snapshot written to {}.", path.display());
    println!("Ask away: `leadscope ask \"What does this company do?\"`");

    Ok(())
}

async fn run_ask(config: &AppConfig, question: &str) -> anyhow::Result<()> {
    let data_dir = config.data_dir();
    let session = Session::load(&data_dir)?;
    let record = match session.selected_lead() {
        Ok(record) => record.clone(),
        Err(e) => {
            println!("{}", e);
            return Ok(());
        }
    };

    let snapshot = snapshot_path(&data_dir);
    if !snapshot.exists() {
        println!(
            "No corpus snapshot for {}. Run `leadscope scrape` first.",
            record.company
        );
        return Ok(());
    }
    let corpus = std::fs::read_to_string(&snapshot)?;
    if corpus.trim().is_empty() {
        println!("The corpus snapshot is empty; re-run `leadscope scrape`.");
        return Ok(());
    }

    // Fail fast on the model connection before paying embedding cost
    let provider = OllamaProvider::new(config.llm.clone());
    if let Err(e) = provider.validate_connection().await {
        log_error!("Ollama connection failed: {}", e);
        println!("Cannot reach the local language model: {}", e);
        println!("Make sure Ollama is running:");
        println!("  ollama serve");
        println!("  ollama pull {}", provider.model_name());
        return Ok(());
    }

    println!("Thinking about {}...", record.company);

    let embedder = Arc::new(EmbeddingEngine::new().await?);
    let store = IndexStore::new(data_dir.clone());
    let retriever = Retriever::new(embedder, store, config.retrieval.clone());

    let context = retriever.answer_context(&corpus, question).await?;
    let prompt = build_prompt(&context, question);
    let answer = provider.generate(&prompt).await?;

    println!("\n{}", answer);
    Ok(())
}

fn print_lead(number: usize, record: &LeadRecord) {
    println!(
        "{:>3}. {} | {} | {} | {}",
        number,
        record.company,
        record.industry.as_deref().unwrap_or("N/A"),
        record.city.as_deref().unwrap_or("N/A"),
        record.website.as_deref().unwrap_or("N/A"),
    );
}
