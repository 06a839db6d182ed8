//! Price Agent Command Line Interface
//!
//! # Usage
//!
//! ```bash
//! # Chat with the agent (needs LLM_API_KEY)
//! price-agent chat
//!
//! # Match a phrase directly, no LLM involved
//! price-agent search "замена масла"
//!
//! # Inspect normalization
//! price-agent lemmas "Замена масляного фильтра"
//!
//! # Show the coverage ratio of every entry
//! price-agent explain "сколько стоит диагностика" --format json
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use serde::Serialize;

use price_agent::agent::{render_answer, HISTORY_CLEARED};
use price_agent::price_matcher::{CatalogIndex, CatalogMatcher, MatchExplanation};
use price_agent::{
    load_price_list, AgentConfig, InMemoryConversationStore, LlmQueryExtractor, PriceAgent,
    ThreadId,
};

#[derive(Parser)]
#[command(name = "price-agent")]
#[command(version = "0.1.0")]
#[command(about = "Answer service and price questions from an auto service price list")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Price list CSV (overrides config and PRICE_LIST_PATH)
    #[arg(long, global = true)]
    price_list: Option<PathBuf>,

    /// Morphological dictionary (overrides config and MORPH_DICT_PATH)
    #[arg(long, global = true)]
    dictionary: Option<PathBuf>,

    /// YAML configuration file
    #[arg(long, global = true, env = "PRICE_AGENT_CONFIG")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'o', global = true, default_value = "text", value_enum)]
    format: OutputFormat,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive conversation (/start, /clean, /quit)
    Chat,

    /// Match a phrase against the price list without the LLM
    Search {
        /// Keyword phrase
        query: String,
    },

    /// Show lemmas and the expanded lemma set of a text
    Lemmas {
        text: String,
    },

    /// Show the coverage ratio and decision for every entry
    Explain {
        query: String,
    },
}

// =============================================================================
// MAIN
// =============================================================================

fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = load_config(&cli).and_then(|config| match &cli.command {
        Commands::Chat => cmd_chat(&config),
        Commands::Search { query } => cmd_search(&config, query, cli.format),
        Commands::Lemmas { text } => cmd_lemmas(&config, text, cli.format),
        Commands::Explain { query } => cmd_explain(&config, query, cli.format),
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", "ERROR:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn load_config(cli: &Cli) -> Result<AgentConfig> {
    let mut config =
        AgentConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(path) = &cli.price_list {
        config.price_list_path = path.clone();
    }
    if let Some(path) = &cli.dictionary {
        config.dictionary_path = Some(path.clone());
    }
    Ok(config)
}

fn build_matcher(config: &AgentConfig) -> Result<Arc<CatalogMatcher>> {
    let analyzer = config
        .analyzer()
        .context("Failed to load morphological dictionary")?;
    Ok(Arc::new(CatalogMatcher::with_config(
        analyzer,
        config.matcher_config(),
    )))
}

fn build_index(config: &AgentConfig) -> Result<Arc<CatalogIndex>> {
    let matcher = build_matcher(config)?;
    let entries = load_price_list(&config.price_list_path)
        .with_context(|| format!("Failed to load {}", config.price_list_path.display()))?;
    Ok(Arc::new(CatalogIndex::new(entries, matcher)))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// =============================================================================
// COMMANDS
// =============================================================================

fn cmd_search(config: &AgentConfig, query: &str, format: OutputFormat) -> Result<()> {
    let index = build_index(config)?;
    let found = index.search(Some(query));

    match format {
        OutputFormat::Json => print_json(&serde_json::json!({
            "query": query,
            "found": found,
            "answer": render_answer(found.iter().copied()),
        })),
        OutputFormat::Text => {
            println!("{}", render_answer(found.iter().copied()));
            Ok(())
        }
    }
}

fn cmd_lemmas(config: &AgentConfig, text: &str, format: OutputFormat) -> Result<()> {
    let matcher = build_matcher(config)?;
    let normalizer = matcher.normalizer();
    let lemmas = normalizer.lemmatize(text);
    let expanded = normalizer.expand(&lemmas);

    match format {
        OutputFormat::Json => print_json(&serde_json::json!({
            "text": text,
            "lemmas": lemmas,
            "expanded": expanded,
        })),
        OutputFormat::Text => {
            println!("{} {}", "Lemmas:".cyan().bold(), lemmas.join(" "));
            let expanded: Vec<&str> = expanded.iter().map(String::as_str).collect();
            println!("{} {{{}}}", "Expanded:".cyan().bold(), expanded.join(", "));
            Ok(())
        }
    }
}

#[derive(Serialize)]
struct ExplainRow<'a> {
    category: &'a str,
    service: &'a str,
    #[serde(flatten)]
    explanation: MatchExplanation,
}

fn cmd_explain(config: &AgentConfig, query: &str, format: OutputFormat) -> Result<()> {
    let index = build_index(config)?;

    let rows: Vec<ExplainRow> = index
        .entries()
        .iter()
        .enumerate()
        .filter_map(|(idx, entry)| {
            index.explain(query, idx).map(|explanation| ExplainRow {
                category: &entry.category,
                service: &entry.name,
                explanation,
            })
        })
        .collect();

    if format == OutputFormat::Json {
        return print_json(&rows);
    }

    let Some(first) = rows.first() else {
        println!("{}", "Query has no content words, nothing to match".yellow());
        return Ok(());
    };
    let query_lemmas: Vec<&str> = first
        .explanation
        .query_lemmas
        .iter()
        .map(String::as_str)
        .collect();
    println!("{} {{{}}}", "Query lemmas:".cyan().bold(), query_lemmas.join(", "));
    println!();

    for row in &rows {
        let verdict = if row.explanation.included {
            "MATCH".green().bold()
        } else {
            "skip ".dimmed()
        };
        let matched: Vec<&str> = row.explanation.matched.iter().map(String::as_str).collect();
        println!(
            "{} {:.2}  {} / {}  [{}]",
            verdict,
            row.explanation.ratio,
            row.category,
            row.service,
            matched.join(", ")
        );
    }
    Ok(())
}

fn cmd_chat(config: &AgentConfig) -> Result<()> {
    let index = build_index(config)?;
    let llm = config.llm_client()?;
    let agent = PriceAgent::new(
        index,
        Arc::new(LlmQueryExtractor::new(Arc::new(llm))),
        Arc::new(InMemoryConversationStore::new()),
    );
    let thread = ThreadId::cli();

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    let mut rl = DefaultEditor::new().context("Failed to initialize line editor")?;

    println!("{}", agent.greeting());
    println!("{}", "Commands: /start, /clean, /quit".dimmed());

    loop {
        let line = match rl.readline("> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let _ = rl.add_history_entry(line);

        match line {
            "/quit" | "/exit" => break,
            "/start" => println!("{}", agent.greeting()),
            "/clean" => {
                runtime.block_on(agent.reset(&thread));
                println!("{}", HISTORY_CLEARED);
            }
            text => match runtime.block_on(agent.handle_message(&thread, text)) {
                Ok(outcome) => println!("{}", outcome.answer),
                Err(e) => eprintln!("{} {}", "ERROR:".red().bold(), e),
            },
        }
    }

    Ok(())
}
