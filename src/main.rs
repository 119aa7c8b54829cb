use anyhow::{Context, Result};
use askdoc::cli::{ClearTarget, Cli, Commands};
use askdoc::{utils, Assistant, SearchIndexer, SendOutcome, Settings};
use clap::Parser;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::io::{self, AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::new()?;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut assistant = Assistant::open(&settings).await?;

    let result = match cli.command {
        Commands::Ask {
            question,
            document,
            no_cache,
        } => handle_ask(&mut assistant, question, document, no_cache).await,
        Commands::Interactive { document, no_cache } => {
            handle_interactive(&mut assistant, document, no_cache).await
        }
        Commands::History => handle_history(&assistant).await,
        Commands::Search { document, query } => handle_search(&settings, document, query).await,
        Commands::Usage => handle_usage(&assistant).await,
        Commands::Clear { target } => handle_clear(&mut assistant, target).await,
    };

    assistant.flush().await;
    result
}

async fn load_document(assistant: &mut Assistant, path: &Path) -> Result<()> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read document {:?}", path))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    assistant.load_document(&name, text).await;
    utils::print_info(&format!("Loaded document '{}'", name));
    Ok(())
}

fn print_outcome(outcome: &SendOutcome) {
    match outcome {
        SendOutcome::Answered { reply, cached, .. } => {
            if *cached {
                utils::print_info("(cached)");
            }
            println!("{}\n", reply);
        }
        SendOutcome::Failed { message } => utils::print_error(&format!("Error: {}\n", message)),
    }
}

async fn handle_ask(
    assistant: &mut Assistant,
    question: String,
    document: Option<PathBuf>,
    no_cache: bool,
) -> Result<()> {
    if let Some(path) = document {
        load_document(assistant, &path).await?;
    }
    if no_cache {
        assistant.set_cache_enabled(false);
    }

    utils::print_info("Sending request...");
    let outcome = assistant.send(&question).await;
    print_outcome(&outcome);

    if let SendOutcome::Failed { .. } = outcome {
        anyhow::bail!("request failed");
    }
    Ok(())
}

async fn handle_interactive(
    assistant: &mut Assistant,
    document: Option<PathBuf>,
    no_cache: bool,
) -> Result<()> {
    utils::print_header("Interactive Mode");
    utils::print_info("Type your questions, /help for commands (Ctrl+C to exit)\n");

    if let Some(path) = document {
        load_document(assistant, &path).await?;
    }
    if no_cache {
        assistant.set_cache_enabled(false);
    }

    let stdin = io::stdin();
    let mut reader = BufReader::new(stdin);

    loop {
        utils::print_prompt("You: ");
        std::io::stdout().flush().ok();

        let mut input = String::new();
        if reader.read_line(&mut input).await? == 0 {
            break;
        }

        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        if let Some(command) = input.strip_prefix('/') {
            let (name, arg) = command
                .split_once(' ')
                .map(|(n, a)| (n, a.trim()))
                .unwrap_or((command, ""));

            match name {
                "quit" | "exit" => break,
                "help" => print_help(),
                "load" if !arg.is_empty() => {
                    if let Err(e) = load_document(assistant, Path::new(arg)).await {
                        utils::print_error(&format!("{:#}", e));
                    }
                }
                "search" => {
                    if !assistant.has_document() {
                        utils::print_info("Load a document first with /load <path>\n");
                        continue;
                    }
                    assistant.search(arg);
                    utils::print_info("Searching...");
                    let state = assistant.search_results().await;
                    utils::print_matches(&state.query, &state.results);
                    println!();
                }
                "cache" => match arg {
                    "on" => {
                        assistant.set_cache_enabled(true);
                        utils::print_success("Caching enabled\n");
                    }
                    "off" => {
                        assistant.set_cache_enabled(false);
                        utils::print_success("Caching disabled\n");
                    }
                    "clear" => {
                        assistant.clear_cache().await;
                        utils::print_success("Cache cleared, usage totals reset\n");
                    }
                    _ => {
                        let state = if assistant.cache_enabled() { "on" } else { "off" };
                        utils::print_info(&format!(
                            "Caching is {} ({} entries stored)\n",
                            state,
                            assistant.cached_entries().await
                        ));
                    }
                },
                "usage" => {
                    utils::print_usage(&assistant.usage(), &assistant.usage_rates());
                    println!();
                }
                "history" => {
                    for line in assistant.history().await {
                        utils::print_line(&line);
                    }
                    println!();
                }
                "clear" => {
                    assistant.clear_history().await;
                    utils::print_success("History cleared\n");
                }
                _ => utils::print_error("Unknown command, try /help\n"),
            }
            continue;
        }

        utils::print_info("Assistant: ");
        let outcome = assistant.send(input).await;
        print_outcome(&outcome);
    }

    Ok(())
}

fn print_help() {
    println!("Special commands:");
    println!("  /load <path>      - Use a .txt document as context");
    println!("  /search <query>   - Find matching lines in the document");
    println!("  /cache on|off     - Toggle cache lookups");
    println!("  /cache clear      - Drop cached replies and reset usage");
    println!("  /cache            - Show cache status");
    println!("  /usage            - Show tokens and estimated cost");
    println!("  /history          - Show the conversation");
    println!("  /clear            - Clear the conversation");
    println!("  /help             - Show this help");
    println!("  /quit             - Exit\n");
}

async fn handle_history(assistant: &Assistant) -> Result<()> {
    let lines = assistant.history().await;
    if lines.is_empty() {
        utils::print_info("No conversation history");
        return Ok(());
    }

    utils::print_header("Conversation");
    for line in &lines {
        utils::print_line(line);
    }
    Ok(())
}

async fn handle_search(settings: &Settings, document: PathBuf, query: String) -> Result<()> {
    let text = tokio::fs::read_to_string(&document)
        .await
        .with_context(|| format!("Failed to read document {:?}", document))?;

    let mut indexer = SearchIndexer::new(settings.search.clone());
    indexer.load_document(&text);
    if !indexer.has_document() {
        utils::print_info("Document is empty");
        return Ok(());
    }

    indexer.search(&query);
    let state = indexer.settled().await;
    utils::print_matches(&state.query, &state.results);
    Ok(())
}

async fn handle_usage(assistant: &Assistant) -> Result<()> {
    utils::print_header("Usage since last cache clear");
    utils::print_usage(&assistant.usage(), &assistant.usage_rates());
    utils::print_info(&format!(
        "Cached replies: {}",
        assistant.cached_entries().await
    ));
    Ok(())
}

async fn handle_clear(assistant: &mut Assistant, target: ClearTarget) -> Result<()> {
    if matches!(target, ClearTarget::History | ClearTarget::All) {
        assistant.clear_history().await;
        utils::print_success("Conversation history cleared");
    }
    if matches!(target, ClearTarget::Cache | ClearTarget::All) {
        assistant.clear_cache().await;
        utils::print_success("Response cache cleared, usage totals reset");
    }
    Ok(())
}
