use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "askdoc")]
#[command(author, version, about = "Document-aware chat with cached answers and usage tracking", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Ask a single question
    Ask {
        question: String,

        /// Plain-text document sent as context
        #[arg(short = 'd', long)]
        document: Option<PathBuf>,

        /// Skip cache lookups for this run
        #[arg(long)]
        no_cache: bool,
    },

    /// Start an interactive chat session
    Interactive {
        /// Plain-text document sent as context and searchable with /search
        #[arg(short = 'd', long)]
        document: Option<PathBuf>,

        /// Start with cache lookups disabled
        #[arg(long)]
        no_cache: bool,
    },

    /// Print the stored conversation
    History,

    /// Find lines of a document containing a query (case-insensitive)
    Search { document: PathBuf, query: String },

    /// Show token usage and estimated cost since the last cache clear
    Usage,

    /// Delete stored data
    Clear {
        #[arg(value_enum)]
        target: ClearTarget,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ClearTarget {
    /// Conversation history
    History,
    /// Cached replies and usage totals
    Cache,
    /// Both
    All,
}
