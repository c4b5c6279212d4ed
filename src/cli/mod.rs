//! CLI command definitions and parsing
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "hybridrank",
    version,
    author = "neur0map",
    about = "Hybrid lexical and semantic document search with Reciprocal Rank Fusion",
    long_about = "Hybridrank loads a document corpus, ranks it for a query by full-text relevance \
                  and embedding similarity under a metadata filter, and fuses both rankings into one \
                  ordered result list."
)]
pub struct Cli {
    /// Global config file path (defaults to ~/.config/hybridrank/config.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one hybrid search over a JSON-lines corpus
    Search {
        /// Corpus file, one document object per line
        #[arg(long, value_name = "FILE")]
        corpus: PathBuf,

        /// Search request JSON file (reads stdin when omitted)
        #[arg(short, long, value_name = "FILE")]
        request: Option<PathBuf>,

        /// Include query diagnostics on every row
        #[arg(long)]
        debug: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Validate configuration file
    Validate {
        /// Path to config file (defaults to standard location)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Initialize default configuration
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

impl Cli {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_search() {
        let cli = Cli::parse_from([
            "hybridrank",
            "search",
            "--corpus",
            "docs.jsonl",
            "--debug",
            "-v",
        ]);
        assert!(cli.verbose);
        match cli.command {
            Commands::Search {
                corpus,
                request,
                debug,
            } => {
                assert_eq!(corpus, PathBuf::from("docs.jsonl"));
                assert!(request.is_none());
                assert!(debug);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
