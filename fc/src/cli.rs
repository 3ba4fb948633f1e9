//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// fc - JPDB frequency cache
#[derive(Parser)]
#[command(
    name = "fc",
    about = "Versioned local cache of JPDB word frequency ranks",
    version,
    after_help = "Logs are written to: ~/.local/share/freqcache/logs/fc.log"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    /// Read the version token and dataset from a local directory instead of HTTP
    #[arg(long, global = true, value_name = "DIR")]
    pub from_dir: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Subcommand)]
pub enum Command {
    /// Check the dataset version and load it when needed
    Init,

    /// Print the frequency rank of each word
    Lookup {
        /// Words to look up
        #[arg(required = true)]
        words: Vec<String>,
    },

    /// List stored words containing the given text, most frequent first
    Search {
        /// Text the words must contain
        kanji: String,

        /// Maximum number of results
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Drop the local data and load it again
    Reload,

    /// Show stored version, row count and cache state
    Status,
}

/// Location of the log file
pub fn get_log_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("freqcache")
        .join("logs")
        .join("fc.log")
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_lookup_with_globals() {
        let cli = Cli::try_parse_from(["fc", "lookup", "猫", "日本", "--from-dir", "/tmp/jpdb", "-v"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.from_dir, Some(PathBuf::from("/tmp/jpdb")));
        match cli.command {
            Command::Lookup { words } => assert_eq!(words, vec!["猫", "日本"]),
            _ => panic!("Expected lookup"),
        }
    }

    #[test]
    fn test_lookup_requires_words() {
        assert!(Cli::try_parse_from(["fc", "lookup"]).is_err());
    }

    #[test]
    fn test_parse_search_limit() {
        let cli = Cli::try_parse_from(["fc", "search", "日", "--limit", "5"]).unwrap();
        match cli.command {
            Command::Search { kanji, limit } => {
                assert_eq!(kanji, "日");
                assert_eq!(limit, Some(5));
            }
            _ => panic!("Expected search"),
        }
    }

    #[test]
    fn test_log_path() {
        assert!(get_log_path().ends_with("freqcache/logs/fc.log"));
    }
}
