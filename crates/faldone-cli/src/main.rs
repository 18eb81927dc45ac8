//! faldone: personal document archive with full-text search.

use std::path::PathBuf;

use anyhow::anyhow;
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use faldone_core::{Error, FaldoneConfig};
use faldone_store::DocumentStore;

mod commands;
mod open;
mod render;

#[derive(Debug, Parser)]
#[command(name = "faldone", version, about = "Personal document archive with full-text search")]
pub struct Cli {
    /// Non-default faldone location
    #[arg(short = 'f', long = "faldone", global = true)]
    faldone: Option<PathBuf>,

    /// More log output on stderr (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Put documents into faldone
    Put {
        /// Path to a document, or `-` for stdin
        document: PathBuf,
        /// Document title
        #[arg(short, long)]
        title: Option<String>,
        /// Comma-separated list of labels (tags)
        #[arg(short, long, default_value = "")]
        labels: String,
    },
    /// Search inside a faldone
    Search {
        /// Search query
        query: Vec<String>,
    },
    /// List all documents and exit
    List {
        /// Only documents carrying all of these comma-separated labels
        #[arg(short, long, default_value = "")]
        labels: String,
    },
    /// Print faldone statistics and exit
    Stats,
    /// Open document with preferred application
    Open {
        /// Document id
        id: i64,
    },
    /// Remove a document from faldone
    Delete {
        /// Document id
        id: i64,
    },
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = FaldoneConfig::from_env(cli.faldone)?;
    let store = DocumentStore::open(&config.store_path).map_err(|e| match e {
        Error::InvalidStoreFile(_) => anyhow!(
            "fatal: broken or invalid faldone at '{}'",
            config.store_path.display()
        ),
        other => other.into(),
    })?;

    let output = if cli.json {
        commands::Output::Json
    } else {
        commands::Output::Human
    };
    commands::run(cli.command, &store, output)
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
    fn test_parse_put() {
        let cli = Cli::try_parse_from([
            "faldone", "-f", "/tmp/x.db", "put", "scan.png", "-t", "Receipt", "-l", "food,2024",
        ])
        .unwrap();
        assert_eq!(cli.faldone, Some(PathBuf::from("/tmp/x.db")));
        match cli.command {
            Command::Put {
                document,
                title,
                labels,
            } => {
                assert_eq!(document, PathBuf::from("scan.png"));
                assert_eq!(title.as_deref(), Some("Receipt"));
                assert_eq!(labels, "food,2024");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_search_joins_words() {
        let cli = Cli::try_parse_from(["faldone", "search", "quick", "fox", "--json"]).unwrap();
        assert!(cli.json);
        match cli.command {
            Command::Search { query } => assert_eq!(query.join(" "), "quick fox"),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_command_required() {
        assert!(Cli::try_parse_from(["faldone"]).is_err());
    }

    #[test]
    fn test_open_requires_integer_id() {
        assert!(Cli::try_parse_from(["faldone", "open", "abc"]).is_err());
        assert!(Cli::try_parse_from(["faldone", "open", "3"]).is_ok());
    }
}
