//! CLI interface using clap
//!
//! Operational commands for inspecting and exercising a CodeDojo
//! deployment without the chat platform attached.

mod commands;

pub use commands::*;

use clap::{Parser, Subcommand};

/// CodeDojo - AI-reviewed coding challenges for chat servers
#[derive(Parser, Debug)]
#[command(name = "codedojo")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Path to the SQLite database (overrides the config file)
    #[arg(short, long, global = true)]
    pub database: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json)
    #[arg(short = 'o', long, global = true, default_value = "text")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show submission and user counts from the database
    Stats(StatsArgs),

    /// List the challenge catalog
    Catalog(CatalogArgs),

    /// Check whether the review endpoint is reachable
    CheckLlm(CheckLlmArgs),
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Arguments for stats command
#[derive(Parser, Debug)]
pub struct StatsArgs {
    /// Also show per-user stats for this user id
    #[arg(short, long)]
    pub user: Option<String>,

    /// Guild to scope --user lookups to
    #[arg(short, long)]
    pub guild: Option<String>,
}

/// Arguments for catalog command
#[derive(Parser, Debug)]
pub struct CatalogArgs {
    /// Filter by difficulty (beginner, intermediate, advanced)
    #[arg(short, long)]
    pub tier: Option<String>,

    /// Show full descriptions
    #[arg(long)]
    pub detailed: bool,
}

/// Arguments for check-llm command
#[derive(Parser, Debug)]
pub struct CheckLlmArgs {
    /// Also send a one-off test prompt
    #[arg(long)]
    pub probe: bool,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from(["codedojo", "catalog", "--tier", "beginner"]);
        assert!(matches!(cli.command, Commands::Catalog(_)));

        if let Commands::Catalog(args) = cli.command {
            assert_eq!(args.tier.as_deref(), Some("beginner"));
        }
    }

    #[test]
    fn test_stats_command() {
        let cli = Cli::parse_from(["codedojo", "-d", "/tmp/dojo.db", "stats"]);
        assert_eq!(cli.database.as_deref(), Some("/tmp/dojo.db"));
        assert!(matches!(cli.command, Commands::Stats(_)));
    }

    #[test]
    fn test_format_flag() {
        let cli = Cli::parse_from(["codedojo", "-o", "json", "stats"]);
        assert_eq!(cli.format, OutputFormat::Json);
    }
}
