//! CodeDojo - AI-reviewed coding challenges for chat servers
//!
//! Operational entry point: inspect the database, list the catalog, and
//! probe the review endpoint.

use anyhow::Result;
use clap::Parser;
use codedojo::cli::{catalog, check_llm, stats, Cli, Commands};
use codedojo::config::BotConfig;
use std::path::Path;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse_args();

    // Setup logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let config = BotConfig::load_or_default(cli.config.as_deref().map(Path::new))?;
    let db_path = cli.database.clone().unwrap_or(config.database_path.clone());

    // Execute command
    match cli.command {
        Commands::Stats(args) => {
            stats(
                Path::new(&db_path),
                args.user.as_deref(),
                args.guild.as_deref(),
                cli.format,
            )?;
        }

        Commands::Catalog(args) => {
            catalog(args.tier.as_deref(), args.detailed, cli.format)?;
        }

        Commands::CheckLlm(args) => {
            check_llm(&config, args.probe).await?;
        }
    }

    Ok(())
}
