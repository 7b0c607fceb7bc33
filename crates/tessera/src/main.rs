//! Tessera CLI - extension management for the Tessera imaging application
//!
//! This is the main entry point for the tessera command-line interface.

mod cli;
mod commands;
mod context;
mod output;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI args
    let cli = Cli::parse();

    // Initialize tracing
    init_tracing(cli.verbose, cli.quiet);

    // Run command
    match cli.command {
        Commands::List(ref args) => commands::list::run(args, &cli),
        Commands::Install(ref args) => commands::install::run(args, &cli),
        Commands::Remove(ref args) => commands::remove::run(args, &cli),
        Commands::Enable(ref args) => commands::enable::run(args, true, &cli),
        Commands::Disable(ref args) => commands::enable::run(args, false, &cli),
        Commands::Bookmark(ref args) => commands::bookmark::run(args, &cli),
        Commands::Info(ref args) => commands::info::run(args, &cli),
        Commands::Check(ref args) => commands::check::run(args, &cli),
        Commands::Sync(ref args) => commands::sync::run(args, &cli).await,
        Commands::Update(ref args) => commands::update::run(args, &cli),
        Commands::Export(ref args) => commands::export::run(args, &cli),
    }
}

/// Initialize tracing with appropriate verbosity
fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("warn"),
            1 => EnvFilter::new("info"),
            2 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();
}
