//! Extrato CLI - statement import reconciliation
//!
//! Usage:
//!   extrato import --file extrato.csv           Reconcile a statement file
//!   extrato import --file extrato.csv --json    Emit unified records as JSON
//!   extrato assign --file extrato.csv --id TX1 --category cat1

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Import {
            file,
            map,
            window,
            json,
            categories,
        } => commands::cmd_import(&file, map.as_deref(), window, json, categories.as_deref()),
        Commands::Assign {
            file,
            map,
            id,
            category,
            subcategory,
            categories,
        } => commands::cmd_assign(
            &file,
            map.as_deref(),
            &id,
            &category,
            subcategory.as_deref(),
            categories.as_deref(),
        ),
    }
}
