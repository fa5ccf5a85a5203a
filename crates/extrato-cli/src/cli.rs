//! CLI argument definitions using clap
//!
//! This module contains the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Extrato - reconcile bank statement exports into canonical transactions
#[derive(Parser)]
#[command(name = "extrato")]
#[command(about = "Statement import reconciliation", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Reconcile a statement file into canonical transactions
    Import {
        /// Statement CSV file to reconcile
        #[arg(short, long)]
        file: PathBuf,

        /// Column mapping override when the layout is not recognized
        /// (e.g. "date=Data,amount=Valor,identifier=ID,description=Histórico")
        #[arg(short, long)]
        map: Option<String>,

        /// Pairing window in days for refund/PIX detection
        #[arg(short, long)]
        window: Option<i64>,

        /// Emit unified records as JSON instead of a summary
        #[arg(long)]
        json: bool,

        /// Category catalog JSON file (enables PIX category pre-assignment)
        #[arg(short, long)]
        categories: Option<PathBuf>,
    },

    /// Assign a category to one transaction under the integrity guard
    Assign {
        /// Statement CSV file to reconcile first
        #[arg(short, long)]
        file: PathBuf,

        /// Column mapping override when the layout is not recognized
        #[arg(short, long)]
        map: Option<String>,

        /// Target transaction id
        #[arg(short, long)]
        id: String,

        /// Category id to assign
        #[arg(long)]
        category: String,

        /// Subcategory id to assign
        #[arg(long)]
        subcategory: Option<String>,

        /// Category catalog JSON file (validates the assignment)
        #[arg(short, long)]
        categories: Option<PathBuf>,
    },
}
