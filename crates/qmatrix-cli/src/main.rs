//! qmatrix CLI
//!
//! Command-line interface for restoring matrix questions from backup documents

use clap::{Parser, Subcommand};

mod commands;
mod config;

#[derive(Debug, Parser)]
#[command(name = "qmatrix")]
#[command(about = "Restore matrix questions from backups", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Restore a backup document into the database
    Restore(commands::restore::RestoreArgs),
    /// Print the stored matrix of a question as JSON
    Show(commands::show::ShowArgs),
    /// Print the content identity hash of each question in a backup
    Hash(commands::hash::HashArgs),
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Restore(args) => commands::restore::execute(args),
        Commands::Show(args) => commands::show::execute(args),
        Commands::Hash(args) => commands::hash::execute(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
