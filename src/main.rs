mod cli;
mod commands;
mod config;
mod page_range;
mod pdf;
mod toc;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate { config } => {
            commands::generate::run(&config)?;
        }
        Commands::Scan { config } => {
            commands::scan::run(&config)?;
        }
        Commands::Show { path } => {
            commands::show::run(&path)?;
        }
    }

    Ok(())
}
