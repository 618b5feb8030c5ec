use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::DEFAULT_CONFIG_PATH;

#[derive(Parser)]
#[command(name = "pdf-outline")]
#[command(about = "Generate PDF bookmarks from a printed table of contents")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add cover/preface pages, resolve the table of contents and write the bookmarked PDF
    Generate {
        /// JSON configuration file
        #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,
    },

    /// Resolve the table of contents and print it without writing a PDF
    Scan {
        /// JSON configuration file
        #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,
    },

    /// Print the bookmarks of a PDF
    Show {
        /// PDF file to inspect
        path: PathBuf,
    },
}
