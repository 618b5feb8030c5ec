use anyhow::Result;
use std::path::Path;

use super::generate::prepare;
use crate::config::Config;

pub fn run<P: AsRef<Path>>(config_path: P) -> Result<()> {
    let config = Config::load(config_path)?;
    let (_, outline) = prepare(&config)?;

    if outline.is_empty() {
        println!("No headings found.");
        return Ok(());
    }

    for entry in &outline {
        let indent = "  ".repeat(entry.level as usize);
        println!("{}{} (p. {})", indent, entry.title, entry.page);
    }

    Ok(())
}
