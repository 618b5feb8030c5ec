use anyhow::Result;
use std::path::Path;

use crate::config::Config;
use crate::pdf::cover::{insert_cover_page, insert_preface_pages, PageSize};
use crate::pdf::outline::apply_outline;
use crate::pdf::text::DocumentText;
use crate::pdf::PdfDocument;
use crate::toc::{describe_unresolved, FileCorrectionStore, OutlineEntry, TocError, TocResolver};

pub fn run<P: AsRef<Path>>(config_path: P) -> Result<()> {
    let config = Config::load(config_path)?;
    let (mut doc, outline) = prepare(&config)?;

    apply_outline(&mut doc.doc, &outline)?;

    println!("Saving {}", config.output.display());
    doc.save(&config.output)?;
    println!(
        "Wrote {} bookmark(s) to {}",
        outline.len(),
        config.output.display()
    );

    Ok(())
}

/// Open the input, add cover and preface pages, and resolve the outline
/// against the resulting page numbering.
pub fn prepare(config: &Config) -> Result<(PdfDocument, Vec<OutlineEntry>)> {
    let mut doc = PdfDocument::open(&config.input)?;
    let mut size = PageSize::default();

    if config.cover.size.is_some() {
        size = insert_cover_page(&mut doc, &config.cover)?;
        println!("Inserted cover page ({})", size);
    }

    if let Some(preface) = &config.preface {
        let position = usize::from(config.cover.size.is_some());
        let inserted = insert_preface_pages(&mut doc, &preface.pages(), size, position)?;
        println!("Inserted {} preface page(s)", inserted);
    }

    // Printed TOC page numbers move back by every page put in front
    let offset = config.offset + config.inserted_pages();

    let (start, end) = config
        .toc_pages
        .to_indices(offset, doc.page_count() as usize)?;

    let store = FileCorrectionStore::new(&config.corrections);
    let resolver = TocResolver::new()
        .with_corrections(&store)
        .with_duplicate_policy(config.duplicates);

    let resolved = match resolver.load_corrections()? {
        Some(entries) => {
            println!("Using manual corrections from {}", config.corrections.display());
            Ok(entries)
        }
        None => {
            let text = DocumentText::extract(&mut doc)?;
            resolver.scan(&text, start, end)
        }
    };

    match resolved {
        Ok(outline) => Ok((doc, outline)),
        Err(TocError::Unresolved {
            unresolved,
            saved_to,
        }) => {
            report_unresolved(&unresolved, saved_to.as_deref());
            anyhow::bail!(
                "{} heading(s) could not be located; no output was written",
                unresolved.len()
            )
        }
        Err(e) => Err(e.into()),
    }
}

fn report_unresolved(unresolved: &[OutlineEntry], saved_to: Option<&Path>) {
    println!("TOC check found unresolved headings:");
    for entry in unresolved {
        println!("{}", describe_unresolved(entry));
    }

    if let Some(path) = saved_to {
        println!(
            "\nAfter filling in the missing pages in {}, rerun with:",
            path.display()
        );
        println!("{}", rerun_command());
    }
}

fn rerun_command() -> String {
    std::env::args()
        .map(|arg| shell_quote(&arg))
        .collect::<Vec<_>>()
        .join(" ")
}

fn shell_quote(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:@%+,".contains(c));
    if plain {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r#"'"'"'"#))
    }
}
