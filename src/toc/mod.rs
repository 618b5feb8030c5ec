pub mod correction;
pub mod heading;
pub mod resolver;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

pub use correction::{describe_unresolved, FileCorrectionStore};
pub use resolver::{DuplicatePolicy, TocResolver};

/// One bookmark of the generated outline: `[level, title, page]`.
///
/// Serialized as a 3-element JSON array so the manual-correction file stays
/// easy to edit by hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(u32, String, u32)", into = "(u32, String, u32)")]
pub struct OutlineEntry {
    pub level: u32,
    pub title: String,
    /// 1-based physical page, 0 when unresolved
    pub page: u32,
}

impl OutlineEntry {
    pub fn new(level: u32, title: impl Into<String>, page: u32) -> Self {
        OutlineEntry {
            level,
            title: title.into(),
            page,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.page != 0
    }
}

impl From<(u32, String, u32)> for OutlineEntry {
    fn from((level, title, page): (u32, String, u32)) -> Self {
        OutlineEntry { level, title, page }
    }
}

impl From<OutlineEntry> for (u32, String, u32) {
    fn from(entry: OutlineEntry) -> Self {
        (entry.level, entry.title, entry.page)
    }
}

/// A heading registered while scanning the TOC pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleEntry {
    /// Position among all headings seen in the TOC range
    pub index: usize,
    pub level: u32,
    pub title: String,
    pub page: u32,
}

/// Linearized text of a document, one entry per physical page.
pub trait PageText {
    fn page_count(&self) -> usize;

    /// Lines of the page at the 0-based `index`, in reading order
    fn page_lines(&self, index: usize) -> Vec<&str>;
}

impl<S: AsRef<str>> PageText for [S] {
    fn page_count(&self) -> usize {
        self.len()
    }

    fn page_lines(&self, index: usize) -> Vec<&str> {
        self.get(index)
            .map(|text| text.as_ref().lines().collect())
            .unwrap_or_default()
    }
}

#[derive(Debug, Error)]
pub enum TocError {
    #[error("{} heading(s) never reappear after the table of contents", .unresolved.len())]
    Unresolved {
        unresolved: Vec<OutlineEntry>,
        /// Where the full entry list was written for manual correction
        saved_to: Option<PathBuf>,
    },

    #[error("Malformed manual-correction file {}: {source}", .path.display())]
    MalformedCorrection {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to access manual-correction file {}: {source}", .path.display())]
    CorrectionIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("TOC pages {}-{} are out of range (document has {total} pages)", .start + 1, .end + 1)]
    InvalidRange {
        start: usize,
        end: usize,
        total: usize,
    },
}
