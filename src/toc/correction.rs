use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::{OutlineEntry, TocError};

/// Default location of the manual-correction file, relative to the working
/// directory.
pub const DEFAULT_CORRECTIONS_PATH: &str = "outline_errors.json";

/// Persistence for an operator-edited outline.
///
/// When `load` returns entries they replace scanning entirely; `save`
/// receives the full entry list of a run that left headings unresolved.
pub trait CorrectionStore {
    fn load(&self) -> Result<Option<Vec<OutlineEntry>>, TocError>;

    fn save(&self, entries: &[OutlineEntry]) -> Result<(), TocError>;

    /// Human-readable location, used in messages
    fn describe(&self) -> String;

    /// File the operator should edit, if the store is file-backed
    fn location(&self) -> Option<PathBuf> {
        None
    }
}

/// Stores corrections as a JSON array of `[level, title, page]` triples.
#[derive(Debug, Clone)]
pub struct FileCorrectionStore {
    path: PathBuf,
}

impl FileCorrectionStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        FileCorrectionStore {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn io_error(&self, source: std::io::Error) -> TocError {
        TocError::CorrectionIo {
            path: self.path.clone(),
            source,
        }
    }
}

impl Default for FileCorrectionStore {
    fn default() -> Self {
        FileCorrectionStore::new(DEFAULT_CORRECTIONS_PATH)
    }
}

impl CorrectionStore for FileCorrectionStore {
    fn load(&self) -> Result<Option<Vec<OutlineEntry>>, TocError> {
        let json = match std::fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(e)),
        };

        // A present but broken file is never silently replaced by a new scan
        let entries =
            serde_json::from_str(&json).map_err(|source| TocError::MalformedCorrection {
                path: self.path.clone(),
                source,
            })?;
        Ok(Some(entries))
    }

    fn save(&self, entries: &[OutlineEntry]) -> Result<(), TocError> {
        let mut json = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut json, formatter);
        entries
            .serialize(&mut serializer)
            .map_err(|e| self.io_error(e.into()))?;
        json.push(b'\n');

        std::fs::write(&self.path, json).map_err(|e| self.io_error(e))?;
        info!(path = %self.path.display(), entries = entries.len(), "wrote manual-correction file");
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn location(&self) -> Option<PathBuf> {
        Some(self.path.clone())
    }
}

/// In-memory store, for callers that manage corrections themselves.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryCorrectionStore {
    entries: Option<Vec<OutlineEntry>>,
    saved: std::cell::RefCell<Option<Vec<OutlineEntry>>>,
}

#[cfg(test)]
impl MemoryCorrectionStore {
    pub fn with_entries(entries: Vec<OutlineEntry>) -> Self {
        MemoryCorrectionStore {
            entries: Some(entries),
            saved: std::cell::RefCell::new(None),
        }
    }

    /// The entry list handed to `save`, if any
    pub fn saved(&self) -> Option<Vec<OutlineEntry>> {
        self.saved.borrow().clone()
    }
}

#[cfg(test)]
impl CorrectionStore for MemoryCorrectionStore {
    fn load(&self) -> Result<Option<Vec<OutlineEntry>>, TocError> {
        Ok(self.entries.clone())
    }

    fn save(&self, entries: &[OutlineEntry]) -> Result<(), TocError> {
        *self.saved.borrow_mut() = Some(entries.to_vec());
        Ok(())
    }

    fn describe(&self) -> String {
        "in-memory corrections".to_string()
    }
}

/// Fail when any entry is still on page 0, after handing the complete list
/// to `store` so an operator can fill in the gaps.
pub fn check_unresolved(
    entries: &[OutlineEntry],
    store: Option<&dyn CorrectionStore>,
) -> Result<(), TocError> {
    let unresolved: Vec<OutlineEntry> = entries
        .iter()
        .filter(|entry| !entry.is_resolved())
        .cloned()
        .collect();

    if unresolved.is_empty() {
        return Ok(());
    }

    for entry in &unresolved {
        warn!(level = entry.level, title = %entry.title, "heading not found after the table of contents");
    }

    let saved_to = match store {
        Some(store) => {
            store.save(entries)?;
            store.location()
        }
        None => None,
    };

    Err(TocError::Unresolved {
        unresolved,
        saved_to,
    })
}

/// One line of the unresolved-heading report.
pub fn describe_unresolved(entry: &OutlineEntry) -> String {
    format!(
        "(error) [Level {} → Title: {} → Page {}]",
        entry.level, entry.title, entry.page
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_means_no_corrections() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCorrectionStore::new(dir.path().join("outline_errors.json"));
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCorrectionStore::new(dir.path().join("outline_errors.json"));
        let entries = vec![
            OutlineEntry::new(0, "概述", 3),
            OutlineEntry::new(1, "Details", 0),
        ];

        store.save(&entries).unwrap();
        assert_eq!(store.load().unwrap(), Some(entries));
    }

    #[test]
    fn test_saved_file_is_human_editable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("outline_errors.json");
        let store = FileCorrectionStore::new(&path);
        store.save(&[OutlineEntry::new(0, "概述", 0)]).unwrap();

        let json = std::fs::read_to_string(&path).unwrap();
        assert_eq!(json, "[\n    [\n        0,\n        \"概述\",\n        0\n    ]\n]\n");
    }

    #[test]
    fn test_hand_written_file_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fixed.json");
        std::fs::write(&path, r#"[[0, "Intro", 3], [1, "Scope", 4]]"#).unwrap();

        let entries = FileCorrectionStore::new(&path).load().unwrap().unwrap();
        assert_eq!(
            entries,
            vec![OutlineEntry::new(0, "Intro", 3), OutlineEntry::new(1, "Scope", 4)]
        );
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("outline_errors.json");

        std::fs::write(&path, "not json").unwrap();
        let err = FileCorrectionStore::new(&path).load().unwrap_err();
        assert!(matches!(err, TocError::MalformedCorrection { .. }));

        std::fs::write(&path, r#"[{"level": 0, "title": "x", "page": 1}]"#).unwrap();
        let err = FileCorrectionStore::new(&path).load().unwrap_err();
        assert!(matches!(err, TocError::MalformedCorrection { .. }));
    }

    #[test]
    fn test_check_passes_when_resolved() {
        let store = MemoryCorrectionStore::default();
        let entries = vec![OutlineEntry::new(0, "A", 1)];
        check_unresolved(&entries, Some(&store)).unwrap();
        assert_eq!(store.saved(), None);
    }

    #[test]
    fn test_check_reports_file_location() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("outline_errors.json");
        let store = FileCorrectionStore::new(&path);
        let entries = vec![OutlineEntry::new(0, "A", 1), OutlineEntry::new(1, "B", 0)];

        match check_unresolved(&entries, Some(&store)) {
            Err(TocError::Unresolved {
                unresolved,
                saved_to,
            }) => {
                assert_eq!(unresolved, vec![OutlineEntry::new(1, "B", 0)]);
                assert_eq!(saved_to, Some(path.clone()));
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(store.load().unwrap(), Some(entries));
    }

    #[test]
    fn test_describe_unresolved() {
        assert_eq!(
            describe_unresolved(&OutlineEntry::new(2, "Limits", 0)),
            "(error) [Level 2 → Title: Limits → Page 0]"
        );
    }
}
