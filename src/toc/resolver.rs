use serde::Deserialize;
use std::collections::HashMap;

use tracing::{debug, info, warn};

use super::correction::{check_unresolved, CorrectionStore};
use super::heading::{clean_title, HeadingMatcher, NumberedHeadings};
use super::{OutlineEntry, PageText, TitleEntry, TocError};

/// What happens when the TOC range lists the same cleaned title twice.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
    /// The later occurrence takes over the index and level
    #[default]
    LastWins,
    /// The later occurrence is ignored
    FirstWins,
}

/// Headings keyed by cleaned title, with their first-seen order kept
/// separately from the map.
#[derive(Debug, Default)]
pub struct TitleRegistry {
    entries: Vec<TitleEntry>,
    slots: HashMap<String, usize>,
    next_index: usize,
    policy: DuplicatePolicy,
}

impl TitleRegistry {
    pub fn new(policy: DuplicatePolicy) -> Self {
        TitleRegistry {
            policy,
            ..Default::default()
        }
    }

    /// Register a heading seen on a TOC page.
    pub fn register(&mut self, level: u32, title: String) {
        let index = self.next_index;
        self.next_index += 1;

        if let Some(&slot) = self.slots.get(&title) {
            let existing = &mut self.entries[slot];
            warn!(
                title = %title,
                first = existing.index,
                repeat = index,
                policy = ?self.policy,
                "duplicate heading in table of contents"
            );
            if self.policy == DuplicatePolicy::LastWins {
                existing.index = index;
                existing.level = level;
            }
            return;
        }

        self.slots.insert(title.clone(), self.entries.len());
        self.entries.push(TitleEntry {
            index,
            level,
            title,
            page: 0,
        });
    }

    /// Record that `title` appears on `page`. Returns true if this resolved
    /// the entry; an entry that already has a page keeps it.
    pub fn resolve(&mut self, title: &str, page: u32) -> bool {
        match self.slots.get(title) {
            Some(&slot) if self.entries[slot].page == 0 => {
                self.entries[slot].page = page;
                true
            }
            _ => false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Outline entries in TOC reading order.
    pub fn into_outline(mut self) -> Vec<OutlineEntry> {
        self.entries.sort_by_key(|entry| entry.index);
        self.entries
            .into_iter()
            .map(|entry| OutlineEntry {
                level: entry.level,
                title: entry.title,
                page: entry.page,
            })
            .collect()
    }
}

/// Builds a bookmark list from the printed table of contents of a document.
pub struct TocResolver<'a> {
    matcher: Box<dyn HeadingMatcher + 'a>,
    corrections: Option<&'a dyn CorrectionStore>,
    duplicates: DuplicatePolicy,
}

impl Default for TocResolver<'_> {
    fn default() -> Self {
        TocResolver {
            matcher: Box::new(NumberedHeadings),
            corrections: None,
            duplicates: DuplicatePolicy::default(),
        }
    }
}

impl<'a> TocResolver<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(dead_code)]
    pub fn with_matcher(mut self, matcher: impl HeadingMatcher + 'a) -> Self {
        self.matcher = Box::new(matcher);
        self
    }

    /// Read manual corrections from `store` instead of scanning when it has
    /// any, and write the entry list there when headings stay unresolved.
    pub fn with_corrections(mut self, store: &'a dyn CorrectionStore) -> Self {
        self.corrections = Some(store);
        self
    }

    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicates = policy;
        self
    }

    /// Resolve the outline for a document whose table of contents spans the
    /// 0-based pages `start..=end`. Stored manual corrections win over
    /// scanning.
    #[allow(dead_code)]
    pub fn resolve<P: PageText + ?Sized>(
        &self,
        pages: &P,
        start: usize,
        end: usize,
    ) -> Result<Vec<OutlineEntry>, TocError> {
        if let Some(entries) = self.load_corrections()? {
            return Ok(entries);
        }
        self.scan(pages, start, end)
    }

    /// Entries from the correction store, if one is configured and has any.
    pub fn load_corrections(&self) -> Result<Option<Vec<OutlineEntry>>, TocError> {
        let Some(store) = self.corrections else {
            return Ok(None);
        };

        let entries = store.load()?;
        if let Some(entries) = &entries {
            info!(
                entries = entries.len(),
                source = %store.describe(),
                "using manual corrections instead of scanning"
            );
        }
        Ok(entries)
    }

    /// Scan the document without consulting stored corrections. Unresolved
    /// headings are written to the correction store.
    pub(crate) fn scan<P: PageText + ?Sized>(
        &self,
        pages: &P,
        start: usize,
        end: usize,
    ) -> Result<Vec<OutlineEntry>, TocError> {
        let total = pages.page_count();
        if start > end || end >= total {
            return Err(TocError::InvalidRange { start, end, total });
        }

        let mut registry = self.scan_toc(pages, start, end);
        if registry.is_empty() {
            warn!(
                start = start + 1,
                end = end + 1,
                "no numbered headings found on the TOC pages"
            );
            return Ok(Vec::new());
        }

        self.scan_body(pages, end + 1, &mut registry);

        let outline = registry.into_outline();
        check_unresolved(&outline, self.corrections)?;

        Ok(outline)
    }

    fn scan_toc<P: PageText + ?Sized>(&self, pages: &P, start: usize, end: usize) -> TitleRegistry {
        let mut registry = TitleRegistry::new(self.duplicates);

        for page in start..=end {
            for line in pages.page_lines(page) {
                let Some(heading) = self.matcher.match_line(line) else {
                    continue;
                };
                let title = clean_title(heading.text);
                if title.is_empty() {
                    continue;
                }
                debug!(page = page + 1, level = heading.level(), title = %title, "toc heading");
                registry.register(heading.level(), title);
            }
        }

        info!(headings = registry.len(), "scanned table of contents");
        registry
    }

    fn scan_body<P: PageText + ?Sized>(&self, pages: &P, first: usize, registry: &mut TitleRegistry) {
        let mut resolved = 0;

        for page in first..pages.page_count() {
            for line in pages.page_lines(page) {
                let Some(heading) = self.matcher.match_line(line) else {
                    continue;
                };
                let title = clean_title(heading.text);
                let page_number = page as u32 + 1;
                if registry.resolve(&title, page_number) {
                    debug!(page = page_number, title = %title, "heading located");
                    resolved += 1;
                }
            }
        }

        info!(resolved, total = registry.len(), "matched headings against body pages");
    }
}
