use anyhow::{Context, Result};
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::path::Path;

pub struct PdfDocument {
    pub doc: Document,
    pub path: String,
}

impl PdfDocument {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_str = path.as_ref().display().to_string();
        let doc =
            Document::load(&path).with_context(|| format!("Failed to open PDF: {}", path_str))?;
        Ok(PdfDocument {
            doc,
            path: path_str,
        })
    }

    #[cfg(test)]
    pub fn from_document(doc: Document) -> Self {
        PdfDocument {
            doc,
            path: "<memory>".to_string(),
        }
    }

    pub fn page_count(&self) -> u32 {
        self.doc.get_pages().len() as u32
    }

    /// Get 1-indexed page object IDs
    pub fn page_ids(&self) -> Vec<(u32, ObjectId)> {
        let mut pages: Vec<_> = self.doc.get_pages().into_iter().collect();
        pages.sort_by_key(|(num, _)| *num);
        pages
    }

    /// Insert `page` so that it becomes the page at 0-based `position`;
    /// `position == page_count` appends.
    ///
    /// The page is placed into the same `/Pages` node as the page it is
    /// inserted in front of, and every ancestor's `/Count` is bumped.
    pub fn insert_page(&mut self, position: usize, mut page: Dictionary) -> Result<ObjectId> {
        let pages = self.page_ids();
        if position > pages.len() {
            anyhow::bail!(
                "Cannot insert a page at position {} in {} ({} pages)",
                position + 1,
                self.path,
                pages.len()
            );
        }

        let anchor = pages.get(position).map(|(_, id)| *id);
        let parent_id = match (anchor, pages.last()) {
            (Some(anchor_id), _) => self.parent_of(anchor_id)?,
            (None, Some(&(_, last_id))) => self.parent_of(last_id)?,
            (None, None) => self.root_pages_id()?,
        };

        page.set("Type", "Page");
        page.set("Parent", parent_id);
        let page_id = self.doc.add_object(page);

        let kids = self
            .doc
            .get_dictionary_mut(parent_id)
            .and_then(|parent| parent.get_mut(b"Kids"))
            .and_then(Object::as_array_mut)
            .with_context(|| format!("Page tree node {:?} has no /Kids array", parent_id))?;
        let at = match anchor {
            Some(anchor_id) => kids
                .iter()
                .position(|kid| matches!(kid, Object::Reference(id) if *id == anchor_id))
                .with_context(|| format!("Page {:?} missing from its parent's /Kids", anchor_id))?,
            None => kids.len(),
        };
        kids.insert(at, Object::Reference(page_id));

        let mut node = Some(parent_id);
        while let Some(id) = node {
            let dict = self.doc.get_dictionary_mut(id)?;
            if let Ok(Object::Integer(count)) = dict.get_mut(b"Count") {
                *count += 1;
            }
            node = dict.get(b"Parent").and_then(Object::as_reference).ok();
        }

        Ok(page_id)
    }

    fn parent_of(&self, page_id: ObjectId) -> Result<ObjectId> {
        self.doc
            .get_dictionary(page_id)
            .and_then(|page| page.get(b"Parent"))
            .and_then(Object::as_reference)
            .with_context(|| format!("Page {:?} has no /Parent", page_id))
    }

    fn root_pages_id(&self) -> Result<ObjectId> {
        self.doc
            .catalog()
            .and_then(|catalog| catalog.get(b"Pages"))
            .and_then(Object::as_reference)
            .context("Document catalog has no /Pages")
    }

    /// Serialize the current state of the document into memory
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        self.doc
            .save_to(&mut bytes)
            .with_context(|| format!("Failed to serialize PDF: {}", self.path))?;
        Ok(bytes)
    }

    /// Drop unreferenced objects, compress streams and save to a file
    pub fn save<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.doc.prune_objects();
        self.doc.compress();
        self.doc
            .save(&path)
            .with_context(|| format!("Failed to save PDF: {}", path.as_ref().display()))?;
        Ok(())
    }
}
