use anyhow::{anyhow, Context, Result};
use tracing::{debug, warn};

use super::PdfDocument;
use crate::toc::PageText;

/// Text of every page of a document, extracted once up front.
#[derive(Debug, Clone)]
pub struct DocumentText {
    pages: Vec<String>,
}

impl DocumentText {
    /// Extract the text of `doc` as it currently is, including pages that
    /// were inserted in memory.
    pub fn extract(doc: &mut PdfDocument) -> Result<Self> {
        let bytes = doc.to_bytes()?;
        let text = Self::from_bytes(&bytes)
            .with_context(|| format!("Failed to extract text from PDF: {}", doc.path))?;

        let expected = doc.page_count() as usize;
        if text.pages.len() != expected {
            warn!(
                extracted = text.pages.len(),
                expected, "page count of extracted text differs from the document"
            );
        }

        Ok(text)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        // pdf_extract can panic on malformed PDFs
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            pdf_extract::extract_text_from_mem_by_pages(bytes)
        }));

        let pages = match result {
            Ok(Ok(pages)) => pages,
            Ok(Err(e)) => return Err(anyhow!("PDF text extraction failed: {e}")),
            Err(_) => return Err(anyhow!("PDF text extraction panicked (malformed PDF)")),
        };
        debug!(pages = pages.len(), "extracted page text");
        Ok(DocumentText { pages })
    }
}

impl From<Vec<String>> for DocumentText {
    fn from(pages: Vec<String>) -> Self {
        DocumentText { pages }
    }
}

impl PageText for DocumentText {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_lines(&self, index: usize) -> Vec<&str> {
        self.pages.as_slice().page_lines(index)
    }
}
