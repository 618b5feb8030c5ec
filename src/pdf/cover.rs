use anyhow::Result;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Object, ObjectId, Stream, StringFormat};
use std::fmt;
use tracing::warn;

use super::PdfDocument;
use crate::config::CoverOptions;

const FONT_RESOURCE: &str = "F1";

/// Rough Helvetica advance width, in ems, used for centering and wrapping.
const AVERAGE_GLYPH_WIDTH: f32 = 0.5;

const DEFAULT_TITLE: &str = "Technical Document";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageSize {
    A3,
    #[default]
    A4,
    A5,
}

impl PageSize {
    /// Parse a size identifier such as `a4`; unknown ids fall back to A4.
    pub fn from_id(id: &str) -> Self {
        match id.trim().to_ascii_uppercase().as_str() {
            "A3" => PageSize::A3,
            "A4" => PageSize::A4,
            "A5" => PageSize::A5,
            _ => {
                warn!(size = id, "unknown page size, using A4");
                PageSize::A4
            }
        }
    }

    /// Portrait width and height in points
    pub fn dimensions(self) -> (f32, f32) {
        match self {
            PageSize::A3 => (842.0, 1191.0),
            PageSize::A4 => (595.0, 842.0),
            PageSize::A5 => (420.0, 595.0),
        }
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PageSize::A3 => "A3",
            PageSize::A4 => "A4",
            PageSize::A5 => "A5",
        };
        f.write_str(name)
    }
}

/// Text drawing on a single page, positioned from the top edge like a
/// layout box.
struct TextPage {
    width: f32,
    height: f32,
    operations: Vec<Operation>,
}

impl TextPage {
    fn new(size: PageSize) -> Self {
        let (width, height) = size.dimensions();
        TextPage {
            width,
            height,
            operations: Vec::new(),
        }
    }

    fn text(&mut self, text: &str, x: f32, top: f32, font_size: f32, gray: f32) {
        let baseline = self.height - top - font_size;
        self.operations.extend([
            Operation::new("BT", vec![]),
            Operation::new("g", vec![gray.into()]),
            Operation::new("Tf", vec![Object::Name(FONT_RESOURCE.into()), font_size.into()]),
            Operation::new("Td", vec![x.into(), baseline.into()]),
            Operation::new("Tj", vec![Object::String(win_ansi(text), StringFormat::Literal)]),
            Operation::new("ET", vec![]),
        ]);
    }

    fn centered(&mut self, text: &str, top: f32, font_size: f32, gray: f32) {
        let estimated = text.chars().count() as f32 * font_size * AVERAGE_GLYPH_WIDTH;
        let x = ((self.width - estimated) / 2.0).max(0.0);
        self.text(text, x, top, font_size, gray);
    }

    fn into_page(self, doc: &mut PdfDocument, font_id: ObjectId) -> Result<Dictionary> {
        let content = Content {
            operations: self.operations,
        }
        .encode()?;
        let content_id = doc.doc.add_object(Stream::new(dictionary! {}, content));

        let media_box: Vec<Object> = vec![0.into(), 0.into(), self.width.into(), self.height.into()];
        Ok(dictionary! {
            "MediaBox" => media_box,
            "Contents" => content_id,
            "Resources" => dictionary! {
                "Font" => dictionary! { FONT_RESOURCE => font_id },
            },
        })
    }
}

fn standard_font(doc: &mut PdfDocument) -> ObjectId {
    doc.doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    })
}

/// Latin-1 subset of WinAnsiEncoding; anything else becomes `?`.
fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}

fn warn_unsupported(options: &CoverOptions) {
    let ignored = [
        ("font_path", &options.font_path),
        ("image_path", &options.image_path),
        ("logo_path", &options.logo_path),
    ];
    for (key, value) in ignored {
        if let Some(path) = value {
            warn!(key, path = %path.display(), "option not supported, pages use the built-in Helvetica font without images");
        }
    }
}

/// Insert a cover page in front of the first page.
pub fn insert_cover_page(doc: &mut PdfDocument, options: &CoverOptions) -> Result<PageSize> {
    warn_unsupported(options);

    let size = options
        .size
        .as_deref()
        .map(PageSize::from_id)
        .unwrap_or_default();

    let mut page = TextPage::new(size);
    page.centered(options.title.as_deref().unwrap_or(DEFAULT_TITLE), 200.0, 28.0, 0.0);
    if let Some(subtitle) = &options.subtitle {
        page.centered(subtitle, 260.0, 18.0, 0.2);
    }
    if let Some(author) = &options.author {
        page.centered(author, 320.0, 14.0, 0.4);
    }
    if let Some(date) = &options.date {
        page.centered(date, 354.0, 14.0, 0.4);
    }

    let font_id = standard_font(doc);
    let dict = page.into_page(doc, font_id)?;
    doc.insert_page(0, dict)?;
    Ok(size)
}

/// Insert one preface page per entry of `pages`, starting at 0-based
/// `position`. Returns the number of pages inserted.
pub fn insert_preface_pages(
    doc: &mut PdfDocument,
    pages: &[&str],
    size: PageSize,
    position: usize,
) -> Result<usize> {
    const MARGIN_X: f32 = 60.0;
    const BODY_TOP: f32 = 140.0;
    const BOTTOM_MARGIN: f32 = 80.0;
    const BODY_FONT: f32 = 12.0;
    const LINE_HEIGHT: f32 = BODY_FONT * 1.4;

    let font_id = standard_font(doc);
    let (width, height) = size.dimensions();
    let max_chars = ((width - 2.0 * MARGIN_X) / (BODY_FONT * AVERAGE_GLYPH_WIDTH)) as usize;
    let max_lines = ((height - BODY_TOP - BOTTOM_MARGIN) / LINE_HEIGHT) as usize;

    for (i, text) in pages.iter().enumerate() {
        let mut page = TextPage::new(size);
        page.centered("Preface", 80.0, 24.0, 0.0);

        let lines = wrap_text(text, max_chars);
        if lines.len() > max_lines {
            warn!(
                page = i + 1,
                lines = lines.len(),
                max_lines,
                "preface text does not fit on one page, truncating"
            );
        }
        for (n, line) in lines.iter().take(max_lines).enumerate() {
            page.text(line, MARGIN_X, BODY_TOP + n as f32 * LINE_HEIGHT, BODY_FONT, 0.1);
        }

        let dict = page.into_page(doc, font_id)?;
        doc.insert_page(position + i, dict)?;
    }

    Ok(pages.len())
}

/// Greedy word wrap to at most `max_chars` characters per line. Words longer
/// than a line, such as unspaced CJK runs, are split.
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines: Vec<String> = Vec::new();

    for paragraph in text.lines() {
        let mut line: Vec<char> = Vec::new();

        for word in paragraph.split_whitespace() {
            let word: Vec<char> = word.chars().collect();
            if !line.is_empty() && line.len() + 1 + word.len() > max_chars {
                lines.push(line.drain(..).collect());
            }
            if !line.is_empty() {
                line.push(' ');
            }
            line.extend(word);

            while line.len() > max_chars {
                let rest = line.split_off(max_chars);
                lines.push(line.iter().collect());
                line = rest;
            }
        }

        lines.push(line.into_iter().collect());
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::testing::blank_document;

    fn media_box(doc: &PdfDocument, page: u32) -> Vec<f32> {
        let (_, id) = doc.page_ids()[page as usize - 1];
        doc.doc
            .get_dictionary(id)
            .unwrap()
            .get(b"MediaBox")
            .unwrap()
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_float().unwrap())
            .collect()
    }

    #[test]
    fn test_page_sizes() {
        assert_eq!(PageSize::from_id("a3"), PageSize::A3);
        assert_eq!(PageSize::from_id(" A5 "), PageSize::A5);
        assert_eq!(PageSize::from_id("Letter"), PageSize::A4);
        assert_eq!(PageSize::A3.dimensions(), (842.0, 1191.0));
    }

    #[test]
    fn test_cover_goes_first() {
        let mut doc = PdfDocument::from_document(blank_document(2));
        let options = CoverOptions {
            size: Some("A5".to_string()),
            title: Some("Manual".to_string()),
            author: Some("Docs team".to_string()),
            ..Default::default()
        };

        let size = insert_cover_page(&mut doc, &options).unwrap();

        assert_eq!(size, PageSize::A5);
        assert_eq!(doc.page_count(), 3);
        assert_eq!(media_box(&doc, 1), vec![0.0, 0.0, 420.0, 595.0]);
        assert_eq!(media_box(&doc, 2), vec![0.0, 0.0, 595.0, 842.0]);
    }

    #[test]
    fn test_preface_follows_cover() {
        let mut doc = PdfDocument::from_document(blank_document(2));
        insert_cover_page(&mut doc, &CoverOptions {
            size: Some("A3".to_string()),
            ..Default::default()
        })
        .unwrap();

        let inserted =
            insert_preface_pages(&mut doc, &["One", "Two"], PageSize::A3, 1).unwrap();

        assert_eq!(inserted, 2);
        assert_eq!(doc.page_count(), 5);
        for page in 1..=3 {
            assert_eq!(media_box(&doc, page), vec![0.0, 0.0, 842.0, 1191.0]);
        }
        assert_eq!(media_box(&doc, 4), vec![0.0, 0.0, 595.0, 842.0]);
    }

    #[test]
    fn test_win_ansi_replaces_unsupported() {
        assert_eq!(win_ansi("Café"), b"Caf\xe9".to_vec());
        assert_eq!(win_ansi("目录"), b"??".to_vec());
    }

    #[test]
    fn test_wrap_text() {
        assert_eq!(
            wrap_text("the quick brown fox jumps", 10),
            vec!["the quick", "brown fox", "jumps"]
        );
        assert_eq!(wrap_text("one\n\ntwo", 10), vec!["one", "", "two"]);
        assert_eq!(wrap_text("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
    }
}
