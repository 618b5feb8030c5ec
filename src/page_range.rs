use anyhow::{anyhow, Result};

/// Printed page span of the table of contents, 1-based and inclusive, as
/// the `toc_pages` setting gives it ("3-4" or "3").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TocPages {
    pub first: u32,
    pub last: u32,
}

impl TocPages {
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(anyhow!("Empty page range"));
        }

        let (first, last) = match s.split_once('-') {
            Some(("", _)) => return Err(anyhow!("Invalid page range: {}", s)),
            Some((first, last)) => (parse_page_number(first)?, parse_page_number(last)?),
            None => {
                let page = parse_page_number(s)?;
                (page, page)
            }
        };

        if first == 0 || last == 0 {
            return Err(anyhow!("Page numbers must be >= 1"));
        }

        if first > last {
            return Err(anyhow!(
                "TOC start page {} comes after end page {}",
                first,
                last
            ));
        }

        Ok(TocPages { first, last })
    }

    /// Shift by `offset` inserted pages and convert to 0-based page indices,
    /// checked against the document's page count.
    pub fn to_indices(&self, offset: i64, total_pages: usize) -> Result<(usize, usize)> {
        let start = self.first as i64 - 1 + offset;
        let end = self.last as i64 - 1 + offset;

        if start < 0 {
            return Err(anyhow!(
                "Offset {} moves TOC page {} before the first page",
                offset,
                self.first
            ));
        }

        if end as usize >= total_pages {
            return Err(anyhow!(
                "TOC end page {} (after offset {}) exceeds total pages {}",
                end + 1,
                offset,
                total_pages
            ));
        }

        Ok((start as usize, end as usize))
    }
}

fn parse_page_number(s: &str) -> Result<u32> {
    let s = s.trim();
    s.parse::<u32>()
        .map_err(|_| anyhow!("Invalid page number: {}", s))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_page() {
        let pages = TocPages::parse("5").unwrap();
        assert_eq!(pages, TocPages { first: 5, last: 5 });
        assert_eq!(pages.to_indices(0, 10).unwrap(), (4, 4));
    }

    #[test]
    fn test_page_range() {
        let pages = TocPages::parse(" 2 - 3 ").unwrap();
        assert_eq!(pages, TocPages { first: 2, last: 3 });
        assert_eq!(pages.to_indices(0, 10).unwrap(), (1, 2));
    }

    #[test]
    fn test_offset_shifts_indices() {
        let pages = TocPages::parse("2-3").unwrap();
        assert_eq!(pages.to_indices(3, 10).unwrap(), (4, 5));
        assert_eq!(pages.to_indices(-1, 10).unwrap(), (0, 1));
    }

    #[test]
    fn test_offset_before_first_page() {
        let pages = TocPages::parse("1-2").unwrap();
        assert!(pages.to_indices(-1, 10).is_err());
    }

    #[test]
    fn test_page_exceeds_total() {
        let pages = TocPages::parse("9-10").unwrap();
        assert!(pages.to_indices(0, 10).is_ok());
        assert!(pages.to_indices(1, 10).is_err());
    }

    #[test]
    fn test_invalid_ranges() {
        assert!(TocPages::parse("").is_err());
        assert!(TocPages::parse("0").is_err());
        assert!(TocPages::parse("-5").is_err());
        assert!(TocPages::parse("5-3").is_err());
        assert!(TocPages::parse("a-b").is_err());
        assert!(TocPages::parse("1-end").is_err());
    }
}
