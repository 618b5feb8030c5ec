use regex::Regex;
use std::sync::LazyLock;

// Example heading line: "1.2.3 Title ...... 23"
static NUMBERED_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*((?:\d+\.)+\d*)\s*(.*)$").expect("valid heading pattern")
});

// Dot leaders between a TOC title and its printed page number
static DOT_LEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s*(?:(?:\.\s?){2,}|[…·]+)[\s.…·]*(?:\d+|[ivxlcdmIVXLCDM]+)?\s*$")
        .expect("valid leader pattern")
});

/// Trailing character some PDF producers leave behind after a title.
const ENCODING_ARTIFACT: char = '一';

/// A line recognized as a numbered heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Heading<'a> {
    /// Numbering prefix, e.g. `1.2.` or `1.2`
    pub numbering: &'a str,
    /// Everything after the numbering, not yet cleaned
    pub text: &'a str,
}

impl Heading<'_> {
    pub fn level(&self) -> u32 {
        numbering_level(self.numbering)
    }
}

/// Recognizes heading lines in linearized page text.
///
/// The resolver uses the same matcher for the TOC pages and for the body
/// pages, so a stricter implementation changes both sides consistently.
pub trait HeadingMatcher {
    fn match_line<'a>(&self, line: &'a str) -> Option<Heading<'a>>;
}

/// Matches lines that start with a dotted numbering prefix such as `3.`,
/// `1.2` or `1.2.3.`.
#[derive(Debug, Default, Clone, Copy)]
pub struct NumberedHeadings;

impl HeadingMatcher for NumberedHeadings {
    fn match_line<'a>(&self, line: &'a str) -> Option<Heading<'a>> {
        let caps = NUMBERED_HEADING.captures(line)?;
        let numbering = caps.get(1)?.as_str();
        let text = caps.get(2)?.as_str();

        if text.trim().is_empty() {
            return None;
        }

        Some(Heading { numbering, text })
    }
}

/// Depth of a numbering prefix: one numeric segment is level 0.
pub fn numbering_level(numbering: &str) -> u32 {
    let segments = numbering
        .split('.')
        .filter(|segment| !segment.is_empty())
        .count() as u32;
    segments.saturating_sub(1)
}

/// Normalize a raw heading title into the key used for matching.
///
/// Trims whitespace, then drops dot-leader runs with their page numbers and
/// trailing encoding artifacts until neither is left at the end. Two
/// artifacts in a row lose only the last one.
pub fn clean_title(raw: &str) -> String {
    let mut title = raw.trim();
    let mut after_artifact = false;

    loop {
        if let Some(leader) = DOT_LEADER.find(title) {
            title = title[..leader.start()].trim_end();
            after_artifact = false;
            continue;
        }

        match title.strip_suffix(ENCODING_ARTIFACT) {
            Some(stripped) if !after_artifact => {
                title = stripped.trim_end();
                after_artifact = true;
            }
            _ => break,
        }
    }

    title.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matched(line: &str) -> Option<(String, u32, String)> {
        NumberedHeadings
            .match_line(line)
            .map(|h| (h.numbering.to_string(), h.level(), clean_title(h.text)))
    }

    #[test]
    fn test_level_derivation() {
        assert_eq!(numbering_level("3."), 0);
        assert_eq!(numbering_level("1.2."), 1);
        assert_eq!(numbering_level("1.2.3."), 2);
        assert_eq!(numbering_level("1.2"), 1);
        assert_eq!(numbering_level("1.2.3"), 2);
    }

    #[test]
    fn test_matches_toc_lines() {
        assert_eq!(
            matched("1. Introduction .......... 5"),
            Some(("1.".to_string(), 0, "Introduction".to_string()))
        );
        assert_eq!(
            matched("1.1 Background .......... 6"),
            Some(("1.1".to_string(), 1, "Background".to_string()))
        );
        assert_eq!(
            matched("   2.3.1. Error handling"),
            Some(("2.3.1.".to_string(), 2, "Error handling".to_string()))
        );
    }

    #[test]
    fn test_matches_without_space_after_prefix() {
        assert_eq!(
            matched("4.Results"),
            Some(("4.".to_string(), 0, "Results".to_string()))
        );
    }

    #[test]
    fn test_ignores_plain_lines() {
        assert_eq!(matched("Introduction"), None);
        assert_eq!(matched("Chapter 1. Introduction"), None);
        assert_eq!(matched("12 Monkeys"), None);
        assert_eq!(matched(""), None);
    }

    #[test]
    fn test_ignores_bare_numbering() {
        assert_eq!(matched("3."), None);
        assert_eq!(matched("  1.2.   "), None);
    }

    #[test]
    fn test_clean_trims_and_strips_leaders() {
        assert_eq!(clean_title("  Introduction  "), "Introduction");
        assert_eq!(clean_title("Introduction .......... 5"), "Introduction");
        assert_eq!(clean_title("Introduction……12"), "Introduction");
        assert_eq!(clean_title("Preface ....... iv"), "Preface");
        assert_eq!(clean_title("Design . . . . . 17"), "Design");
    }

    #[test]
    fn test_clean_keeps_numbers_without_leader() {
        assert_eq!(clean_title("Release 2"), "Release 2");
        assert_eq!(clean_title("Version 1.2"), "Version 1.2");
    }

    #[test]
    fn test_clean_strips_one_artifact() {
        assert_eq!(clean_title("系统设计一"), "系统设计");
        assert_eq!(clean_title("Overview 一 "), "Overview");
    }

    #[test]
    fn test_clean_strips_artifact_after_page_number() {
        assert_eq!(clean_title("Title ...... 5一"), "Title");
        assert_eq!(clean_title("设计一 ...... 5一"), "设计");
    }

    #[test]
    fn test_clean_strips_repeated_leaders() {
        assert_eq!(clean_title("Setup .. 5 .. 6"), "Setup");
    }

    #[test]
    fn test_clean_strips_only_one_artifact() {
        // A doubled artifact needs two passes
        assert_eq!(clean_title("目录一一"), "目录一");
        assert_eq!(clean_title("目录一"), "目录");
    }

    #[test]
    fn test_clean_is_idempotent() {
        for raw in [
            "Introduction .......... 5",
            "  Background",
            "系统设计一",
            "Release 2",
            "Title ...... 5一",
            "Setup .. 5 .. 6",
            "Already clean",
            "",
        ] {
            let once = clean_title(raw);
            assert_eq!(clean_title(&once), once, "input: {:?}", raw);
        }
    }

    #[test]
    fn test_clean_title_is_unchanged_when_clean() {
        assert_eq!(clean_title("Background"), "Background");
    }
}
