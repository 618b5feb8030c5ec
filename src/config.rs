use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::page_range::TocPages;
use crate::toc::correction::DEFAULT_CORRECTIONS_PATH;
use crate::toc::DuplicatePolicy;

/// Configuration file read when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "generate_pdf_outline.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Missing required config key `{0}`")]
    Missing(&'static str),

    #[error("Invalid value for config key `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Text of the preface: one page, or one string per page.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Preface {
    Single(String),
    Pages(Vec<String>),
}

impl Preface {
    /// No text at all, which disables the preface
    pub fn is_empty(&self) -> bool {
        self.pages().iter().all(|page| page.trim().is_empty())
    }

    pub fn pages(&self) -> Vec<&str> {
        match self {
            Preface::Single(text) => vec![text.as_str()],
            Preface::Pages(pages) => pages.iter().map(String::as_str).collect(),
        }
    }
}

/// Cover page settings. The cover is only generated when `size` is set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoverOptions {
    /// Page size identifier such as `A4`; also used for preface pages
    pub size: Option<String>,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub author: Option<String>,
    pub date: Option<String>,
    pub font_path: Option<PathBuf>,
    pub image_path: Option<PathBuf>,
    pub logo_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub input: PathBuf,
    pub output: PathBuf,
    pub toc_pages: TocPages,
    /// Pages inserted in front of the printed page numbering
    pub offset: i64,
    pub corrections: PathBuf,
    pub duplicates: DuplicatePolicy,
    pub cover: CoverOptions,
    pub preface: Option<Preface>,
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    toc_pages: Option<String>,
    offset: Option<i64>,
    corrections: Option<PathBuf>,
    duplicates: Option<DuplicatePolicy>,
    cover: Option<String>,
    title: Option<String>,
    subtitle: Option<String>,
    author: Option<String>,
    date: Option<String>,
    font_path: Option<PathBuf>,
    image_path: Option<PathBuf>,
    logo_path: Option<PathBuf>,
    preface: Option<Preface>,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let raw: RawConfig = serde_json::from_str(&json).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        Config::from_raw(raw)
    }

    fn from_raw(raw: RawConfig) -> Result<Self, ConfigError> {
        let input = raw.input.ok_or(ConfigError::Missing("input"))?;
        let output = raw.output.ok_or(ConfigError::Missing("output"))?;
        let toc_pages = raw.toc_pages.ok_or(ConfigError::Missing("toc_pages"))?;
        let offset = raw.offset.ok_or(ConfigError::Missing("offset"))?;

        let toc_pages = TocPages::parse(&toc_pages).map_err(|e| ConfigError::Invalid {
            key: "toc_pages",
            reason: e.to_string(),
        })?;

        Ok(Config {
            input,
            output,
            toc_pages,
            offset,
            corrections: raw
                .corrections
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CORRECTIONS_PATH)),
            duplicates: raw.duplicates.unwrap_or_default(),
            cover: CoverOptions {
                size: raw.cover.filter(|size| !size.trim().is_empty()),
                title: raw.title,
                subtitle: raw.subtitle,
                author: raw.author,
                date: raw.date,
                font_path: raw.font_path,
                image_path: raw.image_path,
                logo_path: raw.logo_path,
            },
            preface: raw.preface.filter(|preface| !preface.is_empty()),
        })
    }

    /// Number of pages the cover and preface put in front of the document.
    pub fn inserted_pages(&self) -> i64 {
        let cover = i64::from(self.cover.size.is_some());
        let preface = self
            .preface
            .as_ref()
            .map(|p| p.pages().len() as i64)
            .unwrap_or(0);
        cover + preface
    }
}
