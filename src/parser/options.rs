//! Extraction options and configuration.

use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::str::FromStr;

use super::table_detector::TableDetectorConfig;

/// Options for extracting a PDF document.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// BPE vocabulary used for token counting
    pub encoding: TokenEncoding,

    /// Whether to extract embedded images
    pub extract_images: bool,

    /// Whether to run the table detector
    pub extract_tables: bool,

    /// Pages scanned by the table detector
    pub table_pages: PageSelection,

    /// Table detector tuning
    pub table_config: TableDetectorConfig,

    /// Run the page-count probe concurrently with content extraction
    pub parallel: bool,

    /// Directory for the table detector's transient file (system temp if None)
    pub temp_dir: Option<PathBuf>,
}

impl ExtractOptions {
    /// Create new extraction options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the token encoding.
    pub fn with_encoding(mut self, encoding: TokenEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Enable or disable image extraction.
    pub fn with_images(mut self, extract: bool) -> Self {
        self.extract_images = extract;
        self
    }

    /// Enable or disable table detection.
    pub fn with_tables(mut self, extract: bool) -> Self {
        self.extract_tables = extract;
        self
    }

    /// Restrict table detection to some pages.
    pub fn with_table_pages(mut self, pages: PageSelection) -> Self {
        self.table_pages = pages;
        self
    }

    /// Set table detector configuration.
    pub fn with_table_config(mut self, config: TableDetectorConfig) -> Self {
        self.table_config = config;
        self
    }

    /// Enable or disable the concurrent page-count probe.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Probe and extract one after the other.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Put the transient table-detection file in a specific directory.
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            encoding: TokenEncoding::default(),
            extract_images: true,
            extract_tables: true,
            table_pages: PageSelection::All,
            table_config: TableDetectorConfig::default(),
            parallel: false,
            temp_dir: None,
        }
    }
}

/// BPE vocabulary used for token counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TokenEncoding {
    /// GPT-4 / GPT-3.5 vocabulary
    #[default]
    Cl100kBase,
    /// GPT-4o vocabulary
    O200kBase,
    /// Codex vocabulary
    P50kBase,
    /// GPT-3 vocabulary
    R50kBase,
}

impl TokenEncoding {
    /// Canonical vocabulary name.
    pub fn name(&self) -> &'static str {
        match self {
            TokenEncoding::Cl100kBase => "cl100k_base",
            TokenEncoding::O200kBase => "o200k_base",
            TokenEncoding::P50kBase => "p50k_base",
            TokenEncoding::R50kBase => "r50k_base",
        }
    }
}

impl std::fmt::Display for TokenEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TokenEncoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cl100k_base" | "cl100k" => Ok(TokenEncoding::Cl100kBase),
            "o200k_base" | "o200k" => Ok(TokenEncoding::O200kBase),
            "p50k_base" | "p50k" => Ok(TokenEncoding::P50kBase),
            "r50k_base" | "r50k" | "gpt2" => Ok(TokenEncoding::R50kBase),
            other => Err(format!("Unknown token encoding: {}", other)),
        }
    }
}

/// Page selection (1-indexed).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PageSelection {
    /// All pages
    #[default]
    All,
    /// A range of pages (inclusive)
    Range(RangeInclusive<u32>),
    /// Specific pages
    Pages(Vec<u32>),
}

impl PageSelection {
    /// Check if a page number should be included.
    pub fn includes(&self, page: u32) -> bool {
        match self {
            PageSelection::All => true,
            PageSelection::Range(range) => range.contains(&page),
            PageSelection::Pages(pages) => pages.contains(&page),
        }
    }

    /// Parse a page selection string (e.g., "1-10", "1,3,5,7-10").
    pub fn parse(s: &str) -> Result<Self, String> {
        let s = s.trim();

        if s.is_empty() || s == "all" {
            return Ok(PageSelection::All);
        }

        if let Some((start, end)) = s.split_once('-') {
            if !start.contains(',') && !end.contains(',') {
                let start: u32 = start.trim().parse().map_err(|_| "Invalid start page")?;
                let end: u32 = end.trim().parse().map_err(|_| "Invalid end page")?;
                return Ok(PageSelection::Range(start..=end));
            }
        }

        let mut pages = Vec::new();
        for part in s.split(',') {
            let part = part.trim();
            if let Some((start, end)) = part.split_once('-') {
                let start: u32 = start.trim().parse().map_err(|_| "Invalid page number")?;
                let end: u32 = end.trim().parse().map_err(|_| "Invalid page number")?;
                for p in start..=end {
                    if !pages.contains(&p) {
                        pages.push(p);
                    }
                }
            } else {
                let p: u32 = part.parse().map_err(|_| "Invalid page number")?;
                if !pages.contains(&p) {
                    pages.push(p);
                }
            }
        }

        pages.sort();
        Ok(PageSelection::Pages(pages))
    }
}
