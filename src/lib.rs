//! # pdfsift
//!
//! Single-pass PDF extraction for Rust.
//!
//! One call turns an uploaded PDF into its full text, a BPE token count,
//! the page count, the tables found by a stream-mode detector, and every
//! embedded image as a `data:image/<ext>;base64,...` URI.
//!
//! ## Quick Start
//!
//! ```no_run
//! use pdfsift::{extract_file, render};
//!
//! fn main() -> pdfsift::Result<()> {
//!     let result = extract_file("report.pdf")?;
//!     println!("{} pages, {} tokens", result.page_count, result.token_count);
//!
//!     let json = render::to_json(&result, render::JsonFormat::Pretty)?;
//!     println!("{}", json);
//!     Ok(())
//! }
//! ```
//!
//! ## Pipeline
//!
//! - **Intake**: the upload is read fully into a [`DocumentBuffer`].
//! - **Page-count probe**: an independent handle reads the page tree; a
//!   failure is logged and reported as 0 pages.
//! - **Content pass**: pages are walked once, in order; text is appended,
//!   tokenized per page, and images are encoded as data URIs. Any page
//!   failure aborts the request with [`Error::Extraction`].
//! - **Tables**: the buffer is copied to a transient file for the detector.
//!   Failures are logged and produce an empty list.

pub mod detect;
pub mod error;
pub mod intake;
pub mod model;
pub mod parser;
pub mod render;

pub use detect::{detect_format_from_bytes, has_pdf_extension, PdfFormat};
pub use error::{Error, Result};
pub use intake::{
    validate_upload_name, DocumentBuffer, MSG_EMPTY_FILE, MSG_INVALID_TYPE, MSG_NO_FILE_PART,
    MSG_NO_FILE_SELECTED,
};
pub use model::{EmbeddedImage, ExtractionResult, ImageFormat, Page, TableRecord};
pub use parser::{
    BpeTokenizer, DocumentSource, ExtractOptions, LopdfSource, PageSelection, TableDetectorConfig,
    TokenCounter, TokenEncoding,
};
pub use render::JsonFormat;

use std::io::Read;
use std::path::Path;

use parser::{extract_content, extract_tables_or_empty, probe_page_count};

/// Extract everything from a PDF held in memory, with default options.
///
/// # Example
///
/// ```no_run
/// let data = std::fs::read("report.pdf").unwrap();
/// let result = pdfsift::extract_bytes(&data).unwrap();
/// println!("{}", result.text);
/// ```
pub fn extract_bytes(data: &[u8]) -> Result<ExtractionResult> {
    Extractor::new().extract_bytes(data.to_vec())
}

/// Extract everything from a reader, with default options.
///
/// # Example
///
/// ```no_run
/// use std::fs::File;
///
/// let file = File::open("report.pdf").unwrap();
/// let result = pdfsift::extract_reader(file).unwrap();
/// println!("{} images", result.images.len());
/// ```
pub fn extract_reader<R: Read>(reader: R) -> Result<ExtractionResult> {
    Extractor::new().extract_reader(reader)
}

/// Extract everything from a PDF file, with default options.
pub fn extract_file<P: AsRef<Path>>(path: P) -> Result<ExtractionResult> {
    Extractor::new().extract_file(path)
}

/// Page count of a PDF, or 0 if it cannot be opened.
pub fn page_count(data: &[u8]) -> u32 {
    match DocumentBuffer::from_vec(data.to_vec()) {
        Ok(buffer) => probe_page_count::<LopdfSource>(&buffer),
        Err(e) => {
            log::warn!("{}", e);
            0
        }
    }
}

/// Builder-style entry point.
///
/// # Example
///
/// ```no_run
/// use pdfsift::{Extractor, TokenEncoding};
///
/// let result = Extractor::new()
///     .with_encoding(TokenEncoding::O200kBase)
///     .with_images(false)
///     .with_parallel(true)
///     .extract_file("report.pdf")
///     .unwrap();
/// println!("{}", result.token_count);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Extractor {
    options: ExtractOptions,
}

impl Extractor {
    /// Create an extractor with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an extractor from prepared options.
    pub fn with_options(options: ExtractOptions) -> Self {
        Self { options }
    }

    /// Set the token encoding.
    pub fn with_encoding(mut self, encoding: TokenEncoding) -> Self {
        self.options = self.options.with_encoding(encoding);
        self
    }

    /// Enable or disable image extraction.
    pub fn with_images(mut self, extract: bool) -> Self {
        self.options = self.options.with_images(extract);
        self
    }

    /// Enable or disable table detection.
    pub fn with_tables(mut self, extract: bool) -> Self {
        self.options = self.options.with_tables(extract);
        self
    }

    /// Restrict table detection to some pages.
    pub fn with_table_pages(mut self, pages: PageSelection) -> Self {
        self.options = self.options.with_table_pages(pages);
        self
    }

    /// Set table detector configuration.
    pub fn with_table_config(mut self, config: TableDetectorConfig) -> Self {
        self.options = self.options.with_table_config(config);
        self
    }

    /// Run the page-count probe concurrently with the content pass.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.options = self.options.with_parallel(parallel);
        self
    }

    /// Probe, then extract.
    pub fn sequential(mut self) -> Self {
        self.options = self.options.sequential();
        self
    }

    /// Directory for the transient table-detection file.
    pub fn with_temp_dir(mut self, dir: impl Into<std::path::PathBuf>) -> Self {
        self.options = self.options.with_temp_dir(dir);
        self
    }

    /// Current options.
    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Extract from owned bytes.
    pub fn extract_bytes(&self, data: Vec<u8>) -> Result<ExtractionResult> {
        let buffer = DocumentBuffer::from_vec(data)?;
        self.extract(&buffer)
    }

    /// Read a stream fully, then extract.
    pub fn extract_reader<R: Read>(&self, reader: R) -> Result<ExtractionResult> {
        let buffer = DocumentBuffer::from_reader(reader)?;
        self.extract(&buffer)
    }

    /// Read a file fully, then extract.
    pub fn extract_file<P: AsRef<Path>>(&self, path: P) -> Result<ExtractionResult> {
        let buffer = DocumentBuffer::from_file(path)?;
        self.extract(&buffer)
    }

    /// Run the pipeline on a buffer with the configured BPE vocabulary.
    pub fn extract(&self, buffer: &DocumentBuffer) -> Result<ExtractionResult> {
        let tokenizer = BpeTokenizer::new(self.options.encoding).map_err(Error::into_extraction)?;
        self.extract_with::<LopdfSource, _>(buffer, &tokenizer)
    }

    /// Run the pipeline with an explicit document source and token counter.
    pub fn extract_with<S, T>(&self, buffer: &DocumentBuffer, tokenizer: &T) -> Result<ExtractionResult>
    where
        S: DocumentSource,
        T: TokenCounter + Sync,
    {
        let with_images = self.options.extract_images;

        let (page_count, content) = if self.options.parallel {
            rayon::join(
                || probe_page_count::<S>(buffer),
                || extract_content::<S, T>(buffer, tokenizer, with_images),
            )
        } else {
            let page_count = probe_page_count::<S>(buffer);
            (page_count, extract_content::<S, T>(buffer, tokenizer, with_images))
        };
        let content = content?;

        if page_count != content.pages_seen {
            log::warn!(
                "Page-count probe reported {} pages, content pass saw {}",
                page_count,
                content.pages_seen
            );
        }

        let tables = extract_tables_or_empty(buffer, &self.options);

        log::info!(
            "Extracted {} pages, {} tokens, {} tables, {} images",
            page_count,
            content.token_count,
            tables.len(),
            content.images.len()
        );

        Ok(ExtractionResult::new(
            content.text,
            content.token_count,
            page_count,
            tables,
            content.images,
        ))
    }
}
