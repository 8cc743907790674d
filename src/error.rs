//! Error types for the pdfsift library.

use std::io;
use thiserror::Error;

/// Result type alias for pdfsift operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during PDF extraction.
///
/// Only [`Error::InvalidInput`] and [`Error::Extraction`] are meant to reach a
/// caller. Table detection and page-count probing failures are recovered
/// inside the pipeline and degrade to empty/zero values.
#[derive(Error, Debug)]
pub enum Error {
    /// The upload was missing, empty, or not a PDF by name.
    #[error("{0}")]
    InvalidInput(String),

    /// The document could not be opened or a page could not be processed.
    #[error("Extraction failed: {0}")]
    Extraction(String),

    /// The stream-mode table detector failed. Recovered internally.
    #[error("Table detection failed: {0}")]
    TableDetection(String),

    /// The page-count probe failed. Recovered internally.
    #[error("Page count probe failed: {0}")]
    PageCountProbe(String),

    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file format is not recognized as PDF.
    #[error("Unknown file format: not a valid PDF")]
    UnknownFormat,

    /// The PDF version is not supported.
    #[error("Unsupported PDF version: {0}")]
    UnsupportedVersion(String),

    /// Error parsing PDF structure.
    #[error("PDF parsing error: {0}")]
    PdfParse(String),

    /// The PDF document is encrypted.
    #[error("Document is encrypted")]
    Encrypted,

    /// Error extracting an embedded image.
    #[error("Image extraction error: {0}")]
    ImageExtract(String),

    /// The BPE vocabulary could not be loaded.
    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    /// Error during JSON rendering.
    #[error("Rendering error: {0}")]
    Render(String),
}

impl Error {
    /// Whether the error should be reported as a client mistake (HTTP 400)
    /// rather than a processing failure (HTTP 500).
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::InvalidInput(_))
    }

    /// Wrap any error that happened while opening or walking the document
    /// into the fatal extraction variant, keeping the cause message.
    pub(crate) fn into_extraction(self) -> Self {
        match self {
            Error::Extraction(_) | Error::InvalidInput(_) => self,
            other => Error::Extraction(other.to_string()),
        }
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            lopdf::Error::Decryption(_) => Error::Encrypted,
            _ => Error::PdfParse(err.to_string()),
        }
    }
}
