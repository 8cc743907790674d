//! Binary intake: materializes an uploaded PDF fully into memory.
//!
//! Every downstream step (page-count probe, content extraction, table
//! detection) opens the same [`DocumentBuffer`] independently, so the upload
//! is read exactly once and never has to be written to disk up front.

use std::io::Read;
use std::path::Path;

use crate::detect::{detect_format_from_bytes, has_pdf_extension, PdfFormat};
use crate::error::{Error, Result};

/// Message returned when the multipart request has no `file` part.
pub const MSG_NO_FILE_PART: &str = "No file part in the request";
/// Message returned when the `file` part has an empty filename.
pub const MSG_NO_FILE_SELECTED: &str = "No file selected";
/// Message returned when the filename does not end in `.pdf`.
pub const MSG_INVALID_TYPE: &str = "Invalid file type, only PDF is allowed";
/// Message returned when the upload has no content.
pub const MSG_EMPTY_FILE: &str = "Uploaded file is empty";

/// Immutable, exclusively-owned bytes of one uploaded PDF.
///
/// The buffer lives for one request and is freed when dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentBuffer {
    bytes: Vec<u8>,
}

impl DocumentBuffer {
    /// Take ownership of already-read bytes.
    pub fn from_vec(bytes: Vec<u8>) -> Result<Self> {
        if bytes.is_empty() {
            return Err(Error::InvalidInput(MSG_EMPTY_FILE.to_string()));
        }
        Ok(Self { bytes })
    }

    /// Read a whole stream into memory.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .map_err(|e| Error::InvalidInput(format!("Failed to read upload: {}", e)))?;
        Self::from_vec(bytes)
    }

    /// Read a file from disk into memory.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        Self::from_vec(bytes)
    }

    /// Borrow the raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Size of the document in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Always false; an empty buffer cannot be constructed.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Header information, if the bytes start with a PDF header.
    pub fn format(&self) -> Result<PdfFormat> {
        detect_format_from_bytes(&self.bytes)
    }
}

impl AsRef<[u8]> for DocumentBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

/// Validate the filename of an upload before reading its body.
///
/// `None` means the request carried no `file` part at all.
pub fn validate_upload_name(filename: Option<&str>) -> Result<()> {
    match filename {
        None => Err(Error::InvalidInput(MSG_NO_FILE_PART.to_string())),
        Some("") => Err(Error::InvalidInput(MSG_NO_FILE_SELECTED.to_string())),
        Some(name) if !has_pdf_extension(name) => {
            Err(Error::InvalidInput(MSG_INVALID_TYPE.to_string()))
        }
        Some(_) => Ok(()),
    }
}
