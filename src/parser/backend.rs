//! PDF document source abstraction.
//!
//! The pipeline only needs three things from a PDF library: open a document
//! from memory, report its page count, and walk its pages in order. The
//! [`DocumentSource`] trait captures exactly that, keeping the concrete
//! library (lopdf) out of the accumulation logic.

use std::path::Path;

use lopdf::Document as LopdfDocument;

use crate::error::{Error, Result};
use crate::intake::DocumentBuffer;
use crate::model::{EmbeddedImage, Page};

use super::images::collect_page_images;
use super::spans::SpanExtractor;

/// Ordered, lazily produced page sequence.
pub type Pages<'a> = Box<dyn Iterator<Item = Result<Page>> + 'a>;

/// Capability interface over an opened PDF document.
///
/// Every call to [`DocumentSource::open`] produces an independent handle;
/// handles never share state, so several may be open on the same buffer at
/// once.
pub trait DocumentSource: Sized {
    /// Open a document held in memory.
    fn open(buffer: &DocumentBuffer) -> Result<Self>;

    /// Total number of pages, read from the page tree.
    fn page_count(&self) -> u32;

    /// Walk the pages in increasing index order.
    ///
    /// Each page is produced on demand; `with_images` controls whether
    /// embedded images are decoded.
    fn pages(&self, with_images: bool) -> Pages<'_>;

    /// Release the handle.
    fn close(self) {}
}

/// [`DocumentSource`] backed by `lopdf::Document`.
pub struct LopdfSource {
    doc: LopdfDocument,
}

impl LopdfSource {
    /// Load from an in-memory byte slice.
    pub fn load_bytes(data: &[u8]) -> Result<Self> {
        let doc = LopdfDocument::load_mem(data)?;
        Ok(Self { doc })
    }

    /// Load from a file path.
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let doc = LopdfDocument::load(path)?;
        Ok(Self { doc })
    }

    /// Direct access to the underlying `lopdf::Document`.
    pub fn raw_doc(&self) -> &LopdfDocument {
        &self.doc
    }

    /// Check if the document is encrypted.
    pub fn is_encrypted(&self) -> bool {
        self.doc.is_encrypted()
    }

    /// Get PDF version string.
    pub fn version(&self) -> String {
        self.doc.version.to_string()
    }

    /// Extract the text of one page (1-based page number).
    ///
    /// Fonts whose encoding cannot be resolved degrade to raw-byte decoding
    /// instead of failing the page.
    pub fn page_text(&self, page_num: u32) -> Result<String> {
        SpanExtractor::new(&self.doc)
            .page_text(page_num)
            .map_err(|e| Error::PdfParse(format!("Page {}: {}", page_num, e)))
    }

    /// Extract the embedded images of one page (1-based page number).
    pub fn page_images(&self, page_num: u32) -> Result<Vec<EmbeddedImage>> {
        let pages = self.doc.get_pages();
        let page_id = pages.get(&page_num).ok_or_else(|| {
            Error::PdfParse(format!(
                "Page {} is out of range (document has {} pages)",
                page_num,
                pages.len()
            ))
        })?;
        collect_page_images(&self.doc, *page_id)
    }
}

impl DocumentSource for LopdfSource {
    fn open(buffer: &DocumentBuffer) -> Result<Self> {
        Self::load_bytes(buffer.as_bytes())
    }

    fn page_count(&self) -> u32 {
        self.doc.get_pages().len() as u32
    }

    fn pages(&self, with_images: bool) -> Pages<'_> {
        let page_ids = self.doc.get_pages();

        Box::new(
            page_ids
                .into_iter()
                .enumerate()
                .map(move |(index, (page_num, page_id))| {
                    let text = self.page_text(page_num)?;
                    let images = if with_images {
                        collect_page_images(&self.doc, page_id)?
                    } else {
                        Vec::new()
                    };
                    Ok(Page::new(index, text).with_images(images))
                }),
        )
    }

    fn close(self) {
        log::debug!("Closing document (PDF {})", self.doc.version);
    }
}
