//! Page-level types.

use super::EmbeddedImage;

/// One page of a document, as yielded by a
/// [`DocumentSource`](crate::parser::DocumentSource).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// Zero-based position in the page sequence
    pub index: usize,

    /// Page text in the order the content stream interpreter emits it
    pub text: String,

    /// Raster images referenced by the page, in discovery order
    pub images: Vec<EmbeddedImage>,
}

impl Page {
    /// Create a page with text and no images.
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
            images: Vec::new(),
        }
    }

    /// Attach images to the page.
    pub fn with_images(mut self, images: Vec<EmbeddedImage>) -> Self {
        self.images = images;
        self
    }

    /// One-based page number.
    pub fn number(&self) -> u32 {
        self.index as u32 + 1
    }

    /// Number of embedded images on the page.
    pub fn image_count(&self) -> usize {
        self.images.len()
    }
}
