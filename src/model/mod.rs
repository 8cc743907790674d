//! Data model shared by the extraction pipeline.
//!
//! [`Page`] and [`EmbeddedImage`] are what a document source yields while
//! it walks a PDF; [`ExtractionResult`] and [`TableRecord`] are what the
//! pipeline hands back.

mod image;
mod page;
mod result;

pub use image::{parse_data_uri, EmbeddedImage, ImageFormat};
pub use page::Page;
pub use result::{ExtractionResult, TableRecord};
