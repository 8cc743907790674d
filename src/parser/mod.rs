//! PDF parsing module.

mod backend;
mod content;
mod images;
mod options;
mod probe;
mod spans;
mod table_detector;
mod tables;
mod tokenizer;

pub use backend::{DocumentSource, LopdfSource, Pages};
pub use content::{extract_content, fold_pages, ContentSummary, PageAccumulator};
pub use images::collect_page_images;
pub use options::{ExtractOptions, PageSelection, TokenEncoding};
pub use probe::{probe_page_count, try_page_count};
pub use spans::{SpanExtractor, TextSpan};
pub use table_detector::{DetectedTable, SpanRow, TableDetector, TableDetectorConfig};
pub use tables::{
    extract_tables, extract_tables_or_empty, extract_tables_with, extract_tables_with_or_empty,
    StreamTableReader, TableReader, TransientPdf,
};
pub use tokenizer::{BpeTokenizer, TokenCounter};

#[cfg(test)]
pub(crate) use tokenizer::WordCounter;
