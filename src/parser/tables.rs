//! Table extraction over a transient copy of the document.
//!
//! The detector reads its input from a filesystem path, so the buffer is
//! written to a named temporary file for the duration of one detection run.
//! Everything here is best effort: [`extract_tables_or_empty`] turns any
//! failure, including a panic inside the detector, into an empty list.

use std::any::Any;
use std::io::Write;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use tempfile::{Builder, NamedTempFile};

use crate::error::{Error, Result};
use crate::intake::DocumentBuffer;
use crate::model::TableRecord;

use super::backend::LopdfSource;
use super::options::{ExtractOptions, PageSelection};
use super::spans::SpanExtractor;
use super::table_detector::{TableDetector, TableDetectorConfig};

const TRANSIENT_PREFIX: &str = "pdfsift-";
const TRANSIENT_SUFFIX: &str = ".pdf";

/// A temporary on-disk copy of a [`DocumentBuffer`].
///
/// The file is removed by [`TransientPdf::release`], or when the guard is
/// dropped if `release` was never reached.
#[derive(Debug)]
pub struct TransientPdf {
    file: NamedTempFile,
}

impl TransientPdf {
    /// Write `buffer` to a new `pdfsift-*.pdf` file in `dir` (system temp
    /// directory if `None`).
    pub fn create(buffer: &DocumentBuffer, dir: Option<&Path>) -> Result<Self> {
        let mut builder = Builder::new();
        builder.prefix(TRANSIENT_PREFIX).suffix(TRANSIENT_SUFFIX);

        let mut file = match dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        file.write_all(buffer.as_bytes())?;
        file.flush()?;
        file.as_file().sync_all()?;

        log::debug!(
            "Wrote {} bytes to {}",
            buffer.len(),
            file.path().display()
        );
        Ok(Self { file })
    }

    /// Location of the file.
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Delete the file now, reporting any error.
    pub fn release(self) -> Result<()> {
        let path = self.file.path().to_path_buf();
        self.file.close()?;
        log::debug!("Removed {}", path.display());
        Ok(())
    }
}

/// Something that finds tables in a PDF on disk.
pub trait TableReader {
    /// Tables on the selected pages, pages ascending, each page top to bottom.
    fn read_pdf(&self, path: &Path, pages: &PageSelection) -> Result<Vec<TableRecord>>;
}

/// Stream-mode reader: positioned spans per page fed to a [`TableDetector`].
#[derive(Debug, Clone, Default)]
pub struct StreamTableReader {
    detector: TableDetector,
}

impl StreamTableReader {
    pub fn new(config: TableDetectorConfig) -> Self {
        Self {
            detector: TableDetector::with_config(config),
        }
    }
}

impl TableReader for StreamTableReader {
    fn read_pdf(&self, path: &Path, pages: &PageSelection) -> Result<Vec<TableRecord>> {
        let source =
            LopdfSource::load_file(path).map_err(|e| Error::TableDetection(e.to_string()))?;
        let doc = source.raw_doc();
        let spans = SpanExtractor::new(doc);

        let mut records = Vec::new();
        for page_num in doc.get_pages().into_keys() {
            if !pages.includes(page_num) {
                continue;
            }

            let page_spans = spans
                .page_spans(page_num)
                .map_err(|e| Error::TableDetection(format!("page {}: {}", page_num, e)))?;

            for table in self.detector.detect(&page_spans) {
                log::debug!(
                    "Table on page {}: {} rows x {} columns",
                    page_num,
                    table.rows.len(),
                    table.column_count()
                );
                records.push(TableRecord::new(page_num, table.to_grid()));
            }
        }

        Ok(records)
    }
}

/// Run the stream-mode detector over the buffer.
pub fn extract_tables(buffer: &DocumentBuffer, options: &ExtractOptions) -> Result<Vec<TableRecord>> {
    let reader = StreamTableReader::new(options.table_config.clone());
    extract_tables_with(&reader, buffer, options)
}

/// Run `reader` over a transient copy of the buffer.
pub fn extract_tables_with<R: TableReader>(
    reader: &R,
    buffer: &DocumentBuffer,
    options: &ExtractOptions,
) -> Result<Vec<TableRecord>> {
    if !options.extract_tables {
        return Ok(Vec::new());
    }

    let transient = TransientPdf::create(buffer, options.temp_dir.as_deref())
        .map_err(|e| Error::TableDetection(format!("transient file: {}", e)))?;

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        reader.read_pdf(transient.path(), &options.table_pages)
    }));

    if let Err(e) = transient.release() {
        log::warn!("Failed to remove transient PDF: {}", e);
    }

    match outcome {
        Ok(tables) => tables,
        Err(payload) => Err(Error::TableDetection(format!(
            "detector panicked: {}",
            panic_message(&*payload)
        ))),
    }
}

/// [`extract_tables`], with every failure logged and replaced by `[]`.
pub fn extract_tables_or_empty(buffer: &DocumentBuffer, options: &ExtractOptions) -> Vec<TableRecord> {
    let reader = StreamTableReader::new(options.table_config.clone());
    extract_tables_with_or_empty(&reader, buffer, options)
}

/// [`extract_tables_with`], with every failure logged and replaced by `[]`.
pub fn extract_tables_with_or_empty<R: TableReader>(
    reader: &R,
    buffer: &DocumentBuffer,
    options: &ExtractOptions,
) -> Vec<TableRecord> {
    match extract_tables_with(reader, buffer, options) {
        Ok(tables) => tables,
        Err(e) => {
            log::warn!("{}", e);
            Vec::new()
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
