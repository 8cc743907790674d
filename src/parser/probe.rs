//! Page-count probe.
//!
//! Opens its own handle on the buffer and reads the page tree only. The
//! probe never fails: any error is logged and reported as zero pages.

use crate::error::{Error, Result};
use crate::intake::DocumentBuffer;

use super::backend::DocumentSource;

/// Count pages with a fresh `S` handle, or 0 if the document cannot be opened.
pub fn probe_page_count<S: DocumentSource>(buffer: &DocumentBuffer) -> u32 {
    match try_page_count::<S>(buffer) {
        Ok(count) => count,
        Err(e) => {
            log::warn!("{}", e);
            0
        }
    }
}

/// Fallible variant of [`probe_page_count`].
pub fn try_page_count<S: DocumentSource>(buffer: &DocumentBuffer) -> Result<u32> {
    let source = S::open(buffer).map_err(|e| Error::PageCountProbe(e.to_string()))?;
    let count = source.page_count();
    source.close();
    Ok(count)
}
