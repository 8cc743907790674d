//! Single-pass content extraction.
//!
//! Walks a document's pages once, accumulating the concatenated text, the
//! summed per-page token count and the embedded images as data URIs.

use crate::error::Result;
use crate::intake::DocumentBuffer;
use crate::model::Page;

use super::backend::DocumentSource;
use super::tokenizer::TokenCounter;

/// Running state of the page walk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageAccumulator {
    /// Page texts joined in order, with no separator
    pub text: String,

    /// Sum of per-page token counts
    pub token_count: u64,

    /// Data URIs, page order then discovery order within a page
    pub images: Vec<String>,

    /// Pages folded so far
    pub pages_seen: u32,
}

impl PageAccumulator {
    /// Fold one page into the accumulator.
    pub fn push_page<T: TokenCounter>(&mut self, page: Page, tokenizer: &T) {
        self.token_count += tokenizer.count_tokens(&page.text);
        self.text.push_str(&page.text);
        self.images
            .extend(page.images.into_iter().map(|image| image.into_data_uri()));
        self.pages_seen += 1;
    }
}

/// Output of one content pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentSummary {
    pub text: String,
    pub token_count: u64,
    pub images: Vec<String>,
    pub pages_seen: u32,
}

impl From<PageAccumulator> for ContentSummary {
    fn from(acc: PageAccumulator) -> Self {
        Self {
            text: acc.text,
            token_count: acc.token_count,
            images: acc.images,
            pages_seen: acc.pages_seen,
        }
    }
}

/// Fold an ordered page sequence. The first failing page aborts the fold.
pub fn fold_pages<I, T>(pages: I, tokenizer: &T) -> Result<PageAccumulator>
where
    I: IntoIterator<Item = Result<Page>>,
    T: TokenCounter,
{
    pages
        .into_iter()
        .try_fold(PageAccumulator::default(), |mut acc, page| {
            acc.push_page(page?, tokenizer);
            Ok(acc)
        })
}

/// Open the buffer with `S`, walk every page once, and close it.
///
/// Any failure is reported as [`crate::Error::Extraction`].
pub fn extract_content<S, T>(
    buffer: &DocumentBuffer,
    tokenizer: &T,
    with_images: bool,
) -> Result<ContentSummary>
where
    S: DocumentSource,
    T: TokenCounter,
{
    let source = S::open(buffer).map_err(|e| e.into_extraction())?;

    let folded = fold_pages(source.pages(with_images), tokenizer);
    source.close();

    let acc = folded.map_err(|e| e.into_extraction())?;
    log::debug!(
        "Extracted {} pages: {} chars, {} tokens, {} images",
        acc.pages_seen,
        acc.text.len(),
        acc.token_count,
        acc.images.len()
    );

    Ok(acc.into())
}
