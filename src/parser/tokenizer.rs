//! Token counting with byte-pair encoding vocabularies.
//!
//! Vocabularies are compiled into `tiktoken-rs`, so loading never touches
//! the network. Each vocabulary is built at most once per process and shared
//! read-only afterwards.

use std::sync::OnceLock;

use tiktoken_rs::CoreBPE;

use crate::error::{Error, Result};

use super::options::TokenEncoding;

/// Something that can count tokens in a piece of text.
///
/// Counting must be deterministic and context free: the count of a text
/// depends only on that text.
pub trait TokenCounter {
    /// Number of tokens in `text`.
    fn count_tokens(&self, text: &str) -> u64;
}

static CL100K: OnceLock<CoreBPE> = OnceLock::new();
static O200K: OnceLock<CoreBPE> = OnceLock::new();
static P50K: OnceLock<CoreBPE> = OnceLock::new();
static R50K: OnceLock<CoreBPE> = OnceLock::new();

/// BPE tokenizer backed by a shared vocabulary.
#[derive(Clone, Copy)]
pub struct BpeTokenizer {
    encoding: TokenEncoding,
    bpe: &'static CoreBPE,
}

impl BpeTokenizer {
    /// Load (or reuse) the vocabulary for `encoding`.
    pub fn new(encoding: TokenEncoding) -> Result<Self> {
        let cell: &'static OnceLock<CoreBPE> = match encoding {
            TokenEncoding::Cl100kBase => &CL100K,
            TokenEncoding::O200kBase => &O200K,
            TokenEncoding::P50kBase => &P50K,
            TokenEncoding::R50kBase => &R50K,
        };

        if let Some(bpe) = cell.get() {
            return Ok(Self { encoding, bpe });
        }

        log::debug!("Loading {} vocabulary", encoding);
        let built = match encoding {
            TokenEncoding::Cl100kBase => tiktoken_rs::cl100k_base(),
            TokenEncoding::O200kBase => tiktoken_rs::o200k_base(),
            TokenEncoding::P50kBase => tiktoken_rs::p50k_base(),
            TokenEncoding::R50kBase => tiktoken_rs::r50k_base(),
        }
        .map_err(|e| Error::Tokenizer(format!("{}: {}", encoding, e)))?;
        // A concurrent loader may have won the race; either copy is identical.
        let _ = cell.set(built);
        let bpe = cell
            .get()
            .ok_or_else(|| Error::Tokenizer(format!("{}: vocabulary not initialized", encoding)))?;

        Ok(Self { encoding, bpe })
    }

    /// The default `cl100k_base` tokenizer.
    pub fn cl100k() -> Result<Self> {
        Self::new(TokenEncoding::Cl100kBase)
    }

    /// Vocabulary in use.
    pub fn encoding(&self) -> TokenEncoding {
        self.encoding
    }
}

impl TokenCounter for BpeTokenizer {
    fn count_tokens(&self, text: &str) -> u64 {
        if text.is_empty() {
            return 0;
        }
        // Special-token strings in document text are counted as ordinary text.
        self.bpe.encode_ordinary(text).len() as u64
    }
}

impl std::fmt::Debug for BpeTokenizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BpeTokenizer")
            .field("encoding", &self.encoding)
            .finish()
    }
}

/// Whitespace-separated word counter for pipeline tests.
#[cfg(test)]
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct WordCounter;

#[cfg(test)]
impl TokenCounter for WordCounter {
    fn count_tokens(&self, text: &str) -> u64 {
        text.split_whitespace().count() as u64
    }
}

impl<T: TokenCounter + ?Sized> TokenCounter for &T {
    fn count_tokens(&self, text: &str) -> u64 {
        (**self).count_tokens(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cl100k_known_counts() {
        let tokenizer = BpeTokenizer::cl100k().unwrap();
        assert_eq!(tokenizer.count_tokens(""), 0);
        assert_eq!(tokenizer.count_tokens("hello world"), 2);
        assert_eq!(tokenizer.encoding(), TokenEncoding::Cl100kBase);
    }

    #[test]
    fn test_vocabulary_is_shared() {
        let a = BpeTokenizer::cl100k().unwrap();
        let b = BpeTokenizer::cl100k().unwrap();
        assert!(std::ptr::eq(a.bpe, b.bpe));
    }

    #[test]
    fn test_special_tokens_are_ordinary_text() {
        let tokenizer = BpeTokenizer::cl100k().unwrap();
        assert!(tokenizer.count_tokens("<|endoftext|>") > 1);
    }

    #[test]
    fn test_newline_terminated_pages_sum_to_whole() {
        let tokenizer = BpeTokenizer::cl100k().unwrap();
        let pages = ["Quarterly report\n", "Revenue grew by 12 percent.\n", "Thanks.\n"];

        let per_page: u64 = pages.iter().map(|p| tokenizer.count_tokens(p)).sum();
        let whole = tokenizer.count_tokens(&pages.concat());
        assert_eq!(per_page, whole);
    }

    #[test]
    fn test_word_counter() {
        assert_eq!(WordCounter.count_tokens("  one two\nthree "), 3);
        assert_eq!(WordCounter.count_tokens(""), 0);
    }
}
