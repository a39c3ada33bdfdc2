//! Token and size accounting for flattened files.
//!
//! Uses tiktoken-rs for OpenAI-compatible token counts,
//! with a fallback heuristic when a BPE table cannot be loaded.

use std::sync::OnceLock;

use serde::Serialize;
use tiktoken_rs::CoreBPE;

/// Token encoding to use for counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    /// cl100k_base: GPT-4, GPT-3.5-turbo
    #[default]
    Cl100kBase,
    /// o200k_base: GPT-4o
    O200kBase,
    /// p50k_base: Codex, text-davinci-002/003
    P50kBase,
    /// r50k_base: GPT-3 (davinci)
    R50kBase,
}

impl std::fmt::Display for Encoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Encoding::Cl100kBase => write!(f, "cl100k_base"),
            Encoding::O200kBase => write!(f, "o200k_base"),
            Encoding::P50kBase => write!(f, "p50k_base"),
            Encoding::R50kBase => write!(f, "r50k_base"),
        }
    }
}

impl std::str::FromStr for Encoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cl100k" | "cl100k_base" => Ok(Encoding::Cl100kBase),
            "o200k" | "o200k_base" => Ok(Encoding::O200kBase),
            "p50k" | "p50k_base" => Ok(Encoding::P50kBase),
            "r50k" | "r50k_base" | "gpt2" => Ok(Encoding::R50kBase),
            _ => Err(format!("unknown encoding: {}", s)),
        }
    }
}

// Cached tokenizers - initialized once per encoding
static CL100K: OnceLock<Option<CoreBPE>> = OnceLock::new();
static O200K: OnceLock<Option<CoreBPE>> = OnceLock::new();
static P50K: OnceLock<Option<CoreBPE>> = OnceLock::new();
static R50K: OnceLock<Option<CoreBPE>> = OnceLock::new();

fn get_tokenizer(encoding: Encoding) -> Option<&'static CoreBPE> {
    match encoding {
        Encoding::Cl100kBase => CL100K
            .get_or_init(|| tiktoken_rs::cl100k_base().ok())
            .as_ref(),
        Encoding::O200kBase => O200K
            .get_or_init(|| tiktoken_rs::o200k_base().ok())
            .as_ref(),
        Encoding::P50kBase => P50K
            .get_or_init(|| tiktoken_rs::p50k_base().ok())
            .as_ref(),
        Encoding::R50kBase => R50K
            .get_or_init(|| tiktoken_rs::r50k_base().ok())
            .as_ref(),
    }
}

fn tiktoken_count(text: &str, encoding: Encoding) -> Option<usize> {
    let bpe = get_tokenizer(encoding)?;
    Some(bpe.encode_ordinary(text).len())
}

/// Fallback heuristic: ~4 characters per token.
fn fallback_count(text: &str) -> usize {
    (text.len() + 3) / 4
}

/// Count tokens in text using the default encoding (cl100k_base).
///
/// Never fails; falls back to a heuristic if tiktoken is unavailable.
///
/// # Examples
///
/// ```
/// use repoflat::tokens::count_tokens;
///
/// let count = count_tokens("Hello, world!");
/// assert!(count > 0);
/// ```
pub fn count_tokens(text: &str) -> usize {
    count_tokens_with_encoding(text, Encoding::default())
}

/// Count tokens in text using the specified encoding.
pub fn count_tokens_with_encoding(text: &str, encoding: Encoding) -> usize {
    tiktoken_count(text, encoding).unwrap_or_else(|| fallback_count(text))
}

/// Reusable token counter bound to one encoding.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenCounter {
    encoding: Encoding,
}

impl TokenCounter {
    pub fn new(encoding: Encoding) -> Self {
        Self { encoding }
    }

    /// Count tokens in the given text.
    pub fn count(&self, text: &str) -> usize {
        count_tokens_with_encoding(text, self.encoding)
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }
}

/// Size and token cost of one piece of content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Accounting {
    /// UTF-8 byte length of the content as written.
    pub bytes: u64,
    /// Estimated token count.
    pub tokens: usize,
}

/// Measure content that is about to be written.
///
/// The byte size is taken from the (possibly compacted) content itself,
/// not from the file it was read from.
pub fn account(content: &str, counter: &TokenCounter) -> Accounting {
    Accounting {
        bytes: content.len() as u64,
        tokens: counter.count(content),
    }
}
