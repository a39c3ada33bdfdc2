//! Output assembly for repoflat.
//!
//! Frames included files into `<File>` blocks, names the artifact after
//! the repository, writes it, and renders the run summary as text or
//! JSON.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::tokens::Accounting;
use crate::walker::{ExcludedFile, Flattened, IncludedFile};

/// Errors that can occur while writing output.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Summary format selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable lines (default).
    #[default]
    Text,
    /// JSON for programmatic access.
    Json,
}

// ============================================================================
// Document
// ============================================================================

/// Frame one file's content.
///
/// The opening tag carries the base name, the relative path, the byte
/// size and the token count; the closing tag repeats the name so blocks
/// can be split back out of the document.
///
/// # Examples
///
/// ```
/// use repoflat::output::format_block;
/// use repoflat::tokens::Accounting;
///
/// let block = format_block("a.rs", "src/a.rs", &Accounting { bytes: 9, tokens: 4 }, "fn a() {}");
/// assert_eq!(
///     block,
///     "\n<File name=\"a.rs\" path=\"src/a.rs\" size=\"9\" tokens=\"4\">\nfn a() {}\n</File name=\"a.rs\">\n"
/// );
/// ```
pub fn format_block(name: &str, relative: &str, accounting: &Accounting, content: &str) -> String {
    let mut block = String::with_capacity(content.len() + name.len() * 2 + relative.len() + 64);
    let _ = write!(
        block,
        "\n<File name=\"{}\" path=\"{}\" size=\"{}\" tokens=\"{}\">\n{}\n</File name=\"{}\">\n",
        name, relative, accounting.bytes, accounting.tokens, content, name
    );
    block
}

/// Trim the assembled document once, at the end of a run.
pub fn finalize(document: &str) -> String {
    document.trim().to_string()
}

// ============================================================================
// Naming
// ============================================================================

/// Repository name: the final segment of `url` without a `.git` suffix.
///
/// Handles HTTPS URLs, scp-style SSH remotes and local paths.
pub fn repository_name(url: &str) -> &str {
    let is_separator = |c: char| c == '/' || c == '\\' || c == ':';
    let trimmed = url.trim_end_matches(is_separator);
    let last = trimmed.rsplit(is_separator).next().unwrap_or(trimmed);
    last.strip_suffix(".git").unwrap_or(last)
}

/// ASCII spelling of an accented Latin letter, lowercased.
fn fold_latin(c: char) -> Option<&'static str> {
    let folded = match c.to_lowercase().next()? {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ă' | 'ą' => "a",
        'æ' => "ae",
        'ç' | 'ć' | 'ĉ' | 'ċ' | 'č' => "c",
        'ď' | 'đ' | 'ð' => "d",
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ĕ' | 'ė' | 'ę' | 'ě' => "e",
        'ĝ' | 'ğ' | 'ġ' | 'ģ' => "g",
        'ĥ' | 'ħ' => "h",
        'ì' | 'í' | 'î' | 'ï' | 'ĩ' | 'ī' | 'ĭ' | 'į' | 'ı' => "i",
        'ĵ' => "j",
        'ķ' => "k",
        'ĺ' | 'ļ' | 'ľ' | 'ŀ' | 'ł' => "l",
        'ñ' | 'ń' | 'ņ' | 'ň' => "n",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' | 'ŏ' | 'ő' => "o",
        'œ' => "oe",
        'ŕ' | 'ŗ' | 'ř' => "r",
        'ś' | 'ŝ' | 'ş' | 'š' => "s",
        'ß' => "ss",
        'ţ' | 'ť' | 'ŧ' => "t",
        'þ' => "th",
        'ù' | 'ú' | 'û' | 'ü' | 'ũ' | 'ū' | 'ŭ' | 'ů' | 'ű' | 'ų' => "u",
        'ŵ' => "w",
        'ý' | 'ÿ' | 'ŷ' => "y",
        'ź' | 'ż' | 'ž' => "z",
        _ => return None,
    };
    Some(folded)
}

/// Make a string safe to use as a file name.
///
/// ASCII alphanumerics are lowercased, accented Latin letters are folded
/// to ASCII, `.` and `_` are kept, and any other run of characters
/// becomes a single `-`.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if let Some(folded) = fold_latin(c) {
            slug.push_str(folded);
        } else if c == '.' || c == '_' {
            slug.push(c);
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }

    let slug = slug.trim_matches(|c: char| c == '-' || c == '.');
    if slug.is_empty() {
        "repository".to_string()
    } else {
        slug.to_string()
    }
}

/// Output file name for a repository URL.
///
/// # Examples
///
/// ```
/// use repoflat::output::output_file_name;
///
/// assert_eq!(output_file_name("https://example.com/org/My-Repo.git"), "my-repo.txt");
/// ```
pub fn output_file_name(url: &str) -> String {
    format!("{}.txt", slugify(repository_name(url)))
}

/// Write the document and return the size of the written file.
pub fn write_document(path: &Path, document: &str) -> Result<u64, OutputError> {
    let to_write_error = |source| OutputError::Write {
        path: path.to_path_buf(),
        source,
    };
    std::fs::write(path, document).map_err(to_write_error)?;
    let metadata = std::fs::metadata(path).map_err(to_write_error)?;
    Ok(metadata.len())
}

// ============================================================================
// Summary
// ============================================================================

/// What the run produced, as reported to the user.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    /// Written artifact.
    pub output: PathBuf,
    /// Size of the artifact on disk.
    pub bytes: u64,
    /// Token estimate for the whole document.
    pub tokens: usize,
    pub included: Vec<IncludedFile>,
    pub excluded: Vec<ExcludedFile>,
}

impl Summary {
    pub fn new(output: PathBuf, bytes: u64, tokens: usize, flattened: &Flattened) -> Self {
        Self {
            output,
            bytes,
            tokens,
            included: flattened.included.clone(),
            excluded: flattened.excluded.clone(),
        }
    }

    /// Artifact size in kilobytes.
    pub fn kilobytes(&self) -> f64 {
        self.bytes as f64 / 1024.0
    }
}

/// Render the summary in the requested format.
///
/// Text output lists individual files only when `verbose` is set; JSON
/// output always carries them.
pub fn format_summary(
    summary: &Summary,
    format: OutputFormat,
    verbose: bool,
) -> Result<String, OutputError> {
    match format {
        OutputFormat::Text => Ok(format_summary_text(summary, verbose)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(summary)?),
    }
}

fn format_summary_text(summary: &Summary, verbose: bool) -> String {
    let mut out = String::with_capacity(256);
    let name = summary.output.display();

    let _ = writeln!(out, "Output written to {}", name);
    let _ = writeln!(out, "\nFinal Output:");
    let _ = writeln!(out, "File output: {}", name);
    let _ = writeln!(out, "FileSize: {:.2}kb", summary.kilobytes());
    let _ = writeln!(out, "Estimate Tokens: {}", summary.tokens);

    if verbose {
        let _ = writeln!(out, "\nFiles included in the output:");
        for file in &summary.included {
            let _ = writeln!(out, "{} ({} bytes, {} tokens)", file.path, file.size, file.tokens);
        }

        if summary.excluded.is_empty() {
            let _ = writeln!(out, "\nNo files excluded");
        } else {
            let _ = writeln!(out, "\nFiles excluded due to exceeding maximum line count:");
            for file in &summary.excluded {
                let _ = writeln!(out, "{} ({} lines)", file.path, file.line_count);
            }
        }
    }

    out
}
