//! Depth-first traversal that flattens a checkout into one document.
//!
//! Uses the `ignore` crate's walker with its standard filters turned
//! off; every exclusion decision goes through [`IgnoreMatcher`] so
//! excluded directories are pruned before they are read.

use std::path::{Path, PathBuf};

use ignore::{DirEntry, WalkBuilder};
use serde::Serialize;
use thiserror::Error;

use crate::compact::Compaction;
use crate::filter::passes_extension_filter;
use crate::matcher::IgnoreMatcher;
use crate::output::{finalize, format_block};
use crate::tokens::{account, TokenCounter};

/// Default per-file line ceiling.
pub const DEFAULT_MAX_LINES: usize = 800;

/// Default directory depth guard.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Errors that can occur during directory walking.
#[derive(Debug, Error)]
pub enum WalkError {
    #[error("path not found: {path}")]
    NotFound { path: PathBuf },

    #[error("not a directory: {path}")]
    NotADirectory { path: PathBuf },

    #[error("permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("symlink loop detected: {path}")]
    SymlinkLoop { path: PathBuf },

    #[error("traversal failed: {0}")]
    Traverse(#[source] ignore::Error),
}

impl WalkError {
    fn from_io(path: PathBuf, source: std::io::Error) -> Self {
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => WalkError::PermissionDenied { path },
            std::io::ErrorKind::NotFound => WalkError::NotFound { path },
            _ => WalkError::Io { path, source },
        }
    }
}

fn convert_walk_error(err: ignore::Error) -> WalkError {
    match err {
        ignore::Error::WithPath { path, err } => match *err {
            ignore::Error::Io(source) => WalkError::from_io(path, source),
            other => WalkError::Traverse(ignore::Error::WithPath {
                path,
                err: Box::new(other),
            }),
        },
        ignore::Error::WithDepth { err, .. } => convert_walk_error(*err),
        ignore::Error::Loop { child, .. } => WalkError::SymlinkLoop { path: child },
        other => WalkError::Traverse(other),
    }
}

/// Options for one flattening walk.
#[derive(Debug, Clone)]
pub struct WalkOptions {
    /// Content transform applied before line counting.
    pub compaction: Compaction,
    /// Files with more lines than this are recorded as excluded.
    pub max_lines: usize,
    /// Directories at this depth or deeper are not descended into.
    pub max_depth: usize,
    /// Tokenizer used for per-file accounting.
    pub counter: TokenCounter,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            compaction: Compaction::Off,
            max_lines: DEFAULT_MAX_LINES,
            max_depth: DEFAULT_MAX_DEPTH,
            counter: TokenCounter::default(),
        }
    }
}

/// A file that passed the ignore rules and the extension filter.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// Absolute path on disk.
    pub path: PathBuf,
    /// Path relative to the walk root, `/`-separated.
    pub relative: String,
    /// Lowercase, dot-prefixed extension.
    pub extension: String,
    /// Raw bytes as read.
    pub content: Vec<u8>,
}

/// A file whose content made it into the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IncludedFile {
    pub path: String,
    pub size: u64,
    pub tokens: usize,
}

/// A file rejected for exceeding the line ceiling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExcludedFile {
    pub path: String,
    #[serde(rename = "lineCount")]
    pub line_count: usize,
}

/// Outcome of the line-count decision for one candidate.
#[derive(Debug, Clone)]
pub enum FileOutcome {
    Included { record: IncludedFile, block: String },
    Excluded(ExcludedFile),
}

/// Everything one walk produces.
#[derive(Debug, Clone, Default)]
pub struct Flattened {
    /// Concatenated, framed file blocks in traversal order.
    pub document: String,
    pub included: Vec<IncludedFile>,
    pub excluded: Vec<ExcludedFile>,
}

impl Flattened {
    /// Fold one file outcome into the result.
    pub fn record(&mut self, outcome: FileOutcome) {
        match outcome {
            FileOutcome::Included { record, block } => {
                self.document.push_str(&block);
                self.included.push(record);
            }
            FileOutcome::Excluded(record) => self.excluded.push(record),
        }
    }

    /// Sum of per-file token counts.
    pub fn total_tokens(&self) -> usize {
        self.included.iter().map(|f| f.tokens).sum()
    }

    pub fn included_paths(&self) -> impl Iterator<Item = &str> {
        self.included.iter().map(|f| f.path.as_str())
    }

    pub fn excluded_paths(&self) -> impl Iterator<Item = &str> {
        self.excluded.iter().map(|f| f.path.as_str())
    }
}

/// Count newline-separated pieces, so `"a\nb\n"` has 3 and `""` has 1.
pub fn count_lines(content: &str) -> usize {
    bytecount::count(content.as_bytes(), b'\n') + 1
}

/// Path of `path` relative to `root`, joined with `/` on every platform.
pub fn relative_slash_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<_> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect();
    Some(parts.join("/"))
}

/// Apply the transform and the line-count gate to one candidate.
pub fn decide(candidate: &Candidate, options: &WalkOptions) -> FileOutcome {
    let raw = String::from_utf8_lossy(&candidate.content);
    let content = options.compaction.transform(&raw, &candidate.extension);
    let lines = count_lines(&content);

    if lines <= options.max_lines {
        let accounting = account(&content, &options.counter);
        let name = candidate
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        tracing::debug!(
            path = %candidate.relative,
            bytes = accounting.bytes,
            tokens = accounting.tokens,
            compacted = options.compaction.is_enabled(),
            "File included"
        );

        FileOutcome::Included {
            block: format_block(&name, &candidate.relative, &accounting, &content),
            record: IncludedFile {
                path: candidate.relative.clone(),
                size: accounting.bytes,
                tokens: accounting.tokens,
            },
        }
    } else {
        tracing::debug!(
            path = %candidate.relative,
            lines,
            max_lines = options.max_lines,
            "File excluded (exceeds line limit)"
        );
        FileOutcome::Excluded(ExcludedFile {
            path: candidate.relative.clone(),
            line_count: lines,
        })
    }
}

/// Walk `root` and flatten every accepted file.
///
/// Any error listing a directory or reading a file aborts the walk.
/// Symlinks are not followed and, like other special files, produce no
/// record.
///
/// # Examples
///
/// ```no_run
/// use repoflat::matcher::IgnoreMatcher;
/// use repoflat::walker::{walk, WalkOptions};
/// use std::path::Path;
///
/// let root = Path::new("./checkout");
/// let matcher = IgnoreMatcher::new(root, &[]).unwrap();
/// let flattened = walk(root, &matcher, &WalkOptions::default()).unwrap();
/// println!("{} files included", flattened.included.len());
/// ```
pub fn walk(
    root: &Path,
    matcher: &IgnoreMatcher,
    options: &WalkOptions,
) -> Result<Flattened, WalkError> {
    if !root.exists() {
        return Err(WalkError::NotFound {
            path: root.to_path_buf(),
        });
    }
    if !root.is_dir() {
        return Err(WalkError::NotADirectory {
            path: root.to_path_buf(),
        });
    }

    let mut builder = WalkBuilder::new(root);
    builder.standard_filters(false).follow_links(false);

    let filter_root = root.to_path_buf();
    let filter_matcher = matcher.clone();
    let max_depth = options.max_depth;
    builder.filter_entry(move |entry| keep_entry(&filter_root, &filter_matcher, max_depth, entry));

    let mut flattened = Flattened::default();

    for result in builder.build() {
        let entry = result.map_err(convert_walk_error)?;
        if entry.depth() == 0 {
            continue;
        }

        let Some(file_type) = entry.file_type() else {
            continue;
        };
        let Some(relative) = relative_slash_path(root, entry.path()) else {
            continue;
        };

        if file_type.is_dir() {
            tracing::debug!(path = %relative, "Walking directory");
            continue;
        }
        if !file_type.is_file() {
            tracing::debug!(path = %relative, "Skipping symlink or special file");
            continue;
        }

        let Some(extension) = passes_extension_filter(entry.path()) else {
            tracing::debug!(path = %relative, "File skipped (extension not allowed)");
            continue;
        };

        let content = std::fs::read(entry.path())
            .map_err(|e| WalkError::from_io(entry.path().to_path_buf(), e))?;

        let candidate = Candidate {
            path: entry.path().to_path_buf(),
            relative,
            extension,
            content,
        };
        flattened.record(decide(&candidate, options));
    }

    flattened.document = finalize(&flattened.document);

    tracing::info!(
        root = %root.display(),
        included = flattened.included.len(),
        excluded = flattened.excluded.len(),
        "Walk finished"
    );

    Ok(flattened)
}

fn keep_entry(root: &Path, matcher: &IgnoreMatcher, max_depth: usize, entry: &DirEntry) -> bool {
    let Some(relative) = relative_slash_path(root, entry.path()) else {
        return true;
    };
    if relative.is_empty() {
        return true;
    }

    let is_dir = entry.file_type().is_some_and(|ft| ft.is_dir());
    if matcher.excluded(&relative, is_dir) {
        if is_dir {
            tracing::debug!(path = %relative, "Directory ignored");
        } else {
            tracing::debug!(path = %relative, "File ignored");
        }
        return false;
    }

    if is_dir && entry.depth() >= max_depth {
        tracing::warn!(path = %relative, max_depth, "Depth limit reached, not descending");
        return false;
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::IgnoreMatcher;
    use std::collections::HashSet;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, relative: &str, content: &str) {
        let path = dir.path().join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn lines(n: usize) -> String {
        (1..=n)
            .map(|i| format!("const v{i} = {i};"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn run(dir: &TempDir, extra: &[&str], options: &WalkOptions) -> Flattened {
        let extra: Vec<String> = extra.iter().map(|s| s.to_string()).collect();
        let matcher = IgnoreMatcher::new(dir.path(), &extra).unwrap();
        walk(dir.path(), &matcher, options).unwrap()
    }

    #[test]
    fn test_count_lines() {
        assert_eq!(count_lines(""), 1);
        assert_eq!(count_lines("a"), 1);
        assert_eq!(count_lines("a\nb"), 2);
        assert_eq!(count_lines("a\nb\n"), 3);
    }

    #[test]
    fn test_relative_slash_path() {
        let root = Path::new("/repo");
        assert_eq!(
            relative_slash_path(root, &root.join("src").join("a.rs")),
            Some("src/a.rs".to_string())
        );
        assert_eq!(relative_slash_path(root, root), Some(String::new()));
        assert_eq!(relative_slash_path(root, Path::new("/other/a.rs")), None);
    }

    #[test]
    fn test_end_to_end_defaults() {
        let dir = TempDir::new().unwrap();
        write(&dir, "src/a.js", &lines(10));
        write(&dir, "README.md", "# Title\n\nSome\ntext\nhere");
        write(&dir, ".env", "SECRET=1");
        write(&dir, "vendor/big.js", &lines(900));

        let result = run(&dir, &[], &WalkOptions::default());

        let included: HashSet<_> = result.included_paths().collect();
        assert_eq!(included, HashSet::from(["src/a.js", "README.md"]));
        assert_eq!(
            result.excluded,
            vec![ExcludedFile {
                path: "vendor/big.js".into(),
                line_count: 900
            }]
        );

        assert_eq!(result.document.matches("<File name=").count(), 2);
        assert!(result.document.contains(r#"<File name="a.js" path="src/a.js""#));
        assert!(result.document.contains(r#"<File name="README.md" path="README.md""#));
        assert!(!result.document.contains("SECRET"));
        assert!(!result.document.contains("big.js"));
    }

    #[test]
    fn test_extension_gating_produces_no_record() {
        let dir = TempDir::new().unwrap();
        write(&dir, "logo.png", "not really a png");
        write(&dir, "Makefile", "all:\n\techo hi");
        write(&dir, "archive.tar.gz", "gz");
        write(&dir, "main.go", "package main");

        let result = run(&dir, &[], &WalkOptions::default());
        assert_eq!(result.included_paths().collect::<Vec<_>>(), vec!["main.go"]);
        assert!(result.excluded.is_empty());
    }

    #[test]
    fn test_compound_extension_uses_last_segment() {
        let dir = TempDir::new().unwrap();
        write(&dir, "dist/app.min.js", "var a=1;");

        let result = run(&dir, &[], &WalkOptions::default());
        assert_eq!(
            result.included_paths().collect::<Vec<_>>(),
            vec!["dist/app.min.js"]
        );
    }

    #[test]
    fn test_ignored_directory_is_pruned() {
        let dir = TempDir::new().unwrap();
        write(&dir, "build/out.js", "x");
        write(&dir, "build/.gitignore-negated.js", "y");
        write(&dir, "src/ok.js", "z");
        write(&dir, ".gitignore", "build/\n!build/out.js\n");

        let result = run(&dir, &[], &WalkOptions::default());
        let included: Vec<_> = result.included_paths().collect();
        assert_eq!(included, vec!["src/ok.js"]);
    }

    #[test]
    fn test_caller_negation_reincludes_file() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a.js", "a");
        write(&dir, "b.js", "b");

        let result = run(&dir, &["*.js", "!b.js"], &WalkOptions::default());
        assert_eq!(result.included_paths().collect::<Vec<_>>(), vec!["b.js"]);
    }

    #[test]
    fn test_hidden_directories_skipped() {
        let dir = TempDir::new().unwrap();
        write(&dir, ".git/config.toml", "[core]");
        write(&dir, ".github/workflows/ci.yml", "on: push");
        write(&dir, "src/lib.rs", "pub fn f() {}");

        let result = run(&dir, &[], &WalkOptions::default());
        assert_eq!(result.included_paths().collect::<Vec<_>>(), vec!["src/lib.rs"]);
    }

    #[test]
    fn test_compaction_rescues_long_file() {
        let dir = TempDir::new().unwrap();
        write(&dir, "long.js", &lines(900));

        let plain = run(&dir, &[], &WalkOptions::default());
        assert!(plain.included.is_empty());
        assert_eq!(plain.excluded[0].line_count, 900);

        let compacted = run(
            &dir,
            &[],
            &WalkOptions {
                compaction: Compaction::Whitespace,
                ..Default::default()
            },
        );
        assert!(compacted.excluded.is_empty());
        assert_eq!(compacted.included_paths().collect::<Vec<_>>(), vec!["long.js"]);
    }

    #[test]
    fn test_markdown_identical_with_or_without_compaction() {
        let dir = TempDir::new().unwrap();
        let markdown = "# Title\n\n  indented   text\n\n- list\n";
        write(&dir, "NOTES.md", markdown);

        let plain = run(&dir, &[], &WalkOptions::default());
        let compacted = run(
            &dir,
            &[],
            &WalkOptions {
                compaction: Compaction::Whitespace,
                ..Default::default()
            },
        );
        assert_eq!(plain.document, compacted.document);
        assert!(plain.document.contains(markdown));
    }

    #[test]
    fn test_size_is_post_transform() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a.py", "x   =   1\n\n\ny = 2\n");

        let result = run(
            &dir,
            &[],
            &WalkOptions {
                compaction: Compaction::Whitespace,
                ..Default::default()
            },
        );
        assert_eq!(result.included[0].size, "x = 1 y = 2".len() as u64);
        assert!(result.document.contains(r#"size="11""#));
    }

    #[test]
    fn test_max_lines_boundary() {
        let dir = TempDir::new().unwrap();
        write(&dir, "exact.rs", &lines(5));
        write(&dir, "over.rs", &lines(6));

        let result = run(
            &dir,
            &[],
            &WalkOptions {
                max_lines: 5,
                ..Default::default()
            },
        );
        assert_eq!(result.included_paths().collect::<Vec<_>>(), vec!["exact.rs"]);
        assert_eq!(result.excluded_paths().collect::<Vec<_>>(), vec!["over.rs"]);
    }

    #[test]
    fn test_included_and_excluded_are_disjoint() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a.rs", &lines(3));
        write(&dir, "b.rs", &lines(30));
        write(&dir, "c/d.ts", &lines(2));
        write(&dir, "c/e.ts", &lines(40));
        write(&dir, "c/f.bin", "binary");

        let result = run(
            &dir,
            &[],
            &WalkOptions {
                max_lines: 10,
                ..Default::default()
            },
        );
        let included: HashSet<_> = result.included_paths().collect();
        let excluded: HashSet<_> = result.excluded_paths().collect();
        assert!(included.is_disjoint(&excluded));

        let all: HashSet<_> = included.union(&excluded).copied().collect();
        assert_eq!(all, HashSet::from(["a.rs", "b.rs", "c/d.ts", "c/e.ts"]));
    }

    #[test]
    fn test_empty_repository() {
        let dir = TempDir::new().unwrap();
        write(&dir, "image.png", "png");

        let result = run(&dir, &[], &WalkOptions::default());
        assert!(result.document.is_empty());
        assert_eq!(result.total_tokens(), 0);
    }

    #[test]
    fn test_depth_guard() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a/shallow.rs", "1");
        write(&dir, "a/b/c/deep.rs", "2");

        let result = run(
            &dir,
            &[],
            &WalkOptions {
                max_depth: 2,
                ..Default::default()
            },
        );
        let included: Vec<_> = result.included_paths().collect();
        assert_eq!(included, vec!["a/shallow.rs"]);
    }

    #[test]
    fn test_invalid_utf8_is_lossy() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("Blob.class"), [0xCA, 0xFE, 0xBA, 0xBE]).unwrap();

        let result = run(&dir, &[], &WalkOptions::default());
        assert_eq!(result.included.len(), 1);
        assert!(result.document.contains('\u{FFFD}'));
    }

    #[test]
    fn test_walk_nonexistent() {
        let dir = TempDir::new().unwrap();
        let matcher = IgnoreMatcher::new(dir.path(), &[]).unwrap();
        let missing = dir.path().join("missing");
        let err = walk(&missing, &matcher, &WalkOptions::default()).unwrap_err();
        assert!(matches!(err, WalkError::NotFound { .. }));
    }

    #[test]
    fn test_walk_file_root() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a.rs", "fn a() {}");
        let matcher = IgnoreMatcher::new(dir.path(), &[]).unwrap();
        let err = walk(&dir.path().join("a.rs"), &matcher, &WalkOptions::default()).unwrap_err();
        assert!(matches!(err, WalkError::NotADirectory { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_not_followed() {
        let dir = TempDir::new().unwrap();
        write(&dir, "real/a.rs", "fn a() {}");
        std::os::unix::fs::symlink(dir.path().join("real"), dir.path().join("link")).unwrap();
        std::os::unix::fs::symlink(dir.path().join("real/a.rs"), dir.path().join("b.rs")).unwrap();

        let result = run(&dir, &[], &WalkOptions::default());
        assert_eq!(result.included_paths().collect::<Vec<_>>(), vec!["real/a.rs"]);
    }
}
