//! Ignore rules for repository traversal.
//!
//! Combines the repository's root `.gitignore` with a fixed set of
//! built-in exclusions and caller-supplied patterns. Rules follow
//! gitignore semantics and later rules take precedence, so a caller
//! pattern such as `!docs/keep.md` can re-include an earlier match.

use std::path::Path;

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use thiserror::Error;

/// Exclusions applied to every repository.
pub const BUILTIN_EXCLUDES: &[&str] = &[
    "package-lock.json",
    "yarn.lock",
    ".*",
    "LICENSE*",
    "*.ico",
    "*.log",
];

/// Name of the ignore file read from the repository root.
pub const IGNORE_FILE: &str = ".gitignore";

/// Errors that can occur while building the matcher.
#[derive(Debug, Error)]
pub enum MatcherError {
    #[error("invalid exclude pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: ignore::Error,
    },

    #[error("failed to build ignore rules: {0}")]
    Build(#[source] ignore::Error),
}

/// Answers "is this path excluded?" for paths relative to one root.
#[derive(Debug, Clone)]
pub struct IgnoreMatcher {
    gitignore: Gitignore,
}

impl IgnoreMatcher {
    /// Build the matcher for a checkout at `root`.
    ///
    /// A missing or empty `.gitignore` is fine. Lines in it that fail to
    /// parse are logged and dropped; an invalid pattern in `extra` is an
    /// error since it came from the caller.
    pub fn new(root: &Path, extra: &[String]) -> Result<Self, MatcherError> {
        let mut builder = GitignoreBuilder::new(root);

        let ignore_file = root.join(IGNORE_FILE);
        if ignore_file.is_file() {
            if let Some(err) = builder.add(&ignore_file) {
                tracing::warn!(
                    path = %ignore_file.display(),
                    error = %err,
                    "Some ignore file rules could not be parsed"
                );
            } else {
                tracing::debug!(path = %ignore_file.display(), "Loaded repository ignore file");
            }
        }

        for pattern in BUILTIN_EXCLUDES {
            builder
                .add_line(None, pattern)
                .map_err(|source| MatcherError::InvalidPattern {
                    pattern: pattern.to_string(),
                    source,
                })?;
        }

        for pattern in extra {
            builder
                .add_line(None, pattern)
                .map_err(|source| MatcherError::InvalidPattern {
                    pattern: pattern.clone(),
                    source,
                })?;
        }

        let gitignore = builder.build().map_err(MatcherError::Build)?;
        Ok(Self { gitignore })
    }

    /// Whether `relative` (a path under the root, `/`-separated) is excluded.
    ///
    /// Only the path itself is checked. Callers prune excluded
    /// directories so their descendants are never asked about.
    pub fn excluded(&self, relative: impl AsRef<Path>, is_dir: bool) -> bool {
        self.gitignore.matched(relative, is_dir).is_ignore()
    }

    /// Total number of rules, including whitelist rules.
    pub fn num_rules(&self) -> usize {
        self.gitignore.num_ignores() as usize + self.gitignore.num_whitelists() as usize
    }

    /// Directory the rules are anchored at.
    pub fn root(&self) -> &Path {
        self.gitignore.path()
    }
}
