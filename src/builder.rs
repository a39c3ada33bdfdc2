//! Fluent builder API for repoflat.
//!
//! Collects the run configuration and drives matcher, walker and
//! fetcher. Remote repositories are cloned into a temporary directory
//! that is removed on every exit path.

use std::path::Path;

use crate::compact::Compaction;
use crate::errors::RepoflatError;
use crate::fetch::{FetchError, RepositoryFetcher};
use crate::matcher::IgnoreMatcher;
use crate::tokens::{Encoding, TokenCounter};
use crate::walker::{walk, Flattened, WalkOptions};

/// Builder for flattening a repository.
///
/// # Examples
///
/// ```no_run
/// use repoflat::builder::Flattener;
/// use repoflat::fetch::GitCli;
///
/// let flattened = Flattener::new()
///     .exclude(["docs/", "*.snap"])
///     .minify(true)
///     .max_lines(1200)
///     .flatten_repository("https://github.com/org/repo.git", &GitCli::new())
///     .unwrap();
///
/// println!("{} files, {} tokens", flattened.included.len(), flattened.total_tokens());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Flattener {
    excludes: Vec<String>,
    walk_options: WalkOptions,
}

impl Flattener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add ignore patterns on top of the repository's and the built-ins.
    pub fn exclude<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excludes.extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Enable whitespace compaction for non-documentation files.
    pub fn minify(mut self, enabled: bool) -> Self {
        self.walk_options.compaction = Compaction::from_flag(enabled);
        self
    }

    /// Per-file line ceiling (default 800).
    pub fn max_lines(mut self, max_lines: usize) -> Self {
        self.walk_options.max_lines = max_lines;
        self
    }

    /// Directory depth guard (default 256).
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.walk_options.max_depth = depth;
        self
    }

    /// Tokenizer used for the per-file counts.
    pub fn encoding(mut self, encoding: Encoding) -> Self {
        self.walk_options.counter = TokenCounter::new(encoding);
        self
    }

    pub fn walk_options(&self) -> &WalkOptions {
        &self.walk_options
    }

    pub fn excludes(&self) -> &[String] {
        &self.excludes
    }

    /// Flatten an existing local directory.
    pub fn flatten_dir(&self, root: impl AsRef<Path>) -> Result<Flattened, RepoflatError> {
        let root = root.as_ref();
        let matcher = IgnoreMatcher::new(root, &self.excludes)?;
        tracing::debug!(
            root = %matcher.root().display(),
            rules = matcher.num_rules(),
            "Ignore rules loaded"
        );
        Ok(walk(root, &matcher, &self.walk_options)?)
    }

    /// Fetch `url` into a temporary checkout and flatten it.
    ///
    /// The checkout is deleted before this returns, whether the fetch
    /// or the walk succeeded or not.
    pub fn flatten_repository(
        &self,
        url: &str,
        fetcher: &dyn RepositoryFetcher,
    ) -> Result<Flattened, RepoflatError> {
        let checkout = tempfile::Builder::new()
            .prefix("repoflat-")
            .tempdir()
            .map_err(FetchError::Workspace)?;

        let result = fetcher
            .fetch(url, checkout.path())
            .map_err(RepoflatError::from)
            .and_then(|()| self.flatten_dir(checkout.path()));

        let path = checkout.path().to_path_buf();
        if let Err(e) = checkout.close() {
            tracing::warn!(path = %path.display(), error = %e, "Failed to remove checkout");
        } else {
            tracing::debug!(path = %path.display(), "Removed checkout");
        }

        result
    }
}
