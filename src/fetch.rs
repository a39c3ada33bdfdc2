//! Obtaining a local copy of a repository.
//!
//! The pipeline only needs "URL into directory, or fail". [`GitCli`]
//! shells out to `git clone`; anything else implementing
//! [`RepositoryFetcher`] can stand in for it.

use std::path::Path;
use std::process::Command;

use thiserror::Error;

/// Errors from fetching a repository.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to launch git: {0}")]
    Launch(#[source] std::io::Error),

    #[error("git clone of {url} failed ({status}): {}", failure_line(.stderr))]
    Clone {
        url: String,
        status: String,
        stderr: String,
    },

    #[error("failed to prepare checkout directory: {0}")]
    Workspace(#[source] std::io::Error),
}

/// Condense git's stderr into one line.
///
/// git prints progress such as `Cloning into '...'...` before the
/// `fatal:`/`error:` lines that explain a failure. Only those lines are
/// kept when present; otherwise every non-empty line is kept. Lines are
/// joined with `; `.
pub fn failure_line(stderr: &str) -> String {
    let lines: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    let diagnostics: Vec<&str> = lines
        .iter()
        .copied()
        .filter(|line| line.starts_with("fatal:") || line.starts_with("error:"))
        .collect();

    if diagnostics.is_empty() {
        lines.join("; ")
    } else {
        diagnostics.join("; ")
    }
}

/// Populates `destination` with the contents of the repository at `url`.
pub trait RepositoryFetcher {
    fn fetch(&self, url: &str, destination: &Path) -> Result<(), FetchError>;
}

/// Fetches with the host's `git` executable.
#[derive(Debug, Clone)]
pub struct GitCli {
    program: String,
}

impl GitCli {
    pub fn new() -> Self {
        Self {
            program: "git".to_string(),
        }
    }

    /// Use a specific git executable.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for GitCli {
    fn default() -> Self {
        Self::new()
    }
}

impl RepositoryFetcher for GitCli {
    fn fetch(&self, url: &str, destination: &Path) -> Result<(), FetchError> {
        tracing::info!(url, path = %destination.display(), "Cloning repository");

        // `--` keeps a URL starting with `-` from being read as an option.
        let output = Command::new(&self.program)
            .arg("clone")
            .arg("--")
            .arg(url)
            .arg(destination)
            .output()
            .map_err(FetchError::Launch)?;

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if !output.status.success() {
            tracing::debug!(git_output = %stderr, status = %output.status, "git clone failed");
            return Err(FetchError::Clone {
                url: url.to_string(),
                status: output.status.to_string(),
                stderr,
            });
        }

        if !stderr.is_empty() {
            tracing::debug!(git_output = %stderr, "git clone output");
        }
        tracing::info!(url, "Clone finished");
        Ok(())
    }
}
