//! Error types for repoflat.

use crate::fetch::FetchError;
use crate::matcher::MatcherError;
use crate::output::OutputError;
use crate::walker::WalkError;

/// Top-level error type for repoflat operations.
#[derive(Debug, thiserror::Error)]
pub enum RepoflatError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("walk error: {0}")]
    Walk(#[from] WalkError),

    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("ignore rules: {0}")]
    Matcher(#[from] MatcherError),

    #[error("output error: {0}")]
    Output(#[from] OutputError),
}

/// Map an error to its exit code.
pub fn exit_code(error: &RepoflatError) -> i32 {
    match error {
        RepoflatError::Io(_) => 1,
        RepoflatError::Output(_) => 1,
        RepoflatError::Walk(_) => 2,
        RepoflatError::Fetch(_) => 3,
        RepoflatError::Matcher(_) => 4,
    }
}
