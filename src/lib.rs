//! repoflat - Flatten a git repository into one text file for LLMs.
//!
//! repoflat clones a repository, walks it with gitignore-style rules,
//! keeps text-like files by extension and line count, optionally
//! compacts their whitespace, and concatenates them into a single
//! document annotated with per-file size and token counts.
//!
//! # Quick Start
//!
//! ```no_run
//! use repoflat::builder::Flattener;
//!
//! let flattened = Flattener::new()
//!     .minify(true)
//!     .flatten_dir("./my-project")
//!     .unwrap();
//!
//! println!("Included {} files", flattened.included.len());
//! println!("Total tokens: {}", flattened.total_tokens());
//! ```
//!
//! # Modules
//!
//! - [`matcher`] - Ignore rules (repository `.gitignore`, built-ins, caller patterns)
//! - [`filter`] - Extension allow-list
//! - [`compact`] - Whitespace compaction
//! - [`tokens`] - Size and token accounting
//! - [`walker`] - Depth-first traversal producing the document
//! - [`output`] - Block framing, naming and summaries
//! - [`fetch`] - Cloning repositories
//! - [`builder`] - Fluent API tying it together

pub mod tokens;
pub mod filter;
pub mod compact;
pub mod errors;
pub mod matcher;
pub mod walker;
pub mod output;
pub mod fetch;
pub mod builder;

// Re-export key types at crate root for convenience
pub use builder::Flattener;
pub use compact::Compaction;
pub use errors::RepoflatError;
pub use fetch::{FetchError, GitCli, RepositoryFetcher};
pub use matcher::{IgnoreMatcher, MatcherError};
pub use output::{output_file_name, OutputError, Summary};
pub use tokens::{count_tokens, Accounting, Encoding, TokenCounter};
pub use walker::{ExcludedFile, Flattened, IncludedFile, WalkError};
