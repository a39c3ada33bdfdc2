//! Extension allow-list.
//!
//! Only files whose final extension segment appears in
//! [`ALLOWED_EXTENSIONS`] are considered for flattening. Everything
//! else is skipped without producing a record.

use std::path::Path;

/// Recognized text-like extensions, lowercase and dot-prefixed.
pub const ALLOWED_EXTENSIONS: &[&str] = &[
    // JavaScript and TypeScript
    ".js", ".jsx", ".ts", ".tsx", ".mjs", ".cjs",
    // Web
    ".html", ".css", ".scss", ".sass", ".less",
    // Python
    ".py", ".pyw", ".pyx", ".pxd", ".pyi",
    // Ruby
    ".rb", ".rake", ".gemspec",
    // PHP
    ".php", ".phtml", ".php3", ".php4", ".php5", ".phps",
    // C and C++
    ".c", ".cpp", ".h", ".hpp", ".cc", ".cxx",
    // Java
    ".java", ".class", ".jar",
    // C#
    ".cs", ".csx",
    // Go
    ".go",
    // Swift
    ".swift",
    // Kotlin
    ".kt", ".kts",
    // Rust
    ".rs", ".rlib",
    // Data and config
    ".json", ".xml", ".yml", ".yaml", ".toml", ".ini",
    // Documentation
    ".md", ".markdown", ".rst", ".txt",
];

/// Check whether an extension is on the allow-list.
///
/// Expects the dot-prefixed form produced by [`extension_of`]. The
/// comparison is case-insensitive.
///
/// # Examples
///
/// ```
/// use repoflat::filter::is_allowed;
///
/// assert!(is_allowed(".rs"));
/// assert!(is_allowed(".MD"));
/// assert!(!is_allowed(".png"));
/// ```
pub fn is_allowed(extension: &str) -> bool {
    let extension = extension.to_ascii_lowercase();
    ALLOWED_EXTENSIONS.contains(&extension.as_str())
}

/// Lowercase, dot-prefixed final extension of a path.
///
/// Only the last segment counts: `bundle.min.js` yields `.js` and
/// `archive.tar.gz` yields `.gz`. Dotfiles such as `.bashrc` and
/// extensionless names such as `Makefile` yield `None`.
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
        .map(|e| format!(".{}", e.to_lowercase()))
}

/// Convenience check combining [`extension_of`] and [`is_allowed`].
pub fn passes_extension_filter(path: &Path) -> Option<String> {
    extension_of(path).filter(|ext| is_allowed(ext))
}
