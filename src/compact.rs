//! Whitespace compaction for code-like content.
//!
//! Compaction collapses every run of whitespace (newlines included) into
//! a single space and trims the ends. It is lossy and only exists to cut
//! token counts. Documentation formats pass through untouched.

/// Extensions whose content is never compacted.
pub const DOCUMENTATION_EXTENSIONS: &[&str] = &[".md", ".markdown", ".txt", ".rst"];

/// Content transform applied to every accepted file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compaction {
    /// Content is emitted as read.
    #[default]
    Off,
    /// Collapse whitespace runs for non-documentation files.
    Whitespace,
}

impl Compaction {
    /// Build from a boolean `--minify` style flag.
    pub fn from_flag(enabled: bool) -> Self {
        if enabled {
            Compaction::Whitespace
        } else {
            Compaction::Off
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, Compaction::Whitespace)
    }

    /// Apply the transform to `content` of a file with the given
    /// lowercase, dot-prefixed `extension`.
    ///
    /// # Examples
    ///
    /// ```
    /// use repoflat::compact::Compaction;
    ///
    /// let code = "fn main() {\n    println!(\"hi\");\n}\n";
    /// assert_eq!(
    ///     Compaction::Whitespace.transform(code, ".rs"),
    ///     "fn main() { println!(\"hi\"); }"
    /// );
    /// assert_eq!(Compaction::Whitespace.transform("# Title\n\nBody\n", ".md"), "# Title\n\nBody\n");
    /// ```
    pub fn transform(&self, content: &str, extension: &str) -> String {
        match self {
            Compaction::Off => content.to_string(),
            Compaction::Whitespace if is_documentation(extension) => content.to_string(),
            Compaction::Whitespace => collapse_whitespace(content),
        }
    }
}

/// Whether an extension is exempt from compaction.
pub fn is_documentation(extension: &str) -> bool {
    DOCUMENTATION_EXTENSIONS.contains(&extension)
}

/// Unicode `White_Space` plus the byte order mark, minus NEXT LINE (U+0085).
fn is_collapsible(c: char) -> bool {
    match c {
        '\u{FEFF}' => true,
        '\u{0085}' => false,
        c => c.is_whitespace(),
    }
}

fn collapse_whitespace(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    for word in content.split(is_collapsible).filter(|w| !w.is_empty()) {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_off_is_identity() {
        let content = "a\n\n  b\t c\n";
        assert_eq!(Compaction::Off.transform(content, ".js"), content);
    }

    #[test]
    fn test_collapse_runs_and_trim() {
        let content = "\n\n  const x = 1;\r\n\tconst y =   2;\n\n";
        assert_eq!(
            Compaction::Whitespace.transform(content, ".js"),
            "const x = 1; const y = 2;"
        );
    }

    #[test]
    fn test_byte_order_mark_is_whitespace() {
        let content = "\u{FEFF}const a = 1;\u{FEFF}\nconst b = 2;\n";
        assert_eq!(
            Compaction::Whitespace.transform(content, ".ts"),
            "const a = 1; const b = 2;"
        );
    }

    #[test]
    fn test_next_line_is_kept() {
        assert_eq!(Compaction::Whitespace.transform("a\u{0085}b  c", ".js"), "a\u{0085}b c");
    }

    #[test]
    fn test_whitespace_only_becomes_empty() {
        assert_eq!(Compaction::Whitespace.transform(" \n\t\n ", ".py"), "");
    }

    #[test]
    fn test_idempotent() {
        let content = "def f(x):\n    return x  *  2\n\n\nprint(f(3))\n";
        let once = Compaction::Whitespace.transform(content, ".py");
        let twice = Compaction::Whitespace.transform(&once, ".py");
        assert_eq!(once, twice);
    }

    #[test]
    fn test_documentation_passthrough() {
        for ext in DOCUMENTATION_EXTENSIONS {
            let content = "# Heading\n\n- item   one\n- item two\n";
            assert_eq!(Compaction::Whitespace.transform(content, ext), content);
        }
    }

    #[test]
    fn test_from_flag() {
        assert_eq!(Compaction::from_flag(true), Compaction::Whitespace);
        assert_eq!(Compaction::from_flag(false), Compaction::Off);
        assert!(Compaction::Whitespace.is_enabled());
        assert!(!Compaction::default().is_enabled());
    }
}
