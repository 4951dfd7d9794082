//! Grammar identifiers and their surface properties.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How a grammar delimits blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockStyle {
    /// Blocks are introduced by a trailing `:` and delimited by indentation.
    Indentation,
    /// Blocks are delimited by `{` and `}`.
    Braces,
}

/// A grammar known to codeshift.
///
/// `Java` is recognised by the language identifier but has no registered
/// conversion pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Grammar {
    Python,
    JavaScript,
    Java,
}

impl Grammar {
    pub const ALL: [Grammar; 3] = [Grammar::Python, Grammar::JavaScript, Grammar::Java];

    pub fn id(&self) -> &'static str {
        match self {
            Grammar::Python => "python",
            Grammar::JavaScript => "javascript",
            Grammar::Java => "java",
        }
    }

    /// Parse a grammar id. Accepts the canonical id and common short forms,
    /// case-insensitively.
    pub fn from_id(id: &str) -> Option<Self> {
        match id.trim().to_ascii_lowercase().as_str() {
            "python" | "py" => Some(Grammar::Python),
            "javascript" | "js" => Some(Grammar::JavaScript),
            "java" => Some(Grammar::Java),
            _ => None,
        }
    }

    /// Guess a grammar from a file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "py" | "pyw" => Some(Grammar::Python),
            "js" | "mjs" | "cjs" | "jsx" => Some(Grammar::JavaScript),
            "java" => Some(Grammar::Java),
            _ => None,
        }
    }

    pub fn block_style(&self) -> BlockStyle {
        match self {
            Grammar::Python => BlockStyle::Indentation,
            Grammar::JavaScript | Grammar::Java => BlockStyle::Braces,
        }
    }

    /// Whether blocks in this grammar are closed by an explicit delimiter.
    pub fn uses_delimiters(&self) -> bool {
        self.block_style() == BlockStyle::Braces
    }

    /// Spaces per nesting level when emitting this grammar.
    pub fn indent_width(&self) -> usize {
        match self {
            Grammar::Python | Grammar::Java => 4,
            Grammar::JavaScript => 2,
        }
    }

    /// Line comment marker.
    pub fn comment_prefix(&self) -> &'static str {
        match self {
            Grammar::Python => "#",
            Grammar::JavaScript | Grammar::Java => "//",
        }
    }

    /// Leading whitespace for `depth` nesting levels in this grammar.
    pub fn indent(&self, depth: usize) -> String {
        " ".repeat(depth * self.indent_width())
    }
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl std::str::FromStr for Grammar {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Grammar::from_id(s).ok_or_else(|| format!("unknown grammar: {s}"))
    }
}

/// An ordered (source, target) grammar pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct GrammarPair {
    pub source: Grammar,
    pub target: Grammar,
}

impl GrammarPair {
    pub const fn new(source: Grammar, target: Grammar) -> Self {
        Self { source, target }
    }
}

impl fmt::Display for GrammarPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}→{}", self.source, self.target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_id_aliases() {
        assert_eq!(Grammar::from_id("Python"), Some(Grammar::Python));
        assert_eq!(Grammar::from_id("js"), Some(Grammar::JavaScript));
        assert_eq!(Grammar::from_id(" java "), Some(Grammar::Java));
        assert_eq!(Grammar::from_id("ruby"), None);
    }

    #[test]
    fn test_indent() {
        assert_eq!(Grammar::JavaScript.indent(2), "    ");
        assert_eq!(Grammar::Python.indent(1), "    ");
        assert_eq!(Grammar::Python.indent(0), "");
    }

    #[test]
    fn test_pair_display() {
        let pair = GrammarPair::new(Grammar::Python, Grammar::JavaScript);
        assert_eq!(pair.to_string(), "python→javascript");
    }
}
