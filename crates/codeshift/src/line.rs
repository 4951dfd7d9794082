//! Classified source lines and the outcome of transforming one.

use serde::Serialize;
use std::fmt;

/// Syntactic category of a source line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConstructKind {
    Comment,
    OutputStatement,
    VariableBinding,
    ConditionalIf,
    ConditionalElif,
    ConditionalElse,
    LoopFor,
    LoopWhile,
    FunctionDefinition,
    ExceptionTry,
    ExceptionHandler,
    MethodCall,
    SequenceTransform,
    /// Anything no rule bucket claimed.
    Statement,
}

impl ConstructKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConstructKind::Comment => "comment",
            ConstructKind::OutputStatement => "output-statement",
            ConstructKind::VariableBinding => "variable-binding",
            ConstructKind::ConditionalIf => "conditional-if",
            ConstructKind::ConditionalElif => "conditional-elif",
            ConstructKind::ConditionalElse => "conditional-else",
            ConstructKind::LoopFor => "loop-for",
            ConstructKind::LoopWhile => "loop-while",
            ConstructKind::FunctionDefinition => "function-definition",
            ConstructKind::ExceptionTry => "exception-try",
            ConstructKind::ExceptionHandler => "exception-handler",
            ConstructKind::MethodCall => "method-call",
            ConstructKind::SequenceTransform => "sequence-transform",
            ConstructKind::Statement => "statement",
        }
    }
}

impl fmt::Display for ConstructKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How much restructuring a conversion needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(into = "u8")]
pub enum ConversionLevel {
    /// Token and call replacements.
    Simple = 1,
    /// Block headers (conditions, functions, handlers).
    Structural = 2,
    /// Loops and sequence transformations.
    Complex = 3,
}

impl From<ConversionLevel> for u8 {
    fn from(level: ConversionLevel) -> u8 {
        level as u8
    }
}

/// One non-blank line of source after classification.
#[derive(Debug, Clone)]
pub struct SourceLine {
    pub raw: String,
    /// 1-based.
    pub number: usize,
    /// Leading whitespace width in columns.
    pub width: usize,
    /// Indentation depth in source units.
    pub depth: usize,
    pub kind: ConstructKind,
    /// Trimmed code, with any trailing comment split off.
    pub content: String,
    /// Trailing comment text after the marker, if the line had one.
    pub trailing_comment: Option<String>,
    pub opens_block: bool,
    /// Number of open blocks when the line was classified.
    pub block_depth: usize,
}

/// Result of applying a rule to one line.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformOutcome {
    pub success: bool,
    /// Converted text without indentation.
    pub text: Option<String>,
    pub level: ConversionLevel,
    pub warning: Option<String>,
}

impl TransformOutcome {
    pub fn converted(text: impl Into<String>, level: ConversionLevel) -> Self {
        Self {
            success: true,
            text: Some(text.into()),
            level,
            warning: None,
        }
    }

    /// The rule does not fit this line; the pipeline falls back.
    pub fn failed(warning: Option<String>) -> Self {
        Self {
            success: false,
            text: None,
            level: ConversionLevel::Simple,
            warning,
        }
    }
}

/// Walk `text` and hand each run of code outside string literals to `f`.
///
/// Literals are delimited by `'`, `"` or `` ` `` and honour backslash escapes.
/// An unterminated literal runs to the end of the line.
pub fn map_code(text: &str, mut f: impl FnMut(&str) -> String) -> String {
    let mut out = String::with_capacity(text.len());
    let mut code_start = 0;
    let mut chars = text.char_indices();

    while let Some((i, c)) = chars.next() {
        if !matches!(c, '\'' | '"' | '`') {
            continue;
        }
        out.push_str(&f(&text[code_start..i]));
        let mut end = text.len();
        let mut escaped = false;
        for (j, d) in chars.by_ref() {
            if escaped {
                escaped = false;
            } else if d == '\\' {
                escaped = true;
            } else if d == c {
                end = j + d.len_utf8();
                break;
            }
        }
        out.push_str(&text[i..end]);
        code_start = end;
    }
    out.push_str(&f(&text[code_start..]));
    out
}

/// Byte offset of `marker` in `text` outside string literals.
pub fn find_outside_literals(text: &str, marker: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (i, c) in text.char_indices() {
        match quote {
            Some(q) => {
                if escaped {
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if c == q {
                    quote = None;
                }
            }
            None => {
                if matches!(c, '\'' | '"' | '`') {
                    quote = Some(c);
                } else if text[i..].starts_with(marker) {
                    return Some(i);
                }
            }
        }
    }
    None
}

/// Split `code  <marker> comment` into the code and the comment text.
///
/// Lines that start with the marker are left whole.
pub fn split_trailing_comment<'a>(text: &'a str, marker: &str) -> (&'a str, Option<&'a str>) {
    match find_outside_literals(text, marker) {
        Some(0) | None => (text, None),
        Some(i) => (text[..i].trim_end(), Some(&text[i + marker.len()..])),
    }
}

/// Whether brackets in `text`, ignoring string literals, are balanced.
pub fn balanced_outside_literals(text: &str) -> bool {
    let mut depth: i64 = 0;
    map_code(text, |code| {
        for c in code.chars() {
            match c {
                '(' | '[' | '{' => depth += 1,
                ')' | ']' | '}' => depth -= 1,
                _ => {}
            }
        }
        String::new()
    });
    depth == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_code_skips_literals() {
        let out = map_code(r#"x == "a == b" and y"#, |code| code.replace("==", "==="));
        assert_eq!(out, r#"x === "a == b" and y"#);
    }

    #[test]
    fn test_map_code_escapes() {
        let out = map_code(r#"f("it\"s None") or None"#, |code| code.replace("None", "null"));
        assert_eq!(out, r#"f("it\"s None") or null"#);
    }

    #[test]
    fn test_split_trailing_comment() {
        assert_eq!(
            split_trailing_comment("x = 5  # five", "#"),
            ("x = 5", Some(" five"))
        );
        assert_eq!(
            split_trailing_comment("url = 'http://a'", "//"),
            ("url = 'http://a'", None)
        );
        assert_eq!(split_trailing_comment("# whole", "#"), ("# whole", None));
    }

    #[test]
    fn test_balanced_outside_literals() {
        assert!(balanced_outside_literals("f(a, \"(\")"));
        assert!(!balanced_outside_literals("a && (b"));
    }

    #[test]
    fn test_level_ordering() {
        assert!(ConversionLevel::Complex > ConversionLevel::Structural);
        assert_eq!(u8::from(ConversionLevel::Structural), 2);
    }
}
