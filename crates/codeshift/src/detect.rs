//! Weighted-pattern language identification.
//!
//! Each candidate grammar has a table of signature patterns with weights.
//! A grammar's score is the sum of `weight * min(matches, 3)` over its
//! table, so a token repeated on every line cannot dominate. Patterns are
//! matched case-insensitively in multi-line mode.
//!
//! Candidates are scored in a fixed order (python, javascript, java) and
//! sorted stably, so on equal scores the earlier candidate wins.

use crate::grammar::Grammar;
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

/// Per-pattern match count above which matches stop adding score.
const MATCH_CAP: usize = 3;
/// Score that maps to full confidence.
const FULL_SCORE: f64 = 10.0;
/// Matched patterns named in a justification.
const JUSTIFICATION_PATTERNS: usize = 4;
/// Longest fallback rendering of a raw pattern.
const RENDERED_PATTERN_LEN: usize = 30;

/// One weighted idiom of a grammar.
struct Signature {
    pattern: &'static str,
    weight: f64,
}

const fn sig(pattern: &'static str, weight: f64) -> Signature {
    Signature { pattern, weight }
}

const PYTHON: &[Signature] = &[
    sig(r"\bdef\s+\w+\s*\(", 1.0),
    sig(r"\bimport\s+", 0.8),
    sig(r"\bfrom\s+.*\s+import\s+", 0.9),
    sig(r"@\w+", 0.7),
    sig(r"\bprint\s*\(", 0.6),
    sig(r"\belif\s+", 0.95),
    sig(r#"__name__\s*==\s*['"]__main__['"]"#, 1.0),
    sig(r":\s*$", 0.4),
    sig(r"^\s{4,}", 0.3),
    sig(r"\bclass\s+", 0.7),
    sig(r"\blambda\s+", 0.8),
    sig(r"\btry\s*:", 0.6),
    sig(r"\bexcept\s+", 0.85),
    sig(r"\bfinally\s*:", 0.7),
    sig(r"\bwith\s+", 0.7),
    sig(r"\bas\s+\w+:", 0.6),
    sig(r"\bfor\s+\w+\s+in\s+", 0.9),
    sig(r"\bwhile\s+", 0.6),
    sig(r"\bpass\b", 0.9),
    sig(r"\bNone\b", 0.4),
    sig(r"\bTrue\b|\bFalse\b", 0.3),
];

const JAVASCRIPT: &[Signature] = &[
    sig(r"console\.log\s*\(", 1.0),
    sig(r"\bconst\s+", 0.95),
    sig(r"\blet\s+", 0.95),
    sig(r"\bvar\s+", 0.7),
    sig(r"\bfunction\s+\w+\s*\(", 0.9),
    sig(r"=>", 0.95),
    sig(r"\basync\s+", 0.8),
    sig(r"\bawait\s+", 0.8),
    sig(r"\bimport\s+", 0.6),
    sig(r"\bexport\s+", 0.8),
    sig(r"\{.*\}", 0.2),
    sig(r"this\.", 0.7),
    sig(r"\bnew\s+", 0.6),
    sig(r"\bfunction\s*\*", 0.8),
    sig(r"\bclass\s+", 0.7),
    sig(r"\bthrow\s+", 0.7),
    sig(r"\bcatch\s*\(", 0.85),
    sig(r"\bfinally\s*\{", 0.7),
    sig(r"\btry\s*\{", 0.7),
    sig(r"\.map\s*\(", 0.7),
    sig(r"\.filter\s*\(", 0.7),
];

const JAVA: &[Signature] = &[
    sig(r"System\.out\.println\s*\(", 1.0),
    sig(r"\bpublic\s+static\s+void\s+main", 1.0),
    sig(r"\bpublic\s+class\s+", 0.95),
    sig(r"\bprivate\s+", 0.8),
    sig(r"\bprotected\s+", 0.8),
    sig(r"\bnew\s+\w+\s*\(", 0.7),
    sig(r"\bimport\s+java", 0.95),
    sig(r"\bint\s+", 0.6),
    sig(r"\bString\s+", 0.6),
    sig(r"\btry\s*\{", 0.7),
    sig(r"\bcatch\s*\(", 0.85),
    sig(r"\bthrows\s+", 0.85),
    sig(r"\bboolean\s+", 0.7),
    sig(r"\bvoid\s+", 0.7),
    sig(r"\bfor\s*\(", 0.5),
    sig(r"\bwhile\s*\(", 0.3),
    sig(r"@Override", 0.9),
    sig(r"\binterface\s+", 0.8),
    sig(r"\benum\s+", 0.8),
];

/// Readable names for the patterns that have one.
fn describe(pattern: &str) -> Option<&'static str> {
    Some(match pattern {
        r"\bdef\s+\w+\s*\(" => "function definition (def)",
        r"console\.log\s*\(" => "console.log",
        r"\bconst\s+" => "const declaration",
        r"=>" => "arrow function",
        r"\bclass\s+" => "class definition",
        r"\bimport\s+" => "import statement",
        r"\bpublic\s+static\s+void\s+main" => "main method",
        r"System\.out\.println\s*\(" => "println statement",
        _ => return None,
    })
}

/// Shortened pattern source for patterns without a description.
fn render_pattern(pattern: &str) -> String {
    pattern
        .replace(r"\b", "")
        .replace(r"\s+", " ")
        .replace(r"\s*", "")
        .chars()
        .take(RENDERED_PATTERN_LEN)
        .collect()
}

struct Compiled {
    regex: Regex,
    signature: &'static Signature,
}

struct Candidate {
    grammar: Grammar,
    signatures: Vec<Compiled>,
}

static CANDIDATES: LazyLock<Vec<Candidate>> = LazyLock::new(|| {
    [
        (Grammar::Python, PYTHON),
        (Grammar::JavaScript, JAVASCRIPT),
        (Grammar::Java, JAVA),
    ]
    .into_iter()
    .map(|(grammar, table)| Candidate {
        grammar,
        signatures: table
            .iter()
            .map(|signature| Compiled {
                regex: Regex::new(&format!("(?mi){}", signature.pattern)).unwrap(),
                signature,
            })
            .collect(),
    })
    .collect()
});

/// A grammar that also scored, ranked below the winner.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alternative {
    pub language: String,
    pub confidence: f64,
}

/// Outcome of [`LanguageIdentifier::detect`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionResult {
    /// Grammar id, or `"unknown"`.
    pub language: String,
    pub confidence: f64,
    pub justification: String,
    pub alternatives: Vec<Alternative>,
}

impl DetectionResult {
    /// The detected grammar, if any.
    pub fn grammar(&self) -> Option<Grammar> {
        Grammar::from_id(&self.language)
    }
}

/// Scores snippets against the signature tables.
///
/// The tables are compiled once per process; identifiers are free to create
/// and share.
#[derive(Debug, Clone, Copy, Default)]
pub struct LanguageIdentifier;

impl LanguageIdentifier {
    pub fn new() -> Self {
        Self
    }

    /// Grammars this identifier can name.
    pub fn candidates(&self) -> impl Iterator<Item = Grammar> {
        CANDIDATES.iter().map(|c| c.grammar)
    }

    /// Raw score of `code` for one grammar. Zero for grammars without a
    /// table.
    pub fn score(&self, code: &str, grammar: Grammar) -> f64 {
        CANDIDATES
            .iter()
            .find(|c| c.grammar == grammar)
            .map_or(0.0, |c| score(c, code))
    }

    pub fn detect(&self, code: &str) -> DetectionResult {
        if code.trim().is_empty() {
            return DetectionResult {
                language: "unknown".to_string(),
                confidence: 0.0,
                justification: "No code provided".to_string(),
                alternatives: Vec::new(),
            };
        }

        let mut scored: Vec<(&Candidate, f64)> =
            CANDIDATES.iter().map(|c| (c, score(c, code))).collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        tracing::trace!(
            scores = ?scored.iter().map(|(c, s)| (c.grammar.id(), *s)).collect::<Vec<_>>(),
            "detect"
        );

        let (winner, top) = scored[0];
        let alternatives = scored[1..]
            .iter()
            .filter(|(_, s)| *s > 0.0)
            .map(|(c, s)| Alternative {
                language: c.grammar.id().to_string(),
                confidence: confidence(*s),
            })
            .collect();

        if top == 0.0 {
            return DetectionResult {
                language: "unknown".to_string(),
                confidence: 0.0,
                justification: "Could not detect language - no matching patterns found"
                    .to_string(),
                alternatives,
            };
        }

        DetectionResult {
            language: winner.grammar.id().to_string(),
            confidence: confidence(top),
            justification: justify(winner, code),
            alternatives,
        }
    }
}

fn score(candidate: &Candidate, code: &str) -> f64 {
    candidate
        .signatures
        .iter()
        .map(|c| c.signature.weight * c.regex.find_iter(code).take(MATCH_CAP).count() as f64)
        .sum()
}

fn confidence(score: f64) -> f64 {
    (score / FULL_SCORE).min(1.0)
}

fn justify(candidate: &Candidate, code: &str) -> String {
    let id = candidate.grammar.id();
    let found: Vec<String> = candidate
        .signatures
        .iter()
        .filter(|c| c.regex.is_match(code))
        .take(JUSTIFICATION_PATTERNS)
        .map(|c| match describe(c.signature.pattern) {
            Some(text) => text.to_string(),
            None => render_pattern(c.signature.pattern),
        })
        .collect();
    if found.is_empty() {
        format!("Detected as {id} (low confidence)")
    } else {
        format!("Found {id} patterns: {}", found.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_input() {
        let result = LanguageIdentifier::new().detect(" \n\t");
        assert_eq!(result.language, "unknown");
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.justification, "No code provided");
    }

    #[test]
    fn test_no_idioms_is_unknown() {
        let result = LanguageIdentifier::new().detect("12345 + 67890");
        assert_eq!(result.language, "unknown");
        assert_eq!(result.confidence, 0.0);
        assert!(result.alternatives.is_empty());
        assert!(result.grammar().is_none());
    }

    #[test]
    fn test_python() {
        let result = LanguageIdentifier::new().detect("def greet(name):\n    print(name)\n");
        assert_eq!(result.language, "python");
        assert!((result.confidence - 0.23).abs() < 1e-9);
        assert!(
            result
                .justification
                .starts_with("Found python patterns: function definition (def)")
        );
        assert!(result.alternatives.is_empty());
    }

    #[test]
    fn test_javascript() {
        let result = LanguageIdentifier::new().detect("const x = 5;\nconsole.log(x);");
        assert_eq!(result.grammar(), Some(Grammar::JavaScript));
        assert_eq!(
            result.justification,
            "Found javascript patterns: console.log, const declaration"
        );
    }

    #[test]
    fn test_java_with_alternatives() {
        let code = "public class Main {\n  public static void main(String[] args) {\n    System.out.println(\"hi\");\n  }\n}";
        let result = LanguageIdentifier::new().detect(code);
        assert_eq!(result.language, "java");
        let ranked: Vec<_> = result
            .alternatives
            .iter()
            .map(|a| a.language.as_str())
            .collect();
        assert_eq!(ranked, ["python", "javascript"]);
        assert!(result.alternatives[0].confidence > result.alternatives[1].confidence);
    }

    #[test]
    fn test_tie_goes_to_first_candidate() {
        let result = LanguageIdentifier::new().detect("class Foo");
        assert_eq!(result.language, "python");
        assert_eq!(result.alternatives[0].language, "javascript");
        assert_eq!(result.alternatives[0].confidence, result.confidence);
    }

    #[test]
    fn test_match_count_is_capped() {
        let code = "print(1)\n".repeat(5);
        let score = LanguageIdentifier::new().score(&code, Grammar::Python);
        assert!((score - 1.8).abs() < 1e-9, "score = {score}");
    }

    #[test]
    fn test_more_idioms_never_lower_score() {
        let id = LanguageIdentifier::new();
        let base = "x = 1\nif x:\n    pass\n";
        let more = format!("{base}elif x is None:\n    pass\n");
        assert!(id.score(&more, Grammar::Python) >= id.score(base, Grammar::Python));
    }

    #[test]
    fn test_render_pattern() {
        assert_eq!(render_pattern(r"\bexcept\s+"), "except ");
        assert_eq!(render_pattern(r"\bprint\s*\("), r"print\(");
        assert!(render_pattern(r#"__name__\s*==\s*['"]__main__['"]"#).chars().count() <= 30);
    }
}
