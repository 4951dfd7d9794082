//! Expression-level token translation shared by the rules and the generic
//! fallback.
//!
//! Everything here works on code outside string literals (see
//! [`map_code`]); literals pass through untouched apart from the
//! f-string/template conversion, which rewrites the literal itself.

use crate::line::{balanced_outside_literals, map_code};
use regex::{Captures, Regex};
use std::sync::LazyLock;

static PY_TOKENS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\bis\s+not\b|\bnot\s+in\b|\bis\b|\band\b|\bor\b|\bnot\b\s*|\bTrue\b|\bFalse\b|\bNone\b|\bself\b|\bsuper\(\)\.(?:__init__\()?|===|!==|==|!=",
    )
    .unwrap()
});

static JS_TOKENS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"===|!==|\s*&&\s*|\s*\|\|\s*|!=|!\s*|\btrue\b|\bfalse\b|\bnull\b|\bundefined\b|\bthis\b|\bsuper\s*[(.]|\bnew\s+",
    )
    .unwrap()
});

static F_STRING_DOUBLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\bf"([^"]*)""#).unwrap());
static F_STRING_SINGLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bf'([^']*)'").unwrap());
static TEMPLATE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`([^`]*)`").unwrap());

/// Python operators and literals to their javascript spelling.
pub fn python_tokens(code: &str) -> String {
    PY_TOKENS
        .replace_all(code, |caps: &Captures| {
            let token = &caps[0];
            match token.split_whitespace().collect::<Vec<_>>().as_slice() {
                ["is", "not"] => "!==".to_string(),
                ["not", "in"] => token.to_string(),
                ["is"] => "===".to_string(),
                ["and"] => "&&".to_string(),
                ["or"] => "||".to_string(),
                ["not"] => "!".to_string(),
                ["True"] => "true".to_string(),
                ["False"] => "false".to_string(),
                ["None"] => "null".to_string(),
                ["self"] => "this".to_string(),
                ["super()."] => "super.".to_string(),
                ["super().__init__("] => "super(".to_string(),
                ["=="] => "===".to_string(),
                ["!="] => "!==".to_string(),
                _ => token.to_string(),
            }
        })
        .into_owned()
}

/// Javascript operators and literals to their python spelling.
pub fn javascript_tokens(code: &str) -> String {
    JS_TOKENS
        .replace_all(code, |caps: &Captures| {
            let token = caps[0].trim();
            match token {
                "===" => "==".to_string(),
                "!==" | "!=" => "!=".to_string(),
                "&&" => " and ".to_string(),
                "||" => " or ".to_string(),
                "!" => "not ".to_string(),
                "true" => "True".to_string(),
                "false" => "False".to_string(),
                "null" | "undefined" => "None".to_string(),
                "this" => "self".to_string(),
                "new" => String::new(),
                t if t.starts_with("super") && t.ends_with('(') => "super().__init__(".to_string(),
                t if t.starts_with("super") => "super().".to_string(),
                _ => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// `f"Hi {name}"` to `` `Hi ${name}` ``.
pub fn fstring_to_template(text: &str) -> String {
    let convert = |caps: &Captures| {
        let mut out = String::from("`");
        let mut chars = caps[1].chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    out.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    out.push('}');
                }
                '{' => {
                    let inner: String = chars.by_ref().take_while(|&d| d != '}').collect();
                    out.push_str("${");
                    out.push_str(&python_tokens(&inner));
                    out.push('}');
                }
                '`' => out.push_str("\\`"),
                _ => out.push(c),
            }
        }
        out.push('`');
        out
    };
    let text = F_STRING_DOUBLE.replace_all(text, convert);
    F_STRING_SINGLE.replace_all(&text, convert).into_owned()
}

/// `` `Hi ${name}` `` to `f"Hi {name}"`; templates without placeholders
/// become plain strings.
pub fn template_to_fstring(text: &str) -> String {
    TEMPLATE
        .replace_all(text, |caps: &Captures| {
            let body = &caps[1];
            let quote = if body.contains('"') { '\'' } else { '"' };
            if !body.contains("${") {
                return format!("{quote}{body}{quote}");
            }
            let escape = |text: &str| text.replace('{', "{{").replace('}', "}}");
            let mut out = String::new();
            let mut rest = body;
            while let Some(start) = rest.find("${") {
                out.push_str(&escape(&rest[..start]));
                let after = &rest[start + 2..];
                let end = after.find('}').unwrap_or(after.len());
                out.push('{');
                out.push_str(javascript_tokens(&after[..end]).trim());
                out.push('}');
                rest = after.get(end + 1..).unwrap_or("");
            }
            out.push_str(&escape(rest));
            format!("f{quote}{out}{quote}")
        })
        .into_owned()
}

/// Translate a python expression: f-strings, then tokens outside literals.
pub fn python_expression(text: &str) -> String {
    map_code(&fstring_to_template(text), python_tokens)
}

/// Translate a javascript expression: templates, then tokens outside literals.
pub fn javascript_expression(text: &str) -> String {
    map_code(&template_to_fstring(text), javascript_tokens)
}

/// Split on `sep` at bracket depth zero, outside string literals.
pub fn split_top_level(text: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut start = 0;

    for (i, c) in text.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' | '`' => quote = Some(c),
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth -= 1,
            c if c == sep && depth == 0 => {
                parts.push(text[start..i].trim());
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    let last = text[start..].trim();
    if !last.is_empty() || !parts.is_empty() {
        parts.push(last);
    }
    parts
}

/// UPPER_CASE names are treated as constants.
pub fn is_constant_name(name: &str) -> bool {
    name.chars().any(|c| c.is_ascii_uppercase())
        && name
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

/// Whether a javascript statement should end with `;`.
pub fn needs_terminator(text: &str) -> bool {
    let Some(last) = text.chars().last() else {
        return false;
    };
    !matches!(last, '{' | '(' | '[' | ',' | ';' | ':' | '\\')
        && !text.starts_with("//")
        && balanced_outside_literals(text)
}

/// Append `;` to a javascript statement that is complete on its line.
///
/// A statement that leaves a bracket open continues on the next line and
/// takes no terminator.
pub fn terminate(statement: String) -> String {
    if needs_terminator(&statement) {
        statement + ";"
    } else {
        statement
    }
}

/// Token-level fallback for an indentation-delimited line.
///
/// A block header keeps the output balanced by opening a brace.
pub fn generic_javascript(content: &str, opens_block: bool) -> String {
    let text = python_expression(content);
    if opens_block && let Some(head) = text.strip_suffix(':') {
        return format!("{} {{", head.trim_end());
    }
    terminate(text)
}

/// Token-level fallback for a brace-delimited line.
pub fn generic_python(content: &str) -> String {
    let text = content.trim_start_matches('}').trim_start();
    let text = javascript_expression(text);
    let text = text.trim_end().trim_end_matches(';').trim_end();
    match text.strip_suffix('{') {
        Some(head) => format!("{}:", head.trim_end()),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_python_tokens() {
        assert_eq!(
            python_expression("x == None and not done"),
            "x === null && !done"
        );
        assert_eq!(python_expression("a is not b or c != d"), "a !== b || c !== d");
        assert_eq!(python_expression("self.count"), "this.count");
    }

    #[test]
    fn test_python_tokens_skip_literals() {
        assert_eq!(
            python_expression(r#"flag == True or name == "None""#),
            r#"flag === true || name === "None""#
        );
    }

    #[test]
    fn test_javascript_tokens() {
        assert_eq!(
            javascript_expression("x === null && !done"),
            "x == None and not done"
        );
        assert_eq!(javascript_expression("a !== b || c"), "a != b or c");
        assert_eq!(javascript_expression("new Error(this.msg)"), "Error(self.msg)");
    }

    #[test]
    fn test_super_calls() {
        assert_eq!(javascript_expression("super(name)"), "super().__init__(name)");
        assert_eq!(javascript_expression("super.speak()"), "super().speak()");
        assert_eq!(python_expression("super().__init__(name)"), "super(name)");
        assert_eq!(python_expression("super().speak()"), "super.speak()");
        assert_eq!(javascript_expression("superb(x)"), "superb(x)");
    }

    #[test]
    fn test_fstring_round() {
        assert_eq!(fstring_to_template(r#"f"Hello {name}!""#), "`Hello ${name}!`");
        assert_eq!(fstring_to_template("f'{a} and {{b}}'"), "`${a} and {b}`");
        assert_eq!(template_to_fstring("`Hello ${name}!`"), r#"f"Hello {name}!""#);
        assert_eq!(template_to_fstring("`plain`"), r#""plain""#);
        assert_eq!(fstring_to_template(r#"f"{self.name} ok""#), "`${this.name} ok`");
        assert_eq!(template_to_fstring("`${this.name} {x}`"), r#"f"{self.name} {{x}}""#);
    }

    #[test]
    fn test_split_top_level() {
        assert_eq!(
            split_top_level("a, f(b, c), 'x, y'", ','),
            vec!["a", "f(b, c)", "'x, y'"]
        );
        assert!(split_top_level("", ',').is_empty());
    }

    #[test]
    fn test_constant_names() {
        assert!(is_constant_name("MAX_SIZE"));
        assert!(is_constant_name("V2"));
        assert!(!is_constant_name("count"));
        assert!(!is_constant_name("_"));
    }

    #[test]
    fn test_generic_fallbacks() {
        assert_eq!(generic_javascript("foo(x)", false), "foo(x);");
        assert_eq!(generic_javascript("match value:", true), "match value {");
        assert_eq!(generic_javascript("'a': 1,", false), "'a': 1,");
        assert_eq!(generic_python("foo(x);"), "foo(x)");
        assert_eq!(generic_python("} while (x) {"), "while (x):");
    }
}
