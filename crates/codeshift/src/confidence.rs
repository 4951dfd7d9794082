//! Heuristic confidence scoring for converted output.
//!
//! The score blends three signals:
//!
//! - structure preservation (40%): non-blank line count ratio
//! - syntactic validity (30%): bracket balance, then statement terminators
//! - completion (30%): share of source lines converted
//!
//! and is then scaled down by 15% per unsupported construct, at most 50%.
//!
//! The bracket scan looks at every character, including the contents of
//! string literals and comments. A bracket inside a literal can therefore
//! mark balanced code as unbalanced.

const STRUCTURE_WEIGHT: f64 = 0.4;
const SYNTAX_WEIGHT: f64 = 0.3;
const COMPLETION_WEIGHT: f64 = 0.3;
const PENALTY_PER_UNSUPPORTED: f64 = 0.15;
const MAX_PENALTY: f64 = 0.5;

/// Inputs to [`calculate`].
#[derive(Debug, Clone, Copy)]
pub struct ConfidenceInputs<'a> {
    pub original: &'a str,
    pub converted: &'a str,
    pub lines_converted: usize,
    pub total_lines: usize,
    pub unsupported_count: usize,
}

/// Compute a confidence in `[0, 1]`.
pub fn calculate(inputs: ConfidenceInputs<'_>) -> f64 {
    let original_lines = non_blank_lines(inputs.original);
    let converted_lines = non_blank_lines(inputs.converted);

    let structure = structure_score(original_lines, converted_lines);
    let syntax = syntax_score(inputs.converted);
    let completion = if inputs.total_lines > 0 {
        (inputs.lines_converted as f64 / inputs.total_lines as f64).min(1.0)
    } else if inputs.unsupported_count == 0 {
        1.0
    } else {
        0.5
    };

    let penalty = (inputs.unsupported_count as f64 * PENALTY_PER_UNSUPPORTED).min(MAX_PENALTY);
    let confidence = (structure * STRUCTURE_WEIGHT
        + syntax * SYNTAX_WEIGHT
        + completion * COMPLETION_WEIGHT)
        * (1.0 - penalty);

    confidence.clamp(0.0, 1.0)
}

fn non_blank_lines(text: &str) -> usize {
    text.lines().filter(|l| !l.trim().is_empty()).count()
}

fn structure_score(original: usize, converted: usize) -> f64 {
    if original == 0 {
        return 0.5;
    }
    // Brace targets grow by one line per closed block, so allow some slack.
    let ratio = converted as f64 / original as f64;
    if (0.7..=1.5).contains(&ratio) {
        0.95
    } else if (0.5..=2.0).contains(&ratio) {
        0.75
    } else {
        0.5
    }
}

fn syntax_score(code: &str) -> f64 {
    if code.trim().is_empty() {
        return 0.0;
    }
    if brackets_balanced(code) {
        1.0
    } else {
        0.5 + terminator_consistency(code) * 0.2
    }
}

/// Stack scan over `()[]{}`. Literal and comment contents are not skipped.
pub fn brackets_balanced(code: &str) -> bool {
    let mut stack = Vec::new();
    for c in code.chars() {
        match c {
            '(' | '[' | '{' => stack.push(c),
            ')' | ']' | '}' => {
                let expected = match c {
                    ')' => '(',
                    ']' => '[',
                    _ => '{',
                };
                if stack.pop() != Some(expected) {
                    return false;
                }
            }
            _ => {}
        }
    }
    stack.is_empty()
}

fn terminator_consistency(code: &str) -> f64 {
    let lines: Vec<&str> = code
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    if lines.is_empty() {
        return 0.5;
    }
    let terminated = lines.iter().filter(|l| l.ends_with(';')).count();
    let ratio = terminated as f64 / lines.len() as f64;
    if (0.8..=1.0).contains(&ratio) || ratio == 0.0 {
        1.0
    } else {
        0.7
    }
}
