//! Rules for brace-delimited javascript to indentation-delimited python.

use super::expr::{generic_python, javascript_expression, split_top_level};
use super::{LineRule, RuleContext, RuleError, capture};
use crate::line::{ConstructKind, ConversionLevel, SourceLine, TransformOutcome, balanced_outside_literals};
use crate::methods::Direction;
use regex::Regex;
use std::sync::LazyLock;

/// Rules in classification priority order.
pub const RULES: &[Rule] = &[
    Rule::LineComment,
    Rule::BlockComment,
    Rule::ConsoleLog,
    Rule::ArrayChain,
    Rule::Arrow,
    Rule::ArrowBlock,
    Rule::ArrayDestructure,
    Rule::ObjectDestructure,
    Rule::Declaration,
    Rule::If,
    Rule::ElseIf,
    Rule::Else,
    Rule::CStyleLoop,
    Rule::ForOf,
    Rule::ForIn,
    Rule::OtherFor,
    Rule::While,
    Rule::Function,
    Rule::Constructor,
    Rule::Method,
    Rule::Try,
    Rule::Catch,
    Rule::Finally,
    Rule::MemberCall,
    Rule::ClassHeader,
    Rule::Return,
    Rule::Increment,
    Rule::Throw,
    Rule::UnsupportedKeyword,
    Rule::ExpressionStatement,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    LineComment,
    BlockComment,
    ConsoleLog,
    ArrayChain,
    Arrow,
    ArrowBlock,
    ArrayDestructure,
    ObjectDestructure,
    Declaration,
    If,
    ElseIf,
    Else,
    CStyleLoop,
    ForOf,
    ForIn,
    OtherFor,
    While,
    Function,
    Constructor,
    Method,
    Try,
    Catch,
    Finally,
    MemberCall,
    ClassHeader,
    Return,
    Increment,
    Throw,
    UnsupportedKeyword,
    ExpressionStatement,
}

macro_rules! pattern {
    ($name:ident, $re:expr) => {
        static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($re).unwrap());
    };
}

pattern!(LINE_COMMENT, r"^//(.*)$");
pattern!(BLOCK_COMMENT, r"^/\*+(.*?)\*+/$");
pattern!(
    CONSOLE_LOG,
    r"^console\.(?:log|info|warn|error|debug)\((.*)\);?$"
);
pattern!(
    ARRAY_CHAIN,
    r"^(?:(return)\s+|(?:const|let|var)\s+([A-Za-z_$][\w$]*)\s*=\s*|([A-Za-z_$][\w$.]*)\s*=\s*)?([A-Za-z_$][\w$.]*)\.(map|filter)\(\s*\(?([A-Za-z_$][\w$]*)\)?\s*=>\s*([^{].*?)\)(?:\.map\(\s*\(?([A-Za-z_$][\w$]*)\)?\s*=>\s*([^{].*?)\))?;?$"
);
pattern!(
    ARROW,
    r"^(?:const|let|var)\s+([A-Za-z_$][\w$]*)\s*=\s*(?:async\s+)?(\([^()]*\)|[A-Za-z_$][\w$]*)\s*=>\s*(.*?);?$"
);
pattern!(ARROW_BLOCK, r"=>\s*\{$");
pattern!(
    ARRAY_DESTRUCTURE,
    r"^(?:const|let|var)\s+\[(.+)\]\s*=\s*(.+?);?$"
);
pattern!(OBJECT_DESTRUCTURE, r"^(?:const|let|var)\s+\{");
pattern!(
    DECLARATION,
    r"^(?:const|let|var)\s+([A-Za-z_$][\w$]*)\s*(?:=\s*(.+?))?\s*;?$"
);
pattern!(IF_START, r"^if\s*\(");
pattern!(IF, r"^if\s*\((.*)\)\s*\{?$");
pattern!(ELSE_IF_START, r"^(?:\}\s*)?else\s+if\b");
pattern!(ELSE_IF, r"^(?:\}\s*)?else\s+if\s*\((.*)\)\s*\{?$");
pattern!(ELSE, r"^(?:\}\s*)?else\s*\{?$");
pattern!(
    C_STYLE_START,
    r"^for\s*\(\s*(?:let\s+|var\s+)?[A-Za-z_$][\w$]*\s*=[^=]"
);
pattern!(
    C_STYLE,
    r"^for\s*\(\s*(?:let\s+|var\s+)?([A-Za-z_$][\w$]*)\s*=\s*([^;]+?)\s*;\s*([A-Za-z_$][\w$]*)\s*(<=|<|>=|>)\s*([^;]+?)\s*;\s*([^;]*?)\s*\)\s*\{?$"
);
pattern!(
    UNIT_UPDATE,
    r"^(?:([A-Za-z_$][\w$]*)(\+\+|--)|(\+\+|--)([A-Za-z_$][\w$]*))$"
);
pattern!(STEP_UPDATE, r"^([A-Za-z_$][\w$]*)\s*(\+=|-=)\s*(.+)$");
pattern!(FOR_OF_START, r"^for\s*\(.*\sof\s");
pattern!(
    FOR_OF,
    r"^for\s*\(\s*(?:const\s+|let\s+|var\s+)?(.+?)\s+of\s+(.+)\)\s*\{?$"
);
pattern!(FOR_IN_START, r"^for\s*\(.*\sin\s");
pattern!(
    FOR_IN,
    r"^for\s*\(\s*(?:const\s+|let\s+|var\s+)?([A-Za-z_$][\w$]*)\s+in\s+(.+)\)\s*\{?$"
);
pattern!(FOR_START, r"^for\b");
pattern!(WHILE_START, r"^while\s*\(");
pattern!(WHILE, r"^while\s*\((.*)\)\s*\{?$");
pattern!(FUNCTION_START, r"^(?:async\s+)?function\b");
pattern!(
    FUNCTION,
    r"^(async\s+)?function\s*\*?\s*([A-Za-z_$][\w$]*)\s*\((.*)\)\s*\{?$"
);
pattern!(CONSTRUCTOR, r"^constructor\s*\((.*)\)\s*\{?$");
pattern!(
    METHOD,
    r"^(async\s+)?(static\s+)?([A-Za-z_$][\w$]*)\s*\(([^()]*)\)\s*\{$"
);
pattern!(TRY, r"^try\s*\{?$");
pattern!(CATCH_START, r"^(?:\}\s*)?catch\b");
pattern!(
    CATCH,
    r"^(?:\}\s*)?catch\s*(?:\(\s*([A-Za-z_$][\w$]*)\s*\))?\s*\{?$"
);
pattern!(FINALLY, r"^(?:\}\s*)?finally\s*\{?$");
pattern!(
    MEMBER_CALL,
    r"^[A-Za-z_$][\w$.]*(?:\[[^\]]*\])?\.[A-Za-z_$][\w$]*\(.*\);?$"
);
pattern!(CLASS_START, r"^class\s");
pattern!(
    CLASS_HEADER,
    r"^class\s+([A-Za-z_$][\w$]*)(?:\s+extends\s+([\w$.]+))?\s*\{?$"
);
pattern!(RETURN, r"^return\b\s*(.*?);?$");
pattern!(
    INCREMENT,
    r"^(?:([A-Za-z_$][\w$.]*)(\+\+|--)|(\+\+|--)([A-Za-z_$][\w$.]*));?$"
);
pattern!(THROW_START, r"^throw\b");
pattern!(THROW_CALL, r"^throw\s+(?:new\s+)?([A-Za-z_$][\w$.]*)\((.*)\);?$");
pattern!(THROW_NAME, r"^throw\s+([A-Za-z_$][\w$]*);?$");
pattern!(UNSUPPORTED_KEYWORD, r"^(switch|do)\b");

/// Identifiers that can precede `(` and `{` without being a method header.
const KEYWORDS: &[&str] = &[
    "if", "for", "while", "switch", "catch", "function", "return", "with", "do",
];

impl Rule {
    fn pattern(&self) -> Option<&'static Regex> {
        let re: &'static LazyLock<Regex> = match self {
            Rule::LineComment => &LINE_COMMENT,
            Rule::BlockComment => &BLOCK_COMMENT,
            Rule::ConsoleLog => &CONSOLE_LOG,
            Rule::ArrayChain => &ARRAY_CHAIN,
            Rule::Arrow => &ARROW,
            Rule::ArrowBlock => &ARROW_BLOCK,
            Rule::ArrayDestructure => &ARRAY_DESTRUCTURE,
            Rule::ObjectDestructure => &OBJECT_DESTRUCTURE,
            Rule::Declaration => &DECLARATION,
            Rule::If => &IF_START,
            Rule::ElseIf => &ELSE_IF_START,
            Rule::Else => &ELSE,
            Rule::CStyleLoop => &C_STYLE_START,
            Rule::ForOf => &FOR_OF_START,
            Rule::ForIn => &FOR_IN_START,
            Rule::OtherFor => &FOR_START,
            Rule::While => &WHILE_START,
            Rule::Function => &FUNCTION_START,
            Rule::Constructor => &CONSTRUCTOR,
            Rule::Method => &METHOD,
            Rule::Try => &TRY,
            Rule::Catch => &CATCH_START,
            Rule::Finally => &FINALLY,
            Rule::MemberCall => &MEMBER_CALL,
            Rule::ClassHeader => &CLASS_START,
            Rule::Return => &RETURN,
            Rule::Increment => &INCREMENT,
            Rule::Throw => &THROW_START,
            Rule::UnsupportedKeyword => &UNSUPPORTED_KEYWORD,
            Rule::ExpressionStatement => return None,
        };
        Some(LazyLock::force(re))
    }
}

impl LineRule for Rule {
    fn kind(&self) -> ConstructKind {
        match self {
            Rule::LineComment | Rule::BlockComment => ConstructKind::Comment,
            Rule::ConsoleLog => ConstructKind::OutputStatement,
            Rule::ArrayChain => ConstructKind::SequenceTransform,
            Rule::Arrow | Rule::ArrayDestructure | Rule::ObjectDestructure | Rule::Declaration => {
                ConstructKind::VariableBinding
            }
            Rule::If => ConstructKind::ConditionalIf,
            Rule::ElseIf => ConstructKind::ConditionalElif,
            Rule::Else => ConstructKind::ConditionalElse,
            Rule::CStyleLoop | Rule::ForOf | Rule::ForIn | Rule::OtherFor => ConstructKind::LoopFor,
            Rule::While => ConstructKind::LoopWhile,
            Rule::Function | Rule::Constructor | Rule::Method => ConstructKind::FunctionDefinition,
            Rule::Try => ConstructKind::ExceptionTry,
            Rule::Catch | Rule::Finally => ConstructKind::ExceptionHandler,
            Rule::MemberCall => ConstructKind::MethodCall,
            Rule::ArrowBlock
            | Rule::ClassHeader
            | Rule::Return
            | Rule::Increment
            | Rule::Throw
            | Rule::UnsupportedKeyword
            | Rule::ExpressionStatement => ConstructKind::Statement,
        }
    }

    fn matches(&self, text: &str) -> bool {
        match self {
            Rule::Method => METHOD
                .captures(text)
                .is_some_and(|caps| !KEYWORDS.contains(&&caps[3])),
            _ => self.pattern().is_none_or(|re| re.is_match(text)),
        }
    }

    fn opens_class(&self) -> bool {
        matches!(self, Rule::ClassHeader)
    }

    fn level(&self) -> ConversionLevel {
        match self.kind() {
            ConstructKind::SequenceTransform | ConstructKind::LoopFor | ConstructKind::LoopWhile => {
                ConversionLevel::Complex
            }
            ConstructKind::ConditionalIf
            | ConstructKind::ConditionalElif
            | ConstructKind::ConditionalElse
            | ConstructKind::FunctionDefinition
            | ConstructKind::ExceptionTry
            | ConstructKind::ExceptionHandler => ConversionLevel::Structural,
            _ if matches!(self, Rule::ClassHeader | Rule::Arrow) => ConversionLevel::Structural,
            _ => ConversionLevel::Simple,
        }
    }

    fn transform(
        &self,
        line: &SourceLine,
        cx: &mut RuleContext<'_>,
    ) -> Result<TransformOutcome, RuleError> {
        let text = line.content.as_str();
        let kind = self.kind();
        let level = self.level();
        let done = |out: String| Ok(TransformOutcome::converted(out, level));
        let missing = RuleError::MissingCapture { kind, group: 0 };

        match self {
            Rule::LineComment => {
                let caps = LINE_COMMENT.captures(text).ok_or(missing)?;
                done(format!("#{}", capture(&caps, 1, kind)?))
            }

            Rule::BlockComment => {
                let caps = BLOCK_COMMENT.captures(text).ok_or(missing)?;
                done(comment(capture(&caps, 1, kind)?))
            }

            Rule::ConsoleLog => {
                let caps = CONSOLE_LOG.captures(text).ok_or(missing)?;
                let args = expression(cx, capture(&caps, 1, kind)?);
                done(format!("print({args})"))
            }

            Rule::ArrayChain => {
                let caps = ARRAY_CHAIN.captures(text).ok_or(missing)?;
                let source = expression(cx, capture(&caps, 4, kind)?);
                let op = capture(&caps, 5, kind)?;
                let param = capture(&caps, 6, kind)?;
                let body = expression(cx, capture(&caps, 7, kind)?);

                let comprehension = match (op, caps.get(8), caps.get(9)) {
                    ("map", None, _) => format!("[{body} for {param} in {source}]"),
                    ("filter", None, _) => format!("[{param} for {param} in {source} if {body}]"),
                    ("filter", Some(second), Some(mapped)) => {
                        let mapped = rename(mapped.as_str(), second.as_str(), param);
                        let mapped = expression(cx, &mapped);
                        format!("[{mapped} for {param} in {source} if {body}]")
                    }
                    _ => return Ok(TransformOutcome::failed(None)),
                };
                cx.diagnostics.conversion_issue(
                    cx.line,
                    "Array method chain converted to list comprehension - verify logic matches",
                );

                if caps.get(1).is_some() {
                    done(format!("return {comprehension}"))
                } else if let Some(name) = caps.get(2).or(caps.get(3)) {
                    let name = javascript_expression(name.as_str());
                    done(format!("{name} = {comprehension}"))
                } else {
                    done(comprehension)
                }
            }

            Rule::Arrow => {
                let caps = ARROW.captures(text).ok_or(missing)?;
                let name = capture(&caps, 1, kind)?;
                let param = capture(&caps, 2, kind)?
                    .trim_start_matches('(')
                    .trim_end_matches(')')
                    .trim();
                let body = capture(&caps, 3, kind)?.trim();
                if !is_identifier(param) || body.is_empty() || body.starts_with('{') {
                    cx.diagnostics.left_unconverted(
                        cx.line,
                        "arrow function",
                        "only single-parameter expression arrows are converted to lambda",
                    );
                    return done(text.to_string());
                }
                let body = expression(cx, body);
                done(format!("{name} = lambda {param}: {body}"))
            }

            Rule::ArrowBlock => {
                cx.diagnostics.left_unconverted(
                    cx.line,
                    "arrow function",
                    "block-bodied arrows have no lambda form; rewrite the callback as a def",
                );
                done(text.to_string())
            }

            Rule::ArrayDestructure => {
                let caps = ARRAY_DESTRUCTURE.captures(text).ok_or(missing)?;
                let names = split_top_level(capture(&caps, 1, kind)?, ',').join(", ");
                let value = expression(cx, capture(&caps, 2, kind)?);
                done(format!("{names} = {value}"))
            }

            Rule::ObjectDestructure => {
                cx.diagnostics.left_unconverted(
                    cx.line,
                    "object destructuring",
                    "Python has no object destructuring; unpack the keys explicitly",
                );
                done(text.to_string())
            }

            Rule::Declaration => {
                let caps = DECLARATION.captures(text).ok_or(missing)?;
                let name = capture(&caps, 1, kind)?;
                let value = match caps.get(2) {
                    Some(value) => expression(cx, value.as_str()),
                    None => "None".to_string(),
                };
                done(format!("{name} = {value}"))
            }

            Rule::If => header(cx, &IF, text, kind, level, |c| format!("if {c}:")),
            Rule::ElseIf => header(cx, &ELSE_IF, text, kind, level, |c| format!("elif {c}:")),
            Rule::Else => done("else:".to_string()),
            Rule::While => header(cx, &WHILE, text, kind, level, |c| format!("while {c}:")),

            Rule::CStyleLoop => {
                let Some(caps) = C_STYLE.captures(text) else {
                    return Ok(TransformOutcome::failed(None));
                };
                let var = capture(&caps, 1, kind)?;
                let start = expression(cx, capture(&caps, 2, kind)?);
                let tested = capture(&caps, 3, kind)?;
                let cmp = capture(&caps, 4, kind)?;
                let end = expression(cx, capture(&caps, 5, kind)?);
                let Some(step) = loop_step(capture(&caps, 6, kind)?, var) else {
                    return Ok(TransformOutcome::failed(None));
                };
                if tested != var {
                    return Ok(TransformOutcome::failed(None));
                }
                let descending = step.starts_with('-');
                let end = match (cmp, descending) {
                    ("<", false) | (">", true) => end,
                    ("<=", false) => offset(&end, 1),
                    (">=", true) => offset(&end, -1),
                    _ => return Ok(TransformOutcome::failed(None)),
                };
                let range = match (start.as_str(), step.as_str()) {
                    ("0", "1") => format!("range({end})"),
                    (_, "1") => format!("range({start}, {end})"),
                    _ => format!("range({start}, {end}, {step})"),
                };
                done(format!("for {var} in {range}:"))
            }

            Rule::ForOf => {
                let Some(caps) = FOR_OF.captures(text) else {
                    return Ok(TransformOutcome::failed(None));
                };
                let target = capture(&caps, 1, kind)?.trim();
                let target = match target.strip_prefix('[').and_then(|t| t.strip_suffix(']')) {
                    Some(inner) => split_top_level(inner, ',').join(", "),
                    None => target.to_string(),
                };
                let iterable = expression(cx, capture(&caps, 2, kind)?);
                done(format!("for {target} in {iterable}:"))
            }

            Rule::ForIn => {
                let Some(caps) = FOR_IN.captures(text) else {
                    return Ok(TransformOutcome::failed(None));
                };
                let var = capture(&caps, 1, kind)?;
                let object = expression(cx, capture(&caps, 2, kind)?);
                cx.diagnostics.conversion_issue(
                    cx.line,
                    "for...in iterates keys; converted to direct iteration - verify the object type",
                );
                done(format!("for {var} in {object}:"))
            }

            Rule::OtherFor => Ok(TransformOutcome::failed(Some(format!(
                "Line {}: for loop form not recognised; applied generic conversion",
                cx.line
            )))),

            Rule::Function => {
                let Some(caps) = FUNCTION.captures(text) else {
                    return Ok(TransformOutcome::failed(None));
                };
                let prefix = if caps.get(1).is_some() { "async " } else { "" };
                let name = capture(&caps, 2, kind)?;
                let params = parameters(cx, capture(&caps, 3, kind)?);
                done(format!("{prefix}def {name}({params}):"))
            }

            Rule::Constructor => {
                let caps = CONSTRUCTOR.captures(text).ok_or(missing)?;
                let params = parameters(cx, capture(&caps, 1, kind)?);
                done(method_header("", "__init__", &params))
            }

            Rule::Method => {
                if !cx.in_class_body() {
                    return Ok(TransformOutcome::failed(None));
                }
                let caps = METHOD.captures(text).ok_or(missing)?;
                let prefix = if caps.get(1).is_some() { "async " } else { "" };
                let name = capture(&caps, 3, kind)?;
                let params = parameters(cx, capture(&caps, 4, kind)?);
                if caps.get(2).is_some() {
                    cx.diagnostics.conversion_issue(
                        cx.line,
                        &format!("Static method '{name}' needs @staticmethod"),
                    );
                    return done(format!("{prefix}def {name}({params}):"));
                }
                done(method_header(prefix, name, &params))
            }

            Rule::Try => done("try:".to_string()),

            Rule::Catch => {
                let Some(caps) = CATCH.captures(text) else {
                    return Ok(TransformOutcome::failed(None));
                };
                match caps.get(1) {
                    Some(binding) => done(format!("except Exception as {}:", binding.as_str())),
                    None => done("except Exception:".to_string()),
                }
            }

            Rule::Finally => done("finally:".to_string()),

            Rule::MemberCall => {
                let converted = expression(cx, text);
                done(converted.trim_end_matches(';').to_string())
            }

            Rule::ClassHeader => {
                let Some(caps) = CLASS_HEADER.captures(text) else {
                    return Ok(TransformOutcome::failed(None));
                };
                let name = capture(&caps, 1, kind)?;
                match caps.get(2) {
                    Some(base) => done(format!("class {name}({}):", base.as_str())),
                    None => done(format!("class {name}:")),
                }
            }

            Rule::Return => {
                let caps = RETURN.captures(text).ok_or(missing)?;
                let value = capture(&caps, 1, kind)?.trim();
                if value.is_empty() {
                    done("return".to_string())
                } else {
                    done(format!("return {}", expression(cx, value)))
                }
            }

            Rule::Increment => {
                let caps = INCREMENT.captures(text).ok_or(missing)?;
                let (target, op) = match (caps.get(1), caps.get(2), caps.get(3), caps.get(4)) {
                    (Some(target), Some(op), _, _) | (_, _, Some(op), Some(target)) => {
                        (target.as_str(), op.as_str())
                    }
                    _ => return Err(RuleError::MissingCapture { kind, group: 1 }),
                };
                let target = javascript_expression(target);
                let op = if op == "++" { "+=" } else { "-=" };
                done(format!("{target} {op} 1"))
            }

            Rule::Throw => {
                if let Some(caps) = THROW_CALL.captures(text) {
                    let class = match capture(&caps, 1, kind)? {
                        "Error" => "Exception",
                        other => other,
                    };
                    let args = expression(cx, capture(&caps, 2, kind)?);
                    return done(format!("raise {class}({args})"));
                }
                if let Some(caps) = THROW_NAME.captures(text) {
                    return done(format!("raise {}", capture(&caps, 1, kind)?));
                }
                Ok(TransformOutcome::failed(None))
            }

            Rule::UnsupportedKeyword => {
                let caps = UNSUPPORTED_KEYWORD.captures(text).ok_or(missing)?;
                let keyword = capture(&caps, 1, kind)?;
                let reason = match keyword {
                    "switch" => "use if/elif chains or match",
                    _ => "use while True with a break",
                };
                cx.diagnostics.unsupported_keyword(cx.line, keyword, reason);
                done(generic_python(text))
            }

            Rule::ExpressionStatement => {
                let converted = generic_python(text);
                done(cx.map_calls(&converted, Direction::ToPython))
            }
        }
    }
}

/// Tokens, then member and built-in calls.
fn expression(cx: &mut RuleContext<'_>, text: &str) -> String {
    cx.map_calls(&javascript_expression(text), Direction::ToPython)
}

fn comment(body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        "#".to_string()
    } else {
        format!("# {body}")
    }
}

fn header(
    cx: &mut RuleContext<'_>,
    re: &Regex,
    text: &str,
    kind: ConstructKind,
    level: ConversionLevel,
    render: impl Fn(&str) -> String,
) -> Result<TransformOutcome, RuleError> {
    let Some(caps) = re.captures(text) else {
        return Ok(TransformOutcome::failed(None));
    };
    let condition = capture(&caps, 1, kind)?;
    if !balanced_outside_literals(condition) {
        return Err(RuleError::UnbalancedHeader { kind });
    }
    let condition = expression(cx, condition.trim());
    Ok(TransformOutcome::converted(render(&condition), level))
}

fn method_header(prefix: &str, name: &str, params: &str) -> String {
    if params.is_empty() {
        format!("{prefix}def {name}(self):")
    } else {
        format!("{prefix}def {name}(self, {params}):")
    }
}

/// Convert a javascript parameter list.
fn parameters(cx: &mut RuleContext<'_>, params: &str) -> String {
    let mut out = Vec::new();
    for param in split_top_level(params, ',') {
        if param.is_empty() {
            continue;
        }
        if let Some(rest) = param.strip_prefix("...") {
            out.push(format!("*{rest}"));
        } else if param.starts_with('{') || param.starts_with('[') {
            cx.diagnostics.left_unconverted(
                cx.line,
                "destructured parameter",
                "Python parameters cannot destructure",
            );
            out.push(param.to_string());
        } else if let Some((name, default)) = param.split_once('=') {
            out.push(format!("{}={}", name.trim(), expression(cx, default.trim())));
        } else {
            out.push(param.to_string());
        }
    }
    out.join(", ")
}

/// Step of a loop update expression on `var`, as python source text.
fn loop_step(update: &str, var: &str) -> Option<String> {
    if let Some(caps) = UNIT_UPDATE.captures(update) {
        let (name, op) = match (caps.get(1), caps.get(2), caps.get(3), caps.get(4)) {
            (Some(name), Some(op), _, _) | (_, _, Some(op), Some(name)) => (name, op),
            _ => return None,
        };
        if name.as_str() != var {
            return None;
        }
        return Some(if op.as_str() == "++" { "1" } else { "-1" }.to_string());
    }
    let caps = STEP_UPDATE.captures(update)?;
    if &caps[1] != var {
        return None;
    }
    let amount = javascript_expression(caps[3].trim());
    if &caps[2] == "+=" {
        Some(amount)
    } else {
        Some(format!("-{amount}"))
    }
}

/// `end + delta`, folded when `end` is an integer literal.
fn offset(end: &str, delta: i64) -> String {
    match end.parse::<i64>() {
        Ok(n) => (n + delta).to_string(),
        Err(_) if delta >= 0 => format!("{end} + {delta}"),
        Err(_) => format!("{end} - {}", -delta),
    }
}

/// Replace whole-word `from` with `to`.
fn rename(text: &str, from: &str, to: &str) -> String {
    if from == to {
        return text.to_string();
    }
    match Regex::new(&format!(r"\b{}\b", regex::escape(from))) {
        Ok(re) => re.replace_all(text, to).into_owned(),
        Err(_) => text.to_string(),
    }
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}
