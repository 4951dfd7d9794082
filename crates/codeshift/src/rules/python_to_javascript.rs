//! Rules for indentation-delimited python to brace-delimited javascript.

use super::expr::{
    generic_javascript, is_constant_name, python_expression, split_top_level, terminate,
};
use super::{LineRule, RuleContext, RuleError, capture};
use crate::line::{ConstructKind, ConversionLevel, SourceLine, TransformOutcome, balanced_outside_literals};
use crate::methods::Direction;
use regex::Regex;
use std::sync::LazyLock;

/// Rules in classification priority order.
pub const RULES: &[Rule] = &[
    Rule::HashComment,
    Rule::Docstring,
    Rule::Print,
    Rule::Comprehension,
    Rule::Lambda,
    Rule::TupleBinding,
    Rule::Binding,
    Rule::If,
    Rule::Elif,
    Rule::Else,
    Rule::RangeLoop,
    Rule::DestructuringLoop,
    Rule::IterableLoop,
    Rule::While,
    Rule::Def,
    Rule::Try,
    Rule::MultiExcept,
    Rule::AliasedExcept,
    Rule::BareExcept,
    Rule::Finally,
    Rule::MemberCall,
    Rule::ClassHeader,
    Rule::Return,
    Rule::Jump,
    Rule::Pass,
    Rule::Raise,
    Rule::Decorator,
    Rule::With,
    Rule::ScopeDeclaration,
    Rule::Yield,
    Rule::Delete,
    Rule::Assert,
    Rule::ExpressionStatement,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    HashComment,
    Docstring,
    Print,
    Comprehension,
    Lambda,
    TupleBinding,
    Binding,
    If,
    Elif,
    Else,
    RangeLoop,
    DestructuringLoop,
    IterableLoop,
    While,
    Def,
    Try,
    MultiExcept,
    AliasedExcept,
    BareExcept,
    Finally,
    MemberCall,
    ClassHeader,
    Return,
    Jump,
    Pass,
    Raise,
    Decorator,
    With,
    ScopeDeclaration,
    Yield,
    Delete,
    Assert,
    ExpressionStatement,
}

macro_rules! pattern {
    ($name:ident, $re:expr) => {
        static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($re).unwrap());
    };
}

pattern!(HASH_COMMENT, r"^#");
pattern!(DOCSTRING, r#"^(?:"""|''')(.*?)(?:"""|''')$"#);
pattern!(PRINT, r"^print\((.*)\)$");
pattern!(
    COMPREHENSION,
    r"^(?:(return)\s+|([A-Za-z_][\w.]*)\s*=\s*)?\[\s*(.+?)\s+for\s+([A-Za-z_]\w*)\s+in\s+(.+?)(?:\s+if\s+(.+?))?\s*\]$"
);
pattern!(LAMBDA, r"^([A-Za-z_]\w*)\s*=\s*lambda\b\s*([^:]*):\s*(.+)$");
pattern!(
    TUPLE_BINDING,
    r"^([A-Za-z_]\w*(?:\s*,\s*[A-Za-z_]\w*)+)\s*=\s*([^=].*)$"
);
pattern!(
    BINDING,
    r"^(self\.)?([A-Za-z_]\w*)\s*(?::\s*([^=]+?))?\s*=\s*([^=].*)$"
);
pattern!(IF_START, r"^if\b");
pattern!(IF, r"^if\s+(.+?)\s*:$");
pattern!(ELIF_START, r"^elif\b");
pattern!(ELIF, r"^elif\s+(.+?)\s*:$");
pattern!(ELSE, r"^else\s*:$");
pattern!(RANGE_LOOP_START, r"^for\s+[A-Za-z_]\w*\s+in\s+range\(");
pattern!(RANGE_LOOP, r"^for\s+([A-Za-z_]\w*)\s+in\s+range\((.*)\)\s*:$");
pattern!(
    DESTRUCTURING_LOOP_START,
    r"^for\s+\(?[A-Za-z_]\w*(?:\s*,\s*[A-Za-z_]\w*)+\)?\s+in\s"
);
pattern!(DESTRUCTURING_LOOP, r"^for\s+\(?(.+?)\)?\s+in\s+(.+?)\s*:$");
pattern!(ENUMERATE, r"^enumerate\((.+)\)$");
pattern!(FOR_START, r"^for\s");
pattern!(ITERABLE_LOOP, r"^for\s+([A-Za-z_]\w*)\s+in\s+(.+?)\s*:$");
pattern!(WHILE_START, r"^while\b");
pattern!(WHILE, r"^while\s+(.+?)\s*:$");
pattern!(DEF_START, r"^(?:async\s+)?def\s");
pattern!(
    DEF,
    r"^(async\s+)?def\s+([A-Za-z_]\w*)\s*\((.*)\)\s*(?:->\s*(.+?))?\s*:$"
);
pattern!(TRY, r"^try\s*:$");
pattern!(MULTI_EXCEPT_START, r"^except\s*\(");
pattern!(
    MULTI_EXCEPT,
    r"^except\s*\((.+)\)\s*(?:as\s+([A-Za-z_]\w*))?\s*:$"
);
pattern!(ALIASED_EXCEPT, r"^except\s+[\w.]+\s+as\s+([A-Za-z_]\w*)\s*:$");
pattern!(BARE_EXCEPT_START, r"^except\b");
pattern!(BARE_EXCEPT, r"^except(?:\s+[\w.]+)?\s*:$");
pattern!(FINALLY, r"^finally\s*:$");
pattern!(
    MEMBER_CALL,
    r"^[A-Za-z_][\w.]*(?:\[[^\]]*\])?\.[A-Za-z_]\w*\(.*\)$"
);
pattern!(CLASS_START, r"^class\s");
pattern!(CLASS_HEADER, r"^class\s+([A-Za-z_]\w*)\s*(?:\((.*)\))?\s*:$");
pattern!(RETURN, r"^return\b\s*(.*)$");
pattern!(JUMP, r"^(break|continue)$");
pattern!(PASS, r"^pass$");
pattern!(RAISE_START, r"^raise\b");
pattern!(RAISE_CALL, r"^raise\s+([A-Za-z_][\w.]*)\((.*)\)$");
pattern!(RAISE_NAME, r"^raise\s+([A-Za-z_]\w*)$");
pattern!(DECORATOR, r"^@(.+)$");
pattern!(WITH_START, r"^with\s");
pattern!(WITH, r"^with\s+(.+?)\s*:$");
pattern!(SCOPE_DECLARATION, r"^(global|nonlocal)\s+(.+)$");
pattern!(YIELD, r"^yield\b\s*(.*)$");
pattern!(DELETE, r"^del\s+(.+)$");
pattern!(ASSERT, r"^assert\s+(.+)$");

impl Rule {
    fn pattern(&self) -> Option<&'static Regex> {
        let re: &'static LazyLock<Regex> = match self {
            Rule::HashComment => &HASH_COMMENT,
            Rule::Docstring => &DOCSTRING,
            Rule::Print => &PRINT,
            Rule::Comprehension => &COMPREHENSION,
            Rule::Lambda => &LAMBDA,
            Rule::TupleBinding => &TUPLE_BINDING,
            Rule::Binding => &BINDING,
            Rule::If => &IF_START,
            Rule::Elif => &ELIF_START,
            Rule::Else => &ELSE,
            Rule::RangeLoop => &RANGE_LOOP_START,
            Rule::DestructuringLoop => &DESTRUCTURING_LOOP_START,
            Rule::IterableLoop => &FOR_START,
            Rule::While => &WHILE_START,
            Rule::Def => &DEF_START,
            Rule::Try => &TRY,
            Rule::MultiExcept => &MULTI_EXCEPT_START,
            Rule::AliasedExcept => &ALIASED_EXCEPT,
            Rule::BareExcept => &BARE_EXCEPT_START,
            Rule::Finally => &FINALLY,
            Rule::MemberCall => &MEMBER_CALL,
            Rule::ClassHeader => &CLASS_START,
            Rule::Return => &RETURN,
            Rule::Jump => &JUMP,
            Rule::Pass => &PASS,
            Rule::Raise => &RAISE_START,
            Rule::Decorator => &DECORATOR,
            Rule::With => &WITH_START,
            Rule::ScopeDeclaration => &SCOPE_DECLARATION,
            Rule::Yield => &YIELD,
            Rule::Delete => &DELETE,
            Rule::Assert => &ASSERT,
            Rule::ExpressionStatement => return None,
        };
        Some(LazyLock::force(re))
    }
}

impl LineRule for Rule {
    fn kind(&self) -> ConstructKind {
        match self {
            Rule::HashComment | Rule::Docstring => ConstructKind::Comment,
            Rule::Print => ConstructKind::OutputStatement,
            Rule::Comprehension => ConstructKind::SequenceTransform,
            Rule::Lambda | Rule::TupleBinding | Rule::Binding => ConstructKind::VariableBinding,
            Rule::If => ConstructKind::ConditionalIf,
            Rule::Elif => ConstructKind::ConditionalElif,
            Rule::Else => ConstructKind::ConditionalElse,
            Rule::RangeLoop | Rule::DestructuringLoop | Rule::IterableLoop => {
                ConstructKind::LoopFor
            }
            Rule::While => ConstructKind::LoopWhile,
            Rule::Def => ConstructKind::FunctionDefinition,
            Rule::Try => ConstructKind::ExceptionTry,
            Rule::MultiExcept | Rule::AliasedExcept | Rule::BareExcept | Rule::Finally => {
                ConstructKind::ExceptionHandler
            }
            Rule::MemberCall => ConstructKind::MethodCall,
            Rule::ClassHeader
            | Rule::Return
            | Rule::Jump
            | Rule::Pass
            | Rule::Raise
            | Rule::Decorator
            | Rule::With
            | Rule::ScopeDeclaration
            | Rule::Yield
            | Rule::Delete
            | Rule::Assert
            | Rule::ExpressionStatement => ConstructKind::Statement,
        }
    }

    fn matches(&self, text: &str) -> bool {
        match self.pattern() {
            Some(re) => re.is_match(text),
            None => true,
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
            _ if matches!(self, Rule::ClassHeader | Rule::Lambda | Rule::With) => {
                ConversionLevel::Structural
            }
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

        match self {
            Rule::HashComment => done(format!("//{}", &text[1..])),

            Rule::Docstring => {
                let caps = DOCSTRING.captures(text).ok_or(RuleError::MissingCapture { kind, group: 0 })?;
                cx.diagnostics.docstring(cx.line);
                done(format!("/** {} */", capture(&caps, 1, kind)?.trim()))
            }

            Rule::Print => {
                let caps = PRINT.captures(text).ok_or(RuleError::MissingCapture { kind, group: 0 })?;
                let args = capture(&caps, 1, kind)?;
                let parts = split_top_level(args, ',');
                let kept: Vec<&str> = parts
                    .iter()
                    .copied()
                    .filter(|p| !p.starts_with("sep=") && !p.starts_with("end="))
                    .collect();
                if kept.len() != parts.len() {
                    cx.diagnostics
                        .conversion_issue(cx.line, "print() keyword arguments dropped in console.log");
                }
                let args = expression(cx, &kept.join(", "));
                done(terminate(format!("console.log({args})")))
            }

            Rule::Comprehension => {
                let caps = COMPREHENSION.captures(text).ok_or(RuleError::MissingCapture { kind, group: 0 })?;
                let element = python_expression(capture(&caps, 3, kind)?);
                let var = capture(&caps, 4, kind)?;
                let source = python_expression(capture(&caps, 5, kind)?);
                let chain = match caps.get(6) {
                    Some(cond) => {
                        let cond = python_expression(cond.as_str());
                        if element == var {
                            format!("{source}.filter({var} => {cond})")
                        } else {
                            format!("{source}.filter({var} => {cond}).map({var} => {element})")
                        }
                    }
                    None => format!("{source}.map({var} => {element})"),
                };
                let chain = cx.map_calls(&chain, Direction::ToJavaScript);
                cx.diagnostics.comprehension(cx.line, text);

                if caps.get(1).is_some() {
                    done(terminate(format!("return {chain}")))
                } else if let Some(name) = caps.get(2) {
                    done(bind(cx, name.as_str(), &chain))
                } else {
                    done(terminate(chain))
                }
            }

            Rule::Lambda => {
                let caps = LAMBDA.captures(text).ok_or(RuleError::MissingCapture { kind, group: 0 })?;
                let name = capture(&caps, 1, kind)?;
                let param = capture(&caps, 2, kind)?.trim();
                if !is_identifier(param) {
                    cx.diagnostics.left_unconverted(
                        cx.line,
                        "lambda",
                        "only single-parameter lambdas are converted to arrow functions",
                    );
                    return done(text.to_string());
                }
                let body = expression(cx, capture(&caps, 3, kind)?);
                done(bind(cx, name, &format!("{param} => {body}")))
            }

            Rule::TupleBinding => {
                let caps = TUPLE_BINDING.captures(text).ok_or(RuleError::MissingCapture { kind, group: 0 })?;
                let names: Vec<&str> = split_top_level(capture(&caps, 1, kind)?, ',');
                let values = split_top_level(capture(&caps, 2, kind)?, ',');
                let value = if values.len() > 1 {
                    format!("[{}]", values.join(", "))
                } else {
                    values.join("")
                };
                let value = expression(cx, &value);
                let fresh = names.iter().all(|n| !cx.declared.is_declared(n));
                let depth = cx.blocks.depth();
                for name in &names {
                    cx.declared.declare(name, depth);
                }
                let pattern = format!("[{}]", names.join(", "));
                if fresh {
                    done(terminate(format!("let {pattern} = {value}")))
                } else {
                    done(terminate(format!("{pattern} = {value}")))
                }
            }

            Rule::Binding => {
                let caps = BINDING.captures(text).ok_or(RuleError::MissingCapture { kind, group: 0 })?;
                let name = capture(&caps, 2, kind)?;
                if let Some(hint) = caps.get(3) {
                    cx.diagnostics.type_hint_removed(cx.line, hint.as_str().trim());
                }
                let value = expression(cx, capture(&caps, 4, kind)?);
                if caps.get(1).is_some() {
                    done(terminate(format!("this.{name} = {value}")))
                } else {
                    done(bind(cx, name, &value))
                }
            }

            Rule::If => header(cx, &IF, text, kind, level, |c| format!("if ({c}) {{")),
            Rule::Elif => header(cx, &ELIF, text, kind, level, |c| format!("else if ({c}) {{")),
            Rule::Else => done("else {".to_string()),
            Rule::While => header(cx, &WHILE, text, kind, level, |c| format!("while ({c}) {{")),

            Rule::RangeLoop => {
                let Some(caps) = RANGE_LOOP.captures(text) else {
                    return Ok(TransformOutcome::failed(None));
                };
                let var = capture(&caps, 1, kind)?;
                let args: Vec<String> = split_top_level(capture(&caps, 2, kind)?, ',')
                    .into_iter()
                    .map(|a| expression(cx, a))
                    .collect();
                let (start, end, step) = match args.as_slice() {
                    [end] => ("0", end.as_str(), None),
                    [start, end] => (start.as_str(), end.as_str(), None),
                    [start, end, step] => (start.as_str(), end.as_str(), Some(step.as_str())),
                    _ => {
                        return Ok(TransformOutcome::failed(Some(format!(
                            "Line {}: range() with {} arguments cannot be converted",
                            cx.line,
                            args.len()
                        ))));
                    }
                };
                let (cmp, update) = match step {
                    None | Some("1") => ("<", format!("{var}++")),
                    Some(step) => match step.strip_prefix('-') {
                        Some("1") => (">", format!("{var}--")),
                        Some(down) => (">", format!("{var} -= {}", down.trim())),
                        None => ("<", format!("{var} += {step}")),
                    },
                };
                let depth = cx.body_depth();
                cx.declared.declare(var, depth);
                done(format!(
                    "for (let {var} = {start}; {var} {cmp} {end}; {update}) {{"
                ))
            }

            Rule::DestructuringLoop => {
                let Some(caps) = DESTRUCTURING_LOOP.captures(text) else {
                    return Ok(TransformOutcome::failed(None));
                };
                let names = split_top_level(capture(&caps, 1, kind)?, ',');
                let iterable = capture(&caps, 2, kind)?;
                let iterable = match ENUMERATE.captures(iterable) {
                    Some(inner) => format!("{}.entries()", expression(cx, &inner[1])),
                    None => expression(cx, iterable),
                };
                let depth = cx.body_depth();
                for name in &names {
                    cx.declared.declare(name, depth);
                }
                done(format!(
                    "for (let [{}] of {iterable}) {{",
                    names.join(", ")
                ))
            }

            Rule::IterableLoop => {
                let Some(caps) = ITERABLE_LOOP.captures(text) else {
                    return Ok(TransformOutcome::failed(None));
                };
                let var = capture(&caps, 1, kind)?;
                let iterable = expression(cx, capture(&caps, 2, kind)?);
                let depth = cx.body_depth();
                cx.declared.declare(var, depth);
                done(format!("for (let {var} of {iterable}) {{"))
            }

            Rule::Def => {
                let Some(caps) = DEF.captures(text) else {
                    return Ok(TransformOutcome::failed(None));
                };
                let is_async = caps.get(1).is_some();
                let name = capture(&caps, 2, kind)?;
                let in_class = cx.in_class_body();
                let params = parameters(cx, capture(&caps, 3, kind)?, in_class);
                if let Some(ret) = caps.get(4) {
                    cx.diagnostics
                        .type_hint_removed(cx.line, &format!("-> {}", ret.as_str().trim()));
                }
                let prefix = if is_async { "async " } else { "" };
                let header = match (in_class, name) {
                    (true, "__init__") => format!("constructor({params}) {{"),
                    (true, _) => format!("{prefix}{name}({params}) {{"),
                    (false, _) => format!("{prefix}function {name}({params}) {{"),
                };
                done(header)
            }

            Rule::Try => done("try {".to_string()),

            Rule::MultiExcept => {
                let Some(caps) = MULTI_EXCEPT.captures(text) else {
                    return Ok(TransformOutcome::failed(None));
                };
                let types = capture(&caps, 1, kind)?;
                let binding = caps.get(2).map_or("error", |m| m.as_str());
                cx.diagnostics.conversion_issue(
                    cx.line,
                    &format!("Exception types ({types}) merged into a single catch block"),
                );
                done(format!("catch ({binding}) {{"))
            }

            Rule::AliasedExcept => {
                let caps = ALIASED_EXCEPT.captures(text).ok_or(RuleError::MissingCapture { kind, group: 0 })?;
                done(format!("catch ({}) {{", capture(&caps, 1, kind)?))
            }

            Rule::BareExcept => {
                if !BARE_EXCEPT.is_match(text) {
                    return Ok(TransformOutcome::failed(None));
                }
                done("catch (error) {".to_string())
            }

            Rule::Finally => done("finally {".to_string()),

            Rule::MemberCall => done(terminate(expression(cx, text))),

            Rule::ClassHeader => {
                let Some(caps) = CLASS_HEADER.captures(text) else {
                    return Ok(TransformOutcome::failed(None));
                };
                let name = capture(&caps, 1, kind)?;
                let bases: Vec<&str> = caps
                    .get(2)
                    .map(|m| split_top_level(m.as_str(), ','))
                    .unwrap_or_default()
                    .into_iter()
                    .filter(|b| *b != "object" && !b.contains('='))
                    .collect();
                match bases.as_slice() {
                    [] => done(format!("class {name} {{")),
                    [base, rest @ ..] => {
                        if !rest.is_empty() {
                            cx.diagnostics.conversion_issue(
                                cx.line,
                                &format!("Multiple inheritance not supported - only '{base}' kept as base class"),
                            );
                        }
                        done(format!("class {name} extends {base} {{"))
                    }
                }
            }

            Rule::Return => {
                let caps = RETURN.captures(text).ok_or(RuleError::MissingCapture { kind, group: 0 })?;
                let value = capture(&caps, 1, kind)?.trim();
                if value.is_empty() {
                    return done("return;".to_string());
                }
                let values = split_top_level(value, ',');
                let value = if values.len() > 1 {
                    format!("[{}]", values.join(", "))
                } else {
                    value.to_string()
                };
                done(terminate(format!("return {}", expression(cx, &value))))
            }

            Rule::Jump => done(format!("{text};")),

            Rule::Pass => done("// pass".to_string()),

            Rule::Raise => {
                if let Some(caps) = RAISE_CALL.captures(text) {
                    let class = match capture(&caps, 1, kind)? {
                        "Exception" => "Error",
                        other => other,
                    };
                    let args = expression(cx, capture(&caps, 2, kind)?);
                    return done(format!("throw new {class}({args});"));
                }
                if let Some(caps) = RAISE_NAME.captures(text) {
                    return done(format!("throw {};", capture(&caps, 1, kind)?));
                }
                if text == "raise" {
                    cx.diagnostics.conversion_issue(
                        cx.line,
                        "bare 'raise' rethrows 'error' - check the catch binding name",
                    );
                    return done("throw error;".to_string());
                }
                Ok(TransformOutcome::failed(None))
            }

            Rule::Decorator => {
                let caps = DECORATOR.captures(text).ok_or(RuleError::MissingCapture { kind, group: 0 })?;
                cx.diagnostics.decorator(cx.line, capture(&caps, 1, kind)?);
                done(format!("// {text}"))
            }

            Rule::With => {
                let Some(caps) = WITH.captures(text) else {
                    return Ok(TransformOutcome::failed(None));
                };
                cx.diagnostics.unsupported_keyword(
                    cx.line,
                    "with",
                    "context managers have no JavaScript equivalent",
                );
                done(format!("{{ // with {}", capture(&caps, 1, kind)?))
            }

            Rule::ScopeDeclaration => {
                let caps = SCOPE_DECLARATION.captures(text).ok_or(RuleError::MissingCapture { kind, group: 0 })?;
                let keyword = capture(&caps, 1, kind)?;
                cx.diagnostics.unsupported_keyword(
                    cx.line,
                    keyword,
                    "JavaScript resolves scope lexically",
                );
                done(format!("// {text}"))
            }

            Rule::Yield => {
                let caps = YIELD.captures(text).ok_or(RuleError::MissingCapture { kind, group: 0 })?;
                cx.diagnostics.unsupported_keyword(
                    cx.line,
                    "yield",
                    "generators need function* in JavaScript",
                );
                let value = capture(&caps, 1, kind)?.trim();
                if value.is_empty() {
                    done("yield;".to_string())
                } else {
                    done(terminate(format!("yield {}", expression(cx, value))))
                }
            }

            Rule::Delete => {
                let caps = DELETE.captures(text).ok_or(RuleError::MissingCapture { kind, group: 0 })?;
                done(format!("delete {};", expression(cx, capture(&caps, 1, kind)?)))
            }

            Rule::Assert => {
                let caps = ASSERT.captures(text).ok_or(RuleError::MissingCapture { kind, group: 0 })?;
                let args = split_top_level(capture(&caps, 1, kind)?, ',');
                let args: Vec<String> = args.into_iter().map(|a| expression(cx, a)).collect();
                done(format!("console.assert({});", args.join(", ")))
            }

            Rule::ExpressionStatement => {
                let converted = generic_javascript(text, line.opens_block);
                done(cx.map_calls(&converted, Direction::ToJavaScript))
            }
        }
    }
}

/// Tokens, then member and built-in calls.
fn expression(cx: &mut RuleContext<'_>, text: &str) -> String {
    cx.map_calls(&python_expression(text), Direction::ToJavaScript)
}

/// Declaration-aware binding of `name`.
fn bind(cx: &mut RuleContext<'_>, name: &str, value: &str) -> String {
    if let Some(field) = name.strip_prefix("self.") {
        return terminate(format!("this.{field} = {value}"));
    }
    if name.contains('.') {
        return terminate(format!("{name} = {value}"));
    }
    let declared = cx.declared.is_declared(name);
    let depth = cx.blocks.depth();
    cx.declared.declare(name, depth);
    let statement = if is_constant_name(name) && !declared {
        format!("const {name} = {value}")
    } else if declared {
        format!("{name} = {value}")
    } else {
        format!("let {name} = {value}")
    };
    terminate(statement)
}

/// Conditional header with a bracket check on the condition.
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
    let condition = expression(cx, condition);
    Ok(TransformOutcome::converted(render(&condition), level))
}

/// Convert a `def` parameter list, declaring each name in the body scope.
fn parameters(cx: &mut RuleContext<'_>, params: &str, in_class: bool) -> String {
    let mut out = Vec::new();
    let depth = cx.body_depth();

    for (i, param) in split_top_level(params, ',').into_iter().enumerate() {
        if param.is_empty() || param == "*" || param == "/" {
            continue;
        }
        if i == 0 && in_class && (param == "self" || param == "cls") {
            continue;
        }

        let (head, default) = match split_default(param) {
            Some((head, default)) => (head, Some(default)),
            None => (param, None),
        };
        let (name, hint) = match head.split_once(':') {
            Some((name, hint)) => (name.trim(), Some(hint.trim())),
            None => (head.trim(), None),
        };
        if let Some(hint) = hint {
            cx.diagnostics.type_hint_removed(cx.line, hint);
        }

        let rendered = if let Some(rest) = name.strip_prefix("**") {
            cx.diagnostics.unpacking(cx.line, &format!("**{rest}"));
            cx.declared.declare(rest, depth);
            format!("{rest} = {{}}")
        } else if let Some(rest) = name.strip_prefix('*') {
            cx.diagnostics.unpacking(cx.line, &format!("*{rest}"));
            cx.declared.declare(rest, depth);
            format!("...{rest}")
        } else {
            cx.declared.declare(name, depth);
            match default {
                Some(default) => format!("{name} = {}", expression(cx, default)),
                None => name.to_string(),
            }
        };
        out.push(rendered);
    }
    out.join(", ")
}

/// Split `name: T = value` at the first top-level `=`.
fn split_default(param: &str) -> Option<(&str, &str)> {
    let mut depth = 0i32;
    for (i, c) in param.char_indices() {
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth -= 1,
            '=' if depth == 0 => return Some((param[..i].trim(), param[i + 1..].trim())),
            _ => {}
        }
    }
    None
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{BlockState, Declarations, OpenBlock};
    use crate::diagnostics::Diagnostics;
    use crate::methods::MethodNameMapper;

    struct Harness {
        blocks: BlockState,
        declared: Declarations,
        diagnostics: Diagnostics,
        mapper: MethodNameMapper,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                blocks: BlockState::new(),
                declared: Declarations::default(),
                diagnostics: Diagnostics::new(),
                mapper: MethodNameMapper::new(),
            }
        }

        fn run(&mut self, text: &str) -> TransformOutcome {
            let rule = RULES.iter().find(|r| r.matches(text)).unwrap();
            let line = SourceLine {
                raw: text.to_string(),
                number: 1,
                width: 0,
                depth: 0,
                kind: rule.kind(),
                content: text.to_string(),
                trailing_comment: None,
                opens_block: text.ends_with(':'),
                block_depth: self.blocks.depth(),
            };
            let mut cx = RuleContext {
                line: 1,
                blocks: &self.blocks,
                declared: &mut self.declared,
                diagnostics: &mut self.diagnostics,
                mapper: &self.mapper,
            };
            rule.transform(&line, &mut cx).unwrap()
        }

        fn text(&mut self, text: &str) -> String {
            self.run(text).text.unwrap()
        }
    }

    #[test]
    fn test_bindings() {
        let mut h = Harness::new();
        assert_eq!(h.text("x = 5"), "let x = 5;");
        assert_eq!(h.text("x = x + 1"), "x = x + 1;");
        assert_eq!(h.text("MAX_SIZE = 100"), "const MAX_SIZE = 100;");
        assert_eq!(h.text("self.name = name"), "this.name = name;");
        assert_eq!(h.text("a, b = 1, 2"), "let [a, b] = [1, 2];");
    }

    #[test]
    fn test_open_bracket_takes_no_terminator() {
        let mut h = Harness::new();
        assert_eq!(h.text("config = {"), "let config = {");
        assert_eq!(h.text("return_value = foo(a,"), "let return_value = foo(a,");
        assert_eq!(h.text("names = ["), "let names = [");
        assert_eq!(h.text("self.items = ["), "this.items = [");
        assert_eq!(h.text("a, b = divmod(x,"), "let [a, b] = divmod(x,");
        assert_eq!(h.text("return {"), "return {");
        assert_eq!(h.text("items.extend(["), "items.extend([");
        // Closing a bracket from an earlier line ends the statement.
        assert_eq!(h.text("config = {}"), "config = {};");
    }

    #[test]
    fn test_type_hint_removed() {
        let mut h = Harness::new();
        assert_eq!(h.text("count: int = 0"), "let count = 0;");
        assert!(h.diagnostics.warnings()[0].contains("Type hint 'int' removed"));
    }

    #[test]
    fn test_print_and_fstring() {
        let mut h = Harness::new();
        assert_eq!(
            h.text(r#"print(f"Hello {name}")"#),
            "console.log(`Hello ${name}`);"
        );
    }

    #[test]
    fn test_conditionals() {
        let mut h = Harness::new();
        assert_eq!(h.text("if x > 5 and not done:"), "if (x > 5 && !done) {");
        assert_eq!(h.text("elif x == None:"), "else if (x === null) {");
        assert_eq!(h.text("else:"), "else {");
    }

    #[test]
    fn test_unbalanced_condition_is_rule_error() {
        let mut h = Harness::new();
        let line = SourceLine {
            raw: "if (x > 5:".into(),
            number: 1,
            width: 0,
            depth: 0,
            kind: ConstructKind::ConditionalIf,
            content: "if (x > 5:".into(),
            trailing_comment: None,
            opens_block: true,
            block_depth: 0,
        };
        let mut cx = RuleContext {
            line: 1,
            blocks: &h.blocks,
            declared: &mut h.declared,
            diagnostics: &mut h.diagnostics,
            mapper: &h.mapper,
        };
        assert_eq!(
            Rule::If.transform(&line, &mut cx),
            Err(RuleError::UnbalancedHeader {
                kind: ConstructKind::ConditionalIf
            })
        );
    }

    #[test]
    fn test_range_loops() {
        let mut h = Harness::new();
        assert_eq!(h.text("for i in range(5):"), "for (let i = 0; i < 5; i++) {");
        assert_eq!(
            h.text("for i in range(1, len(items)):"),
            "for (let i = 1; i < items.length; i++) {"
        );
        assert_eq!(
            h.text("for i in range(10, 0, -2):"),
            "for (let i = 10; i > 0; i -= 2) {"
        );
    }

    #[test]
    fn test_iterable_loops() {
        let mut h = Harness::new();
        assert_eq!(h.text("for item in items:"), "for (let item of items) {");
        assert_eq!(
            h.text("for k, v in d.items():"),
            "for (let [k, v] of Object.entries(d)) {"
        );
        assert_eq!(
            h.text("for i, x in enumerate(xs):"),
            "for (let [i, x] of xs.entries()) {"
        );
    }

    #[test]
    fn test_functions() {
        let mut h = Harness::new();
        assert_eq!(
            h.text("def greet(name: str, greeting='Hi') -> str:"),
            "function greet(name, greeting = 'Hi') {"
        );
        assert_eq!(h.text("async def fetch(url):"), "async function fetch(url) {");
        assert_eq!(h.text("def total(*nums):"), "function total(...nums) {");
        assert_eq!(h.diagnostics.unsupported().len(), 1);
    }

    #[test]
    fn test_methods_in_class_body() {
        let mut h = Harness::new();
        h.blocks.enter(OpenBlock {
            kind: ConstructKind::Statement,
            class: true,
            depth: 0,
            kept: false,
        });
        assert_eq!(h.text("def __init__(self, name):"), "constructor(name) {");
        assert_eq!(h.text("def speak(self):"), "speak() {");
    }

    #[test]
    fn test_exception_handlers() {
        let mut h = Harness::new();
        assert_eq!(h.text("try:"), "try {");
        assert_eq!(h.text("except ValueError as e:"), "catch (e) {");
        assert_eq!(h.text("except:"), "catch (error) {");
        assert_eq!(h.text("except (KeyError, IndexError) as err:"), "catch (err) {");
        assert_eq!(h.text("finally:"), "finally {");
    }

    #[test]
    fn test_comprehensions() {
        let mut h = Harness::new();
        assert_eq!(
            h.text("squares = [n * n for n in nums]"),
            "let squares = nums.map(n => n * n);"
        );
        assert_eq!(
            h.text("evens = [n for n in nums if n % 2 == 0]"),
            "let evens = nums.filter(n => n % 2 === 0);"
        );
        assert_eq!(
            h.text("return [s.upper() for s in words if s]"),
            "return words.filter(s => s).map(s => s.toUpperCase());"
        );
        assert_eq!(h.diagnostics.unsupported().len(), 3);
    }

    #[test]
    fn test_lambda_scope() {
        let mut h = Harness::new();
        assert_eq!(h.text("double = lambda x: x * 2"), "let double = x => x * 2;");
        assert_eq!(h.text("add = lambda a, b: a + b"), "add = lambda a, b: a + b");
        assert_eq!(h.diagnostics.unsupported()[0].construct, "lambda");
    }

    #[test]
    fn test_statements() {
        let mut h = Harness::new();
        assert_eq!(h.text("return a, b"), "return [a, b];");
        assert_eq!(h.text("break"), "break;");
        assert_eq!(h.text("pass"), "// pass");
        assert_eq!(
            h.text("raise ValueError('bad')"),
            "throw new ValueError('bad');"
        );
        assert_eq!(h.text("raise Exception('x')"), "throw new Error('x');");
        assert_eq!(h.text("class Dog(Animal):"), "class Dog extends Animal {");
        assert_eq!(h.text("class Point:"), "class Point {");
        assert_eq!(h.text("items.append(4)"), "items.push(4);");
        assert_eq!(h.text("total += x"), "total += x;");
        assert_eq!(h.text("super().__init__(name)"), "super(name);");
        assert_eq!(h.text("return super().describe()"), "return super.describe();");
    }

    #[test]
    fn test_unsupported_keywords_are_errors() {
        let mut h = Harness::new();
        assert_eq!(h.text("with open(p) as f:"), "{ // with open(p) as f");
        assert_eq!(h.text("global counter"), "// global counter");
        assert_eq!(h.diagnostics.error_count(), 2);
    }

    #[test]
    fn test_header_without_colon_fails() {
        let mut h = Harness::new();
        let outcome = h.run("if x: y = 1");
        assert!(!outcome.success);
    }
}
