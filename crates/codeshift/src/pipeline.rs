//! Line-by-line conversion for one grammar pair.
//!
//! A pipeline owns a [`RuleRegistry`] and a shared [`MethodNameMapper`]. Each
//! [`ConversionPipeline::convert`] call creates its own block and diagnostic
//! state, so one pipeline can serve any number of calls, including concurrent
//! ones.
//!
//! Per non-blank line the pipeline:
//!
//! 1. measures indentation depth and closes every block opened at that depth
//!    or deeper, emitting one closing delimiter per block when the target is
//!    brace-delimited;
//! 2. splits off a trailing comment;
//! 3. classifies the code with the registry and applies the matching rule;
//! 4. falls back to token-level conversion when the rule fails or faults;
//! 5. opens a block if the line is a block header.
//!
//! Multi-line comment regions (python docstrings, `/* ... */`) are handled
//! here rather than by rules, since their lines carry no code.

use crate::block::{BlockState, Declarations, IndentationTracker, OpenBlock};
use crate::confidence::{self, ConfidenceInputs};
use crate::diagnostics::{Diagnostics, Severity, UnsupportedConstruct};
use crate::grammar::{BlockStyle, Grammar, GrammarPair};
use crate::line::{
    ConstructKind, ConversionLevel, SourceLine, find_outside_literals, map_code,
    split_trailing_comment,
};
use crate::methods::MethodNameMapper;
use crate::options::ConvertOptions;
use crate::rules::expr::{generic_javascript, generic_python};
use crate::rules::{LineRule, RuleContext, RuleRegistry};
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock};

/// A brace that opens an object literal rather than a block.
static OBJECT_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:[=(,:\[?]|\breturn)\s*\{$").unwrap());

static LAMBDA: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\blambda\b").unwrap());

/// A fault outside per-line handling. The coordinator turns these into a
/// degraded result.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PipelineError {
    #[error("input has {lines} lines, more than the limit of {max}")]
    TooManyLines { lines: usize, max: usize },

    #[error("line {line}: nesting depth {depth} exceeds the limit of {max}")]
    NestingTooDeep {
        line: usize,
        depth: usize,
        max: usize,
    },
}

/// Counters collected while converting.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Metadata {
    pub lines_processed: usize,
    pub blocks_opened: usize,
    pub max_depth: usize,
    /// Lines per construct kind. Generic statements are not counted.
    pub constructs: BTreeMap<ConstructKind, usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Output of one conversion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionResult {
    pub code: String,
    pub source: String,
    pub target: String,
    pub confidence: f64,
    pub warnings: Vec<String>,
    pub unsupported: Vec<UnsupportedConstruct>,
    pub error_count: usize,
    pub level: ConversionLevel,
    pub metadata: Metadata,
}

impl ConversionResult {
    /// Result for blank input: nothing to convert, nothing to doubt.
    pub fn empty(source: &str, target: &str) -> Self {
        Self {
            code: String::new(),
            source: source.to_string(),
            target: target.to_string(),
            confidence: 1.0,
            warnings: Vec::new(),
            unsupported: Vec::new(),
            error_count: 0,
            level: ConversionLevel::Simple,
            metadata: Metadata::default(),
        }
    }
}

/// Rules, mapper and limits for one grammar pair.
#[derive(Debug, Clone)]
pub struct ConversionPipeline {
    registry: RuleRegistry,
    mapper: Arc<MethodNameMapper>,
    options: ConvertOptions,
}

impl ConversionPipeline {
    pub fn new(registry: RuleRegistry, mapper: Arc<MethodNameMapper>, options: ConvertOptions) -> Self {
        Self {
            registry,
            mapper,
            options,
        }
    }

    /// Pipeline for a pair, or `None` if no rules are registered for it.
    pub fn for_pair(
        pair: GrammarPair,
        mapper: Arc<MethodNameMapper>,
        options: ConvertOptions,
    ) -> Option<Self> {
        RuleRegistry::for_pair(pair).map(|registry| Self::new(registry, mapper, options))
    }

    pub fn pair(&self) -> GrammarPair {
        self.registry.pair()
    }

    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// Convert `code` from the pair's source grammar to its target grammar.
    pub fn convert(&self, code: &str) -> Result<ConversionResult, PipelineError> {
        let pair = self.pair();
        if code.trim().is_empty() {
            return Ok(ConversionResult::empty(pair.source.id(), pair.target.id()));
        }

        let lines: Vec<&str> = code.lines().collect();
        if lines.len() > self.options.max_lines {
            return Err(PipelineError::TooManyLines {
                lines: lines.len(),
                max: self.options.max_lines,
            });
        }
        tracing::debug!(pair = %pair, lines = lines.len(), "converting");

        let tracker = IndentationTracker::for_source(pair.source, &lines);
        let mut run = Run::new(self);
        for (index, raw) in lines.iter().enumerate() {
            run.line(&tracker, index + 1, raw)?;
        }
        run.finish();
        Ok(run.into_result(code, lines.len()))
    }
}

/// An open multi-line comment.
#[derive(Debug, Clone, Copy)]
struct CommentRegion {
    depth: usize,
    closer: &'static str,
}

/// Mutable state for a single `convert` call.
struct Run<'p> {
    pipeline: &'p ConversionPipeline,
    source: Grammar,
    target: Grammar,
    out: Vec<String>,
    blank_run: usize,
    blocks: BlockState,
    declared: Declarations,
    diagnostics: Diagnostics,
    level: ConversionLevel,
    lines_converted: usize,
    total_lines: usize,
    constructs: BTreeMap<ConstructKind, usize>,
    region: Option<CommentRegion>,
}

impl<'p> Run<'p> {
    fn new(pipeline: &'p ConversionPipeline) -> Self {
        let pair = pipeline.pair();
        Self {
            pipeline,
            source: pair.source,
            target: pair.target,
            out: Vec::new(),
            blank_run: 0,
            blocks: BlockState::new(),
            declared: Declarations::default(),
            diagnostics: Diagnostics::new(),
            level: ConversionLevel::Simple,
            lines_converted: 0,
            total_lines: 0,
            constructs: BTreeMap::new(),
            region: None,
        }
    }

    fn line(
        &mut self,
        tracker: &IndentationTracker,
        number: usize,
        raw: &str,
    ) -> Result<(), PipelineError> {
        let content = raw.trim();
        if content.is_empty() {
            self.blank_run += 1;
            return Ok(());
        }
        self.total_lines += 1;

        if let Some(region) = self.region {
            self.flush_blanks();
            self.region_line(region, content);
            self.lines_converted += 1;
            return Ok(());
        }

        let depth = tracker.depth(raw);
        let closed = self.blocks.close_to(depth);
        self.declared.release(self.blocks.depth());
        if self.target.uses_delimiters() {
            for block in &closed {
                self.out.push(format!("{}}}", self.target.indent(block.depth)));
            }
        }
        self.flush_blanks();

        if self.source.uses_delimiters()
            && content.starts_with('}')
            && !content.ends_with('{')
            && closed.last().is_some_and(|b| b.kept)
        {
            // Closer of a block whose opener was left in source form.
            self.out.push(format!("{}{}", self.target.indent(depth), content));
            self.lines_converted += 1;
            return Ok(());
        }

        if self.source.uses_delimiters() && matches!(content, "}" | "};") {
            // The source form of a block close. With nothing to close it
            // belongs to a literal and is kept.
            if closed.is_empty() {
                self.out.push(format!("{}}}", self.target.indent(depth)));
            }
            self.lines_converted += 1;
            return Ok(());
        }

        if self.open_region(number, depth, content) {
            self.lines_converted += 1;
            return Ok(());
        }

        self.convert_line(number, raw, depth, content)
    }

    fn convert_line(
        &mut self,
        number: usize,
        raw: &str,
        depth: usize,
        content: &str,
    ) -> Result<(), PipelineError> {
        let pipeline = self.pipeline;
        let (code, comment) = split_trailing_comment(content, self.source.comment_prefix());
        let rule = pipeline.registry.classify(code);
        let kind = rule.map_or(ConstructKind::Statement, |r| r.kind());
        let opens_block = opens_block(self.source, kind, code);

        let line = SourceLine {
            raw: raw.to_string(),
            number,
            width: crate::block::leading_width(raw),
            depth,
            kind,
            content: code.to_string(),
            trailing_comment: comment.map(str::to_string),
            opens_block,
            block_depth: self.blocks.depth(),
        };
        tracing::trace!(line = number, kind = %kind, depth, opens_block, "classified");

        let mut faulted = false;
        let converted = match rule {
            Some(rule) => {
                let mut cx = RuleContext {
                    line: number,
                    blocks: &self.blocks,
                    declared: &mut self.declared,
                    diagnostics: &mut self.diagnostics,
                    mapper: pipeline.mapper.as_ref(),
                };
                match rule.transform(&line, &mut cx) {
                    Ok(outcome) if outcome.success && outcome.text.is_some() => {
                        self.level = self.level.max(outcome.level);
                        outcome.text
                    }
                    Ok(outcome) => {
                        let warning = outcome.warning.unwrap_or_else(|| {
                            format!(
                                "Line {number}: could not convert {kind} construct; applied generic conversion"
                            )
                        });
                        self.diagnostics.warn(warning);
                        faulted = true;
                        None
                    }
                    Err(err) => {
                        tracing::debug!(line = number, kind = %kind, error = %err, "rule fault");
                        self.diagnostics.record(
                            number,
                            kind.as_str(),
                            Severity::Error,
                            Some(err.to_string()),
                        );
                        faulted = true;
                        None
                    }
                }
            }
            None => None,
        };
        let text = converted.unwrap_or_else(|| self.generic(&line));
        if kind != ConstructKind::Comment {
            self.flag_inline_function(number, &text);
        }
        let kept = self.source.uses_delimiters() && text == line.content;

        let mut rendered = format!("{}{}", self.target.indent(depth), text);
        if let Some(comment) = &line.trailing_comment {
            rendered.push_str("  ");
            rendered.push_str(self.target.comment_prefix());
            rendered.push_str(comment);
        }
        self.out.push(rendered);

        if !faulted {
            self.lines_converted += 1;
        }
        if kind != ConstructKind::Statement {
            *self.constructs.entry(kind).or_insert(0) += 1;
        }

        if opens_block {
            self.blocks.enter(OpenBlock {
                kind,
                class: rule.is_some_and(|r| r.opens_class()),
                depth,
                kept,
            });
            let max = pipeline.options.max_depth;
            if self.blocks.depth() > max {
                return Err(PipelineError::NestingTooDeep {
                    line: number,
                    depth: self.blocks.depth(),
                    max,
                });
            }
        }
        Ok(())
    }

    /// Token-level conversion for a line no rule could handle.
    fn generic(&self, line: &SourceLine) -> String {
        match self.source.block_style() {
            BlockStyle::Indentation => generic_javascript(&line.content, line.opens_block),
            BlockStyle::Braces => generic_python(&line.content),
        }
    }

    /// Record an inline function that is still in source form after
    /// conversion.
    fn flag_inline_function(&mut self, number: usize, text: &str) {
        let (construct, reason) = match self.source.block_style() {
            BlockStyle::Indentation if has_lambda(text) => (
                "lambda",
                "only single-parameter lambdas bound to a name are converted to arrow functions",
            ),
            BlockStyle::Braces if find_outside_literals(text, "=>").is_some() => (
                "arrow function",
                "only single-parameter expression arrows are converted to lambda",
            ),
            _ => return,
        };
        self.diagnostics.left_unconverted(number, construct, reason);
    }

    /// Start a comment region if `content` opens one without closing it.
    fn open_region(&mut self, number: usize, depth: usize, content: &str) -> bool {
        let (opener, closer, body) = match self.source.block_style() {
            BlockStyle::Indentation => {
                let Some(delim) = ["\"\"\"", "'''"]
                    .into_iter()
                    .find(|d| content.starts_with(d) && content.matches(d).count() == 1)
                else {
                    return false;
                };
                self.diagnostics.docstring(number);
                (delim, delim, &content[delim.len()..])
            }
            BlockStyle::Braces => {
                if !content.starts_with("/*") || content.contains("*/") {
                    return false;
                }
                ("/*", "*/", content[2..].trim_start_matches('*'))
            }
        };
        tracing::trace!(line = number, opener, "comment region");
        self.region = Some(CommentRegion { depth, closer });
        *self.constructs.entry(ConstructKind::Comment).or_insert(0) += 1;

        let indent = self.target.indent(depth);
        let body = body.trim();
        match self.target.block_style() {
            BlockStyle::Braces if body.is_empty() => self.out.push(format!("{indent}/**")),
            BlockStyle::Braces => self.out.push(format!("{indent}/** {body}")),
            BlockStyle::Indentation if body.is_empty() => {}
            BlockStyle::Indentation => self.out.push(format!("{indent}# {body}")),
        }
        true
    }

    fn region_line(&mut self, region: CommentRegion, content: &str) {
        let (body, closes) = match content.find(region.closer) {
            Some(end) => (&content[..end], true),
            None => (content, false),
        };
        let body = match self.source.block_style() {
            BlockStyle::Braces => body.trim_start_matches('*').trim(),
            BlockStyle::Indentation => body.trim(),
        };

        let indent = self.target.indent(region.depth);
        match self.target.block_style() {
            BlockStyle::Braces => {
                if !body.is_empty() {
                    self.out.push(format!("{indent} * {body}"));
                }
                if closes {
                    self.out.push(format!("{indent} */"));
                }
            }
            BlockStyle::Indentation => {
                if !body.is_empty() {
                    self.out.push(format!("{indent}# {body}"));
                } else if !closes {
                    self.out.push(format!("{indent}#"));
                }
            }
        }
        if closes {
            self.region = None;
        }
    }

    fn flush_blanks(&mut self) {
        for _ in 0..self.blank_run {
            self.out.push(String::new());
        }
        self.blank_run = 0;
    }

    /// Close everything still open at end of input.
    fn finish(&mut self) {
        let closed = self.blocks.close_to(0);
        if self.target.uses_delimiters() {
            for block in &closed {
                self.out.push(format!("{}}}", self.target.indent(block.depth)));
            }
        }
        if let Some(region) = self.region.take()
            && self.target.uses_delimiters()
        {
            self.out.push(format!("{} */", self.target.indent(region.depth)));
        }
        self.flush_blanks();
    }

    fn into_result(self, original: &str, lines_processed: usize) -> ConversionResult {
        let mut code = self.out.join("\n");
        if original.ends_with('\n') && !code.ends_with('\n') {
            code.push('\n');
        }

        let error_count = self.diagnostics.error_count();
        let (warnings, unsupported) = self.diagnostics.into_parts();
        let confidence = confidence::calculate(ConfidenceInputs {
            original,
            converted: &code,
            lines_converted: self.lines_converted,
            total_lines: self.total_lines,
            unsupported_count: unsupported.len(),
        });
        tracing::debug!(
            confidence,
            warnings = warnings.len(),
            unsupported = unsupported.len(),
            "converted"
        );

        ConversionResult {
            code,
            source: self.source.id().to_string(),
            target: self.target.id().to_string(),
            confidence,
            warnings,
            unsupported,
            error_count,
            level: self.level,
            metadata: Metadata {
                lines_processed,
                blocks_opened: self.blocks.block_count(),
                max_depth: self.blocks.max_depth(),
                constructs: self.constructs,
                error: None,
            },
        }
    }
}

/// Whether `text` uses the `lambda` keyword outside string literals.
fn has_lambda(text: &str) -> bool {
    let mut found = false;
    map_code(text, |code| {
        found |= LAMBDA.is_match(code);
        String::new()
    });
    found
}

/// Whether a classified line is a block header in its source grammar.
fn opens_block(source: Grammar, kind: ConstructKind, code: &str) -> bool {
    if kind == ConstructKind::Comment {
        return false;
    }
    match source.block_style() {
        BlockStyle::Indentation => code.ends_with(':'),
        BlockStyle::Braces => code.ends_with('{') && !OBJECT_LITERAL.is_match(code),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pipeline(source: Grammar, target: Grammar) -> ConversionPipeline {
        ConversionPipeline::for_pair(
            GrammarPair::new(source, target),
            Arc::new(MethodNameMapper::new()),
            ConvertOptions::default(),
        )
        .unwrap()
    }

    fn to_js(code: &str) -> ConversionResult {
        pipeline(Grammar::Python, Grammar::JavaScript)
            .convert(code)
            .unwrap()
    }

    fn to_py(code: &str) -> ConversionResult {
        pipeline(Grammar::JavaScript, Grammar::Python)
            .convert(code)
            .unwrap()
    }

    #[test]
    fn test_blank_input() {
        let result = to_js("  \n\n");
        assert_eq!(result.code, "");
        assert_eq!(result.confidence, 1.0);
        assert!(result.warnings.is_empty());
        assert!(result.unsupported.is_empty());
        assert_eq!(result.level, ConversionLevel::Simple);
    }

    #[test]
    fn test_single_binding() {
        let result = to_js("x = 5");
        assert_eq!(result.code, "let x = 5;");
        assert!(result.confidence > 0.7);
        assert_eq!(result.metadata.constructs[&ConstructKind::VariableBinding], 1);
    }

    #[test]
    fn test_nested_blocks_close_together() {
        let code = "if a:\n    if b:\n        if c:\n            x = 1\ny = 2";
        let result = to_js(code);
        assert_eq!(
            result.code,
            "if (a) {\n  if (b) {\n    if (c) {\n      let x = 1;\n    }\n  }\n}\nlet y = 2;"
        );
        assert_eq!(result.metadata.blocks_opened, 3);
        assert_eq!(result.metadata.max_depth, 3);
        assert_eq!(result.level, ConversionLevel::Structural);
    }

    #[test]
    fn test_closers_precede_blank_lines() {
        let result = to_js("def f():\n    return 1\n\n\nf()\n");
        assert_eq!(result.code, "function f() {\n  return 1;\n}\n\n\nf();\n");
    }

    #[test]
    fn test_closers_at_end_of_input() {
        let result = to_js("for i in range(3):\n    print(i)");
        assert_eq!(
            result.code,
            "for (let i = 0; i < 3; i++) {\n  console.log(i);\n}"
        );
        assert_eq!(result.level, ConversionLevel::Complex);
    }

    #[test]
    fn test_else_follows_closer() {
        let result = to_js("if x:\n    a = 1\nelse:\n    a = 2");
        assert_eq!(
            result.code,
            "if (x) {\n  let a = 1;\n}\nelse {\n  let a = 2;\n}"
        );
    }

    #[test]
    fn test_closing_braces_elided_for_python() {
        let code = "function f(x) {\n  if (x > 1) {\n    return x;\n  } else {\n    return 0;\n  }\n}";
        let result = to_py(code);
        assert_eq!(
            result.code,
            "def f(x):\n    if x > 1:\n        return x\n    else:\n        return 0"
        );
        assert_eq!(result.error_count, 0);
    }

    #[test]
    fn test_object_literal_brace_kept() {
        let result = to_py("const point = {\n  x: 1,\n};");
        assert!(result.code.ends_with("\n}"), "{}", result.code);
        assert_eq!(result.metadata.blocks_opened, 0);
    }

    #[test]
    fn test_trailing_comments() {
        assert_eq!(to_js("x = 5  # five").code, "let x = 5;  // five");
        assert_eq!(to_py("let x = 5;  // five").code, "x = 5  # five");
    }

    #[test]
    fn test_failed_rule_falls_back() {
        let result = to_js("if x: y = None");
        assert_eq!(result.code, "if x: y = null;");
        assert_eq!(result.warnings.len(), 1);
        assert!(result.confidence < 1.0);
    }

    #[test]
    fn test_rule_error_is_recorded() {
        let result = to_js("if (x > 5:\n    y = 1");
        assert_eq!(result.error_count, 1);
        assert_eq!(result.unsupported[0].construct, "conditional-if");
        assert_eq!(result.unsupported[0].severity, Severity::Error);
        assert!(result.code.starts_with("if (x > 5 {"));
    }

    #[test]
    fn test_docstring_region() {
        let code = "def f():\n    \"\"\"Adds things.\n\n    Returns a number.\n    \"\"\"\n    return 1";
        let result = to_js(code);
        assert_eq!(
            result.code,
            "function f() {\n  /** Adds things.\n\n   * Returns a number.\n   */\n  return 1;\n}"
        );
        assert!(result.warnings[0].contains("Docstring"));
    }

    #[test]
    fn test_block_comment_region() {
        let code = "/**\n * Adds things.\n */\nfunction f() {\n  return 1;\n}";
        let result = to_py(code);
        assert_eq!(result.code, "# Adds things.\ndef f():\n    return 1");
        assert_eq!(result.metadata.constructs[&ConstructKind::Comment], 1);
    }

    #[test]
    fn test_too_many_lines() {
        let options = ConvertOptions {
            max_lines: 2,
            ..ConvertOptions::default()
        };
        let pipeline = ConversionPipeline::for_pair(
            GrammarPair::new(Grammar::Python, Grammar::JavaScript),
            Arc::new(MethodNameMapper::new()),
            options,
        )
        .unwrap();
        assert_eq!(
            pipeline.convert("a = 1\nb = 2\nc = 3"),
            Err(PipelineError::TooManyLines { lines: 3, max: 2 })
        );
    }

    #[test]
    fn test_nesting_too_deep() {
        let options = ConvertOptions {
            max_depth: 1,
            ..ConvertOptions::default()
        };
        let pipeline = ConversionPipeline::for_pair(
            GrammarPair::new(Grammar::Python, Grammar::JavaScript),
            Arc::new(MethodNameMapper::new()),
            options,
        )
        .unwrap();
        let err = pipeline.convert("if a:\n    if b:\n        c()").unwrap_err();
        assert_eq!(
            err,
            PipelineError::NestingTooDeep {
                line: 2,
                depth: 2,
                max: 1
            }
        );
    }

    #[test]
    fn test_error_count_matches_records() {
        let result = to_js("with open(p) as f:\n    global g\n    data = f.read()");
        let errors = result
            .unsupported
            .iter()
            .filter(|u| u.severity == Severity::Error)
            .count();
        assert_eq!(result.error_count, errors);
        assert!((0.0..=1.0).contains(&result.confidence));
    }

    #[test]
    fn test_kept_opener_keeps_closer() {
        let result = to_py("const handler = (e) => {\n  log(e);\n};\nhandler(1);");
        assert_eq!(result.code, "const handler = (e) => {\n    log(e)\n};\nhandler(1)");
        assert_eq!(result.unsupported.len(), 1);
        assert_eq!(result.unsupported[0].construct, "arrow function");
    }

    #[test]
    fn test_inline_function_in_fallback_is_flagged() {
        let result = to_js("apply(lambda a, b: a + b, xs)");
        assert_eq!(result.code, "apply(lambda a, b: a + b, xs);");
        assert_eq!(result.unsupported[0].construct, "lambda");
        // Inside a string literal it is just text.
        assert!(to_js("print('lambda x: x')").unsupported.is_empty());
        assert!(to_py("log('a => b');").unsupported.is_empty());
    }
}
