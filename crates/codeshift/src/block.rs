//! Indentation measurement and open-block tracking.

use crate::grammar::{BlockStyle, Grammar};
use crate::line::ConstructKind;

const TAB_WIDTH: usize = 4;

/// Width of a line's leading whitespace in columns. Tabs count as four.
pub fn leading_width(line: &str) -> usize {
    line.chars()
        .take_while(|c| c.is_whitespace())
        .map(|c| if c == '\t' { TAB_WIDTH } else { 1 })
        .sum()
}

/// Converts leading whitespace into nesting depth for one source grammar.
#[derive(Debug, Clone, Copy)]
pub struct IndentationTracker {
    style: BlockStyle,
    unit: usize,
}

impl IndentationTracker {
    /// Build a tracker for `source`, looking at the whole input once.
    ///
    /// Indentation-delimited sources use 4-column units. Brace-delimited
    /// sources use 4 if every indented line is a multiple of 4, otherwise 2.
    pub fn for_source(source: Grammar, lines: &[&str]) -> Self {
        let style = source.block_style();
        let unit = match style {
            BlockStyle::Indentation => 4,
            BlockStyle::Braces => detect_unit(lines),
        };
        Self { style, unit }
    }

    pub fn unit(&self) -> usize {
        self.unit
    }

    /// Nesting depth of a non-blank line.
    pub fn depth(&self, line: &str) -> usize {
        let width = leading_width(line);
        match self.style {
            // A stray 1-3 column indent still counts as one level.
            BlockStyle::Indentation if width > 0 && width < self.unit => 1,
            _ => width / self.unit,
        }
    }
}

fn detect_unit(lines: &[&str]) -> usize {
    let mut widths = lines
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| leading_width(l))
        .filter(|w| *w > 0)
        .peekable();
    if widths.peek().is_none() {
        return 4;
    }
    if widths.all(|w| w % 4 == 0) { 4 } else { 2 }
}

/// One open block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenBlock {
    /// Construct that opened the block.
    pub kind: ConstructKind,
    /// Whether the opener was a class header.
    pub class: bool,
    /// Indentation depth of the opening line.
    pub depth: usize,
    /// Whether the opener was emitted in its source form. The matching
    /// closer is kept in source form as well.
    pub kept: bool,
}

/// Stack of open blocks for one conversion call.
#[derive(Debug, Default)]
pub struct BlockState {
    stack: Vec<OpenBlock>,
    max_depth: usize,
    block_count: usize,
}

impl BlockState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a block at the given indentation depth.
    pub fn enter(&mut self, block: OpenBlock) {
        self.stack.push(block);
        self.block_count += 1;
        self.max_depth = self.max_depth.max(self.stack.len());
    }

    /// Close the innermost block. Closing with nothing open is a no-op.
    pub fn exit(&mut self) -> Option<OpenBlock> {
        self.stack.pop()
    }

    /// Close every block opened at `depth` or deeper, innermost first.
    pub fn close_to(&mut self, depth: usize) -> Vec<OpenBlock> {
        let mut closed = Vec::new();
        while self.stack.last().is_some_and(|b| b.depth >= depth) {
            closed.extend(self.stack.pop());
        }
        closed
    }

    /// Number of currently open blocks.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn block_count(&self) -> usize {
        self.block_count
    }

    pub fn innermost(&self) -> Option<&OpenBlock> {
        self.stack.last()
    }

    /// Whether the innermost open block is a class body.
    pub fn in_class_body(&self) -> bool {
        self.innermost().is_some_and(|b| b.class)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Names introduced with a declaration keyword, scoped to the block depth
/// they were declared at.
#[derive(Debug, Default)]
pub struct Declarations {
    names: Vec<(String, usize)>,
}

impl Declarations {
    pub fn declare(&mut self, name: &str, depth: usize) {
        if !self.is_declared(name) {
            self.names.push((name.to_string(), depth));
        }
    }

    pub fn is_declared(&self, name: &str) -> bool {
        self.names.iter().any(|(n, _)| n == name)
    }

    /// Forget names declared deeper than `depth`.
    pub fn release(&mut self, depth: usize) {
        self.names.retain(|(_, d)| *d <= depth);
    }
}
