//! Line rules and the registry that classifies lines with them.
//!
//! Each grammar pair has a closed [`Rule`] enum. A rule is bound to one
//! [`ConstructKind`]; the registry groups rules into buckets by kind and
//! tries the buckets in priority order, so the first matching rule decides a
//! line's kind. Within a bucket, specific rules come before general ones.

pub mod expr;
pub mod javascript_to_python;
pub mod python_to_javascript;

use crate::block::{BlockState, Declarations};
use crate::diagnostics::Diagnostics;
use crate::grammar::{Grammar, GrammarPair};
use crate::line::{ConstructKind, ConversionLevel, SourceLine, TransformOutcome};
use crate::methods::{Direction, MethodNameMapper};
use regex::Captures;

/// A rule's fault on one line.
///
/// The pipeline records it as an error and converts the line generically.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleError {
    #[error("{kind} rule matched but capture {group} is missing")]
    MissingCapture { kind: ConstructKind, group: usize },

    #[error("unbalanced brackets in {kind} header")]
    UnbalancedHeader { kind: ConstructKind },
}

/// Per-line state a rule may read or append to.
pub struct RuleContext<'a> {
    /// 1-based source line.
    pub line: usize,
    pub blocks: &'a BlockState,
    pub declared: &'a mut Declarations,
    pub diagnostics: &'a mut Diagnostics,
    pub mapper: &'a MethodNameMapper,
}

impl RuleContext<'_> {
    /// Rewrite member and built-in calls, recording any mapping gaps.
    pub fn map_calls(&mut self, text: &str, direction: Direction) -> String {
        let mapped = self.mapper.convert(text, direction);
        for gap in &mapped.gaps {
            self.diagnostics.mapping_gap(self.line, gap.name, gap.reason);
        }
        mapped.text
    }

    pub fn in_class_body(&self) -> bool {
        self.blocks.in_class_body()
    }

    /// Depth the body of a block opened on this line will have.
    pub fn body_depth(&self) -> usize {
        self.blocks.depth() + 1
    }
}

/// Behaviour shared by every rule enum.
pub trait LineRule {
    fn kind(&self) -> ConstructKind;

    fn matches(&self, text: &str) -> bool;

    fn transform(
        &self,
        line: &SourceLine,
        cx: &mut RuleContext<'_>,
    ) -> Result<TransformOutcome, RuleError>;

    /// Whether a line handled by this rule is a class header.
    fn opens_class(&self) -> bool {
        false
    }

    fn level(&self) -> ConversionLevel;
}

/// Any rule, for any registered pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    PythonToJavaScript(python_to_javascript::Rule),
    JavaScriptToPython(javascript_to_python::Rule),
}

impl LineRule for Rule {
    fn kind(&self) -> ConstructKind {
        match self {
            Rule::PythonToJavaScript(rule) => rule.kind(),
            Rule::JavaScriptToPython(rule) => rule.kind(),
        }
    }

    fn matches(&self, text: &str) -> bool {
        match self {
            Rule::PythonToJavaScript(rule) => rule.matches(text),
            Rule::JavaScriptToPython(rule) => rule.matches(text),
        }
    }

    fn transform(
        &self,
        line: &SourceLine,
        cx: &mut RuleContext<'_>,
    ) -> Result<TransformOutcome, RuleError> {
        match self {
            Rule::PythonToJavaScript(rule) => rule.transform(line, cx),
            Rule::JavaScriptToPython(rule) => rule.transform(line, cx),
        }
    }

    fn opens_class(&self) -> bool {
        match self {
            Rule::PythonToJavaScript(rule) => rule.opens_class(),
            Rule::JavaScriptToPython(rule) => rule.opens_class(),
        }
    }

    fn level(&self) -> ConversionLevel {
        match self {
            Rule::PythonToJavaScript(rule) => rule.level(),
            Rule::JavaScriptToPython(rule) => rule.level(),
        }
    }
}

/// Ordered rule buckets for one grammar pair.
#[derive(Debug, Clone)]
pub struct RuleRegistry {
    pair: GrammarPair,
    buckets: Vec<(ConstructKind, Vec<Rule>)>,
}

impl RuleRegistry {
    /// Registry for a pair, or `None` if no rules exist for it.
    pub fn for_pair(pair: GrammarPair) -> Option<Self> {
        match (pair.source, pair.target) {
            (Grammar::Python, Grammar::JavaScript) => Some(Self::python_to_javascript()),
            (Grammar::JavaScript, Grammar::Python) => Some(Self::javascript_to_python()),
            _ => None,
        }
    }

    pub fn python_to_javascript() -> Self {
        let rules = python_to_javascript::RULES
            .iter()
            .copied()
            .map(Rule::PythonToJavaScript)
            .collect();
        Self::from_rules(GrammarPair::new(Grammar::Python, Grammar::JavaScript), rules)
    }

    pub fn javascript_to_python() -> Self {
        let rules = javascript_to_python::RULES
            .iter()
            .copied()
            .map(Rule::JavaScriptToPython)
            .collect();
        Self::from_rules(GrammarPair::new(Grammar::JavaScript, Grammar::Python), rules)
    }

    /// Group a priority-ordered rule list into buckets by kind.
    fn from_rules(pair: GrammarPair, rules: Vec<Rule>) -> Self {
        let mut buckets: Vec<(ConstructKind, Vec<Rule>)> = Vec::new();
        for rule in rules {
            match buckets.iter_mut().find(|(kind, _)| *kind == rule.kind()) {
                Some((_, bucket)) => bucket.push(rule),
                None => buckets.push((rule.kind(), vec![rule])),
            }
        }
        Self { pair, buckets }
    }

    pub fn pair(&self) -> GrammarPair {
        self.pair
    }

    pub fn buckets(&self) -> &[(ConstructKind, Vec<Rule>)] {
        &self.buckets
    }

    /// First rule whose pattern matches `text`, in bucket order.
    pub fn classify(&self, text: &str) -> Option<&Rule> {
        self.buckets
            .iter()
            .flat_map(|(_, rules)| rules.iter())
            .find(|rule| rule.matches(text))
    }

    pub fn len(&self) -> usize {
        self.buckets.iter().map(|(_, rules)| rules.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Capture group `group`, or a [`RuleError::MissingCapture`].
pub(crate) fn capture<'t>(
    caps: &Captures<'t>,
    group: usize,
    kind: ConstructKind,
) -> Result<&'t str, RuleError> {
    caps.get(group)
        .map(|m| m.as_str())
        .ok_or(RuleError::MissingCapture { kind, group })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn py_to_js() -> RuleRegistry {
        RuleRegistry::for_pair(GrammarPair::new(Grammar::Python, Grammar::JavaScript)).unwrap()
    }

    fn js_to_py() -> RuleRegistry {
        RuleRegistry::for_pair(GrammarPair::new(Grammar::JavaScript, Grammar::Python)).unwrap()
    }

    fn kind_of(registry: &RuleRegistry, text: &str) -> ConstructKind {
        registry
            .classify(text)
            .map(|r| r.kind())
            .unwrap_or(ConstructKind::Statement)
    }

    #[test]
    fn test_unregistered_pair() {
        assert!(RuleRegistry::for_pair(GrammarPair::new(Grammar::Python, Grammar::Java)).is_none());
        assert!(RuleRegistry::for_pair(GrammarPair::new(Grammar::Python, Grammar::Python)).is_none());
    }

    #[test]
    fn test_buckets_are_unique_per_kind() {
        for registry in [py_to_js(), js_to_py()] {
            let mut kinds: Vec<_> = registry.buckets().iter().map(|(k, _)| *k).collect();
            let total = kinds.len();
            kinds.sort();
            kinds.dedup();
            assert_eq!(kinds.len(), total);
            assert!(!registry.is_empty());
        }
    }

    #[test]
    fn test_python_classification() {
        let registry = py_to_js();
        assert_eq!(kind_of(&registry, "# note"), ConstructKind::Comment);
        assert_eq!(kind_of(&registry, "print(x)"), ConstructKind::OutputStatement);
        assert_eq!(kind_of(&registry, "x = 5"), ConstructKind::VariableBinding);
        assert_eq!(kind_of(&registry, "if x == 5:"), ConstructKind::ConditionalIf);
        assert_eq!(kind_of(&registry, "elif x:"), ConstructKind::ConditionalElif);
        assert_eq!(kind_of(&registry, "else:"), ConstructKind::ConditionalElse);
        assert_eq!(kind_of(&registry, "for i in range(3):"), ConstructKind::LoopFor);
        assert_eq!(kind_of(&registry, "while True:"), ConstructKind::LoopWhile);
        assert_eq!(kind_of(&registry, "def f(a):"), ConstructKind::FunctionDefinition);
        assert_eq!(kind_of(&registry, "try:"), ConstructKind::ExceptionTry);
        assert_eq!(kind_of(&registry, "except ValueError as e:"), ConstructKind::ExceptionHandler);
        assert_eq!(kind_of(&registry, "items.append(4)"), ConstructKind::MethodCall);
        assert_eq!(
            kind_of(&registry, "squares = [n * n for n in nums]"),
            ConstructKind::SequenceTransform
        );
        assert_eq!(kind_of(&registry, "x == 5"), ConstructKind::Statement);
    }

    #[test]
    fn test_javascript_classification() {
        let registry = js_to_py();
        assert_eq!(kind_of(&registry, "// note"), ConstructKind::Comment);
        assert_eq!(kind_of(&registry, "console.log(x);"), ConstructKind::OutputStatement);
        assert_eq!(kind_of(&registry, "let x = 5;"), ConstructKind::VariableBinding);
        assert_eq!(kind_of(&registry, "} else if (x) {"), ConstructKind::ConditionalElif);
        assert_eq!(kind_of(&registry, "} else {"), ConstructKind::ConditionalElse);
        assert_eq!(kind_of(&registry, "for (const x of xs) {"), ConstructKind::LoopFor);
        assert_eq!(kind_of(&registry, "function f(a) {"), ConstructKind::FunctionDefinition);
        assert_eq!(kind_of(&registry, "} catch (e) {"), ConstructKind::ExceptionHandler);
        assert_eq!(
            kind_of(&registry, "const evens = xs.filter(x => x % 2 === 0);"),
            ConstructKind::SequenceTransform
        );
    }
}
