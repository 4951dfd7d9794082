//! Entry point: input validation, pair lookup and fault absorption.

use crate::detect::{DetectionResult, LanguageIdentifier};
use crate::grammar::{Grammar, GrammarPair};
use crate::line::ConversionLevel;
use crate::methods::MethodNameMapper;
use crate::options::ConvertOptions;
use crate::pipeline::{ConversionPipeline, ConversionResult, Metadata, PipelineError};
use crate::rules::RuleRegistry;
use serde::Serialize;
use std::sync::Arc;

/// Builds the rule registry for one registered pair.
pub type RegistryBuilder = fn() -> RuleRegistry;

/// Input the coordinator refuses to convert.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConvertError {
    #[error("no code provided")]
    EmptyInput,

    #[error("no {side} language given")]
    MissingGrammar { side: &'static str },

    #[error("unknown language: {0}")]
    UnknownGrammar(String),

    #[error("conversion {pair} is not supported. Supported pairs: {supported}")]
    UnsupportedPair { pair: GrammarPair, supported: String },
}

/// Detection followed by conversion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectedConversion {
    pub detection: DetectionResult,
    pub conversion: ConversionResult,
}

/// Routes conversions to the pipeline registered for their grammar pair.
///
/// The coordinator holds only immutable state and can be shared between
/// threads.
#[derive(Debug, Clone)]
pub struct ConversionCoordinator {
    identifier: LanguageIdentifier,
    mapper: Arc<MethodNameMapper>,
    registry: Vec<(GrammarPair, RegistryBuilder)>,
    options: ConvertOptions,
}

impl Default for ConversionCoordinator {
    fn default() -> Self {
        Self::new(ConvertOptions::default())
    }
}

impl ConversionCoordinator {
    /// Coordinator with the built-in pairs and method table.
    pub fn new(options: ConvertOptions) -> Self {
        Self::with_mapper(Arc::new(MethodNameMapper::new()), options)
    }

    pub fn with_mapper(mapper: Arc<MethodNameMapper>, options: ConvertOptions) -> Self {
        let mut coordinator = Self {
            identifier: LanguageIdentifier::new(),
            mapper,
            registry: Vec::new(),
            options,
        };
        coordinator.register(
            GrammarPair::new(Grammar::Python, Grammar::JavaScript),
            RuleRegistry::python_to_javascript,
        );
        coordinator.register(
            GrammarPair::new(Grammar::JavaScript, Grammar::Python),
            RuleRegistry::javascript_to_python,
        );
        coordinator
    }

    /// Register or replace the rules for a pair.
    pub fn register(&mut self, pair: GrammarPair, builder: RegistryBuilder) {
        match self.registry.iter_mut().find(|(p, _)| *p == pair) {
            Some(entry) => entry.1 = builder,
            None => self.registry.push((pair, builder)),
        }
    }

    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// Registered pairs in registration order.
    pub fn supported_pairs(&self) -> Vec<GrammarPair> {
        self.registry.iter().map(|(pair, _)| *pair).collect()
    }

    pub fn detect(&self, code: &str) -> DetectionResult {
        self.identifier.detect(code)
    }

    /// Convert `code` between two grammar ids.
    ///
    /// `strict` (or `strict` in the options) adds an advisory warning when
    /// error-severity constructs are found. It does not stop the conversion.
    pub fn convert(
        &self,
        code: &str,
        source: &str,
        target: &str,
        strict: bool,
    ) -> Result<ConversionResult, ConvertError> {
        if code.trim().is_empty() {
            return Err(ConvertError::EmptyInput);
        }
        let source = parse_grammar(source, "source")?;
        let target = parse_grammar(target, "target")?;
        self.convert_grammars(code, source, target, strict)
    }

    pub fn convert_grammars(
        &self,
        code: &str,
        source: Grammar,
        target: Grammar,
        strict: bool,
    ) -> Result<ConversionResult, ConvertError> {
        if code.trim().is_empty() {
            return Err(ConvertError::EmptyInput);
        }
        if source == target {
            return Ok(identity(code, source));
        }

        let pair = GrammarPair::new(source, target);
        let Some((_, builder)) = self.registry.iter().find(|(p, _)| *p == pair) else {
            return Err(ConvertError::UnsupportedPair {
                pair,
                supported: self
                    .supported_pairs()
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", "),
            });
        };

        let pipeline = ConversionPipeline::new(builder(), Arc::clone(&self.mapper), self.options);
        let mut result = match pipeline.convert(code) {
            Ok(result) => result,
            Err(err) => return Ok(degraded(code, pair, &err)),
        };

        if (strict || self.options.strict) && result.error_count > 0 {
            result.warnings.insert(
                0,
                format!(
                    "STRICT MODE: Found {} unsupported constructs. Conversion continued; review unsupported constructs for details.",
                    result.error_count
                ),
            );
        }
        Ok(result)
    }

    /// Detect the source grammar, then convert to `target`.
    ///
    /// Undetectable input yields an empty zero-confidence conversion; no
    /// pipeline runs.
    pub fn detect_and_convert(
        &self,
        code: &str,
        target: &str,
        strict: bool,
    ) -> Result<DetectedConversion, ConvertError> {
        let target = parse_grammar(target, "target")?;
        let detection = self.identifier.detect(code);
        let Some(source) = detection.grammar() else {
            let mut conversion = ConversionResult::empty("unknown", target.id());
            conversion.confidence = 0.0;
            conversion.warnings.push("Could not detect source language".to_string());
            return Ok(DetectedConversion {
                detection,
                conversion,
            });
        };
        let conversion = self.convert_grammars(code, source, target, strict)?;
        Ok(DetectedConversion {
            detection,
            conversion,
        })
    }
}

fn parse_grammar(id: &str, side: &'static str) -> Result<Grammar, ConvertError> {
    if id.trim().is_empty() {
        return Err(ConvertError::MissingGrammar { side });
    }
    Grammar::from_id(id).ok_or_else(|| ConvertError::UnknownGrammar(id.to_string()))
}

fn identity(code: &str, grammar: Grammar) -> ConversionResult {
    ConversionResult {
        code: code.to_string(),
        source: grammar.id().to_string(),
        target: grammar.id().to_string(),
        confidence: 1.0,
        warnings: vec!["Source and target languages are the same".to_string()],
        unsupported: Vec::new(),
        error_count: 0,
        level: ConversionLevel::Simple,
        metadata: Metadata {
            lines_processed: code.split('\n').count(),
            ..Metadata::default()
        },
    }
}

/// The original text, flagged, in place of a failed conversion.
fn degraded(code: &str, pair: GrammarPair, err: &PipelineError) -> ConversionResult {
    tracing::warn!(pair = %pair, error = %err, "conversion failed, returning original code");
    ConversionResult {
        code: code.to_string(),
        source: pair.source.id().to_string(),
        target: pair.target.id().to_string(),
        confidence: 0.0,
        warnings: vec![
            format!("Conversion error: {err}"),
            "Returned original code".to_string(),
        ],
        unsupported: Vec::new(),
        error_count: 0,
        level: ConversionLevel::Simple,
        metadata: Metadata {
            lines_processed: code.split('\n').count(),
            error: Some(err.to_string()),
            ..Metadata::default()
        },
    }
}
