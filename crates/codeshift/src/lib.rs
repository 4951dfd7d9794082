//! Rule-based, line-level translation between programming-language grammars.
//!
//! `codeshift` converts source text between an indentation-delimited grammar
//! (python) and a brace-delimited grammar (javascript), and guesses which
//! grammar a snippet is written in. It maps lines, not semantics: there is no
//! parser and no AST.
//!
//! # Architecture
//!
//! ```text
//! source text ─> IndentationTracker ─> RuleRegistry ─> Rule ─> target text
//!                  (block.rs)          (rules/)        │
//!                                                      ├─ MethodNameMapper (methods.rs)
//!                                                      └─ Diagnostics (diagnostics.rs)
//!
//!                ConversionPipeline (pipeline.rs) ─> confidence (confidence.rs)
//!                ConversionCoordinator (coordinator.rs) ─ LanguageIdentifier (detect.rs)
//! ```
//!
//! # Example
//!
//! ```
//! use codeshift::{ConversionCoordinator, ConvertOptions};
//!
//! let coordinator = ConversionCoordinator::new(ConvertOptions::default());
//! let result = coordinator
//!     .convert("x = 5", "python", "javascript", false)
//!     .unwrap();
//! assert_eq!(result.code, "let x = 5;");
//! ```
//!
//! # Fidelity
//!
//! Every line of input yields output. Lines no rule understands get a
//! token-level fallback, and everything that could not be converted
//! faithfully is reported through warnings and unsupported-construct
//! records. The confidence score is a heuristic, not a correctness check.

pub mod block;
pub mod confidence;
pub mod coordinator;
pub mod detect;
pub mod diagnostics;
pub mod grammar;
pub mod line;
pub mod methods;
pub mod options;
pub mod pipeline;
pub mod rules;

// Re-exports: entry points
pub use coordinator::{ConversionCoordinator, ConvertError, DetectedConversion, RegistryBuilder};
pub use detect::{Alternative, DetectionResult, LanguageIdentifier};
pub use options::ConvertOptions;
pub use pipeline::{ConversionPipeline, ConversionResult, Metadata, PipelineError};

// Re-exports: model
pub use diagnostics::{Diagnostics, Severity, UnsupportedConstruct};
pub use grammar::{Grammar, GrammarPair};
pub use line::{ConstructKind, ConversionLevel};
pub use methods::{Direction, MethodCategory, MethodNameMapper};
pub use rules::{RuleError, RuleRegistry};
