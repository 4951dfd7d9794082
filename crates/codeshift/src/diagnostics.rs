//! Warnings and unsupported-construct records collected during a conversion.

use serde::Serialize;

/// Severity of an unsupported-construct record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

/// A construct the pipeline could not convert faithfully.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnsupportedConstruct {
    /// 1-based source line.
    pub line: usize,
    /// Construct kind or keyword the record is about.
    pub construct: String,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Append-only collector for one conversion call.
///
/// Identical warning strings are stored once.
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<String>,
    unsupported: Vec<UnsupportedConstruct>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a free-text warning.
    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        if !self.warnings.contains(&message) {
            self.warnings.push(message);
        }
    }

    /// Add a structured record.
    pub fn record(
        &mut self,
        line: usize,
        construct: impl Into<String>,
        severity: Severity,
        detail: Option<String>,
    ) {
        self.unsupported.push(UnsupportedConstruct {
            line,
            construct: construct.into(),
            severity,
            detail,
        });
    }

    pub fn type_hint_removed(&mut self, line: usize, hint: &str) {
        self.warn(format!(
            "Line {line}: Type hint '{hint}' removed (not applicable in JavaScript)"
        ));
    }

    pub fn decorator(&mut self, line: usize, decorator: &str) {
        self.warn(format!(
            "Line {line}: Decorator '@{decorator}' may need manual conversion to higher-order function"
        ));
    }

    pub fn comprehension(&mut self, line: usize, original: &str) {
        self.warn(format!(
            "Line {line}: List comprehension converted to .map()/.filter() - verify logic matches"
        ));
        self.record(
            line,
            "list comprehension",
            Severity::Warning,
            Some(original.to_string()),
        );
    }

    pub fn unpacking(&mut self, line: usize, construct: &str) {
        self.warn(format!(
            "Line {line}: {construct} unpacking not directly supported - converted to rest parameters, manual review needed"
        ));
        self.record(line, construct, Severity::Warning, None);
    }

    pub fn docstring(&mut self, line: usize) {
        self.warn(format!(
            "Line {line}: Docstring converted to JSDoc comment - verify formatting"
        ));
    }

    /// A keyword or construct with no counterpart. Counts as an error.
    pub fn unsupported_keyword(&mut self, line: usize, keyword: &str, reason: &str) {
        if reason.is_empty() {
            self.warn(format!("Line {line}: '{keyword}' not supported"));
            self.record(line, keyword, Severity::Error, None);
        } else {
            self.warn(format!("Line {line}: '{keyword}' - {reason}"));
            self.record(line, keyword, Severity::Error, Some(reason.to_string()));
        }
    }

    /// A construct that was deliberately left unconverted. Recorded once per
    /// line and construct.
    pub fn left_unconverted(&mut self, line: usize, construct: &str, reason: &str) {
        if self
            .unsupported
            .iter()
            .any(|u| u.line == line && u.construct == construct)
        {
            return;
        }
        self.warn(format!("Line {line}: {construct} left unconverted - {reason}"));
        self.record(
            line,
            construct,
            Severity::Warning,
            Some(reason.to_string()),
        );
    }

    pub fn conversion_issue(&mut self, line: usize, issue: &str) {
        self.warn(format!("Line {line}: {issue}"));
    }

    /// A member call whose counterpart is missing in the target grammar.
    pub fn mapping_gap(&mut self, line: usize, name: &str, reason: &str) {
        self.warn(format!(
            "Line {line}: '{name}' has no direct equivalent ({reason})"
        ));
        self.record(
            line,
            format!("method '{name}'"),
            Severity::Warning,
            Some(reason.to_string()),
        );
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn unsupported(&self) -> &[UnsupportedConstruct] {
        &self.unsupported
    }

    /// Number of error-severity records.
    pub fn error_count(&self) -> usize {
        self.unsupported
            .iter()
            .filter(|u| u.severity == Severity::Error)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty() && self.unsupported.is_empty()
    }

    pub fn into_parts(self) -> (Vec<String>, Vec<UnsupportedConstruct>) {
        (self.warnings, self.unsupported)
    }
}
