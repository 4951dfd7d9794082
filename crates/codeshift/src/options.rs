//! Conversion options.

use serde::{Deserialize, Serialize};

/// Limits and flags applied to one conversion.
///
/// Deserializes from a `[convert]` config table; missing keys take defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertOptions {
    /// Prepend an advisory warning when error-severity constructs are found.
    /// Conversion always runs to completion.
    pub strict: bool,
    /// Inputs with more lines are rejected by the pipeline.
    pub max_lines: usize,
    /// Deepest block nesting the pipeline accepts.
    pub max_depth: usize,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            strict: false,
            max_lines: 10_000,
            max_depth: 64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_table_uses_defaults() {
        let options: ConvertOptions = serde_json::from_str(r#"{"strict": true}"#).unwrap();
        assert!(options.strict);
        assert_eq!(options.max_lines, 10_000);
        assert_eq!(options.max_depth, 64);
    }
}
