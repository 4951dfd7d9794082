//! Layered configuration.
//!
//! Files are applied in order, later files overriding earlier ones key by key:
//!
//! 1. `<config dir>/codeshift/config.toml` (e.g. `~/.config/codeshift/config.toml`)
//! 2. `.codeshift/config.toml` in the working directory
//! 3. the file passed with `--config`
//!
//! ```toml
//! [convert]
//! strict = true
//! max_lines = 5000
//!
//! [output]
//! format = "json"
//! ```

use codeshift::ConvertOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config in {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid merged config: {0}")]
    Merge(#[source] toml::de::Error),
}

/// How command results are printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodeshiftConfig {
    pub convert: ConvertOptions,
    pub output: OutputConfig,
}

impl CodeshiftConfig {
    /// Load the global and project files, then `explicit` if given.
    pub fn load(project_root: &Path, explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut layers = Vec::new();
        if let Some(dir) = dirs::config_dir() {
            layers.push(dir.join("codeshift").join("config.toml"));
        }
        layers.push(project_root.join(".codeshift").join("config.toml"));
        Self::load_layers(&layers, explicit)
    }

    /// Merge `layers` in order, skipping missing files. `explicit` must exist.
    pub fn load_layers(layers: &[PathBuf], explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut merged = toml::Table::new();
        for path in layers {
            if path.is_file() {
                merge(&mut merged, read_table(path)?);
            }
        }
        if let Some(path) = explicit {
            merge(&mut merged, read_table(path)?);
        }
        tracing::debug!(keys = merged.len(), "loaded config");
        toml::Value::Table(merged)
            .try_into()
            .map_err(ConfigError::Merge)
    }
}

/// Read one file and check it against the schema on its own, so errors name
/// the file that caused them.
fn read_table(path: &Path) -> Result<toml::Table, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let parse_error = |source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    };
    let table: toml::Table = toml::from_str(&content).map_err(parse_error)?;
    toml::from_str::<CodeshiftConfig>(&content).map_err(parse_error)?;
    Ok(table)
}

fn merge(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(table)) => {
                merge(existing, table)
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}
