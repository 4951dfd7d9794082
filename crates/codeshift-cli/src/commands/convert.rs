//! Convert command - translate a file or stdin between languages.

use crate::config::OutputFormat;
use anyhow::Context;
use clap::Args;
use codeshift::{ConversionCoordinator, ConversionResult, Grammar};
use std::path::{Path, PathBuf};

#[derive(Args)]
pub struct ConvertArgs {
    /// Input file, use - for stdin
    #[arg(default_value = "-")]
    pub input: PathBuf,

    /// Target language
    #[arg(short, long)]
    pub to: String,

    /// Source language (from the file extension, then detection, if omitted)
    #[arg(short, long)]
    pub from: Option<String>,

    /// Warn when constructs without a counterpart are found
    #[arg(long)]
    pub strict: bool,

    /// Output file (stdout if not specified)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn run(
    coordinator: &ConversionCoordinator,
    args: &ConvertArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let code = super::read_input(&args.input)?;

    let (detection, result) = match source_language(args) {
        Some(source) => {
            let result = coordinator.convert(&code, &source, &args.to, args.strict)?;
            (None, result)
        }
        None => {
            let out = coordinator.detect_and_convert(&code, &args.to, args.strict)?;
            tracing::debug!(language = %out.detection.language, "detected source language");
            (Some(out.detection), out.conversion)
        }
    };

    if let Some(path) = &args.output {
        std::fs::write(path, &result.code)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    match format {
        OutputFormat::Json => match detection {
            Some(detection) => super::print_json(&codeshift::DetectedConversion {
                detection,
                conversion: result,
            }),
            None => super::print_json(&result),
        },
        OutputFormat::Text => {
            if args.output.is_none() {
                print!("{}", with_newline(&result.code));
            }
            report(&result, args.output.as_deref());
            Ok(())
        }
    }
}

/// `--from`, else the grammar implied by the input's extension.
fn source_language(args: &ConvertArgs) -> Option<String> {
    args.from.clone().or_else(|| {
        args.input
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Grammar::from_extension)
            .map(|grammar| grammar.id().to_string())
    })
}

fn with_newline(code: &str) -> String {
    if code.is_empty() || code.ends_with('\n') {
        code.to_string()
    } else {
        format!("{code}\n")
    }
}

/// Warnings and a one-line summary, on stderr.
fn report(result: &ConversionResult, output: Option<&Path>) {
    for warning in &result.warnings {
        eprintln!("warning: {warning}");
    }
    let destination = output
        .map(|path| format!(" -> {}", path.display()))
        .unwrap_or_default();
    eprintln!(
        "{} -> {}{destination} (confidence {:.2}, {} unsupported)",
        result.source,
        result.target,
        result.confidence,
        result.unsupported.len()
    );
}
