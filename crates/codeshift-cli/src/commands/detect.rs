//! Detect command - identify the language of a snippet.

use crate::config::OutputFormat;
use clap::Args;
use codeshift::{ConversionCoordinator, DetectionResult};
use std::path::PathBuf;

#[derive(Args)]
pub struct DetectArgs {
    /// Input file, use - for stdin
    #[arg(default_value = "-")]
    pub input: PathBuf,
}

pub fn run(
    coordinator: &ConversionCoordinator,
    args: &DetectArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let code = super::read_input(&args.input)?;
    let detection = coordinator.detect(&code);
    match format {
        OutputFormat::Json => super::print_json(&detection),
        OutputFormat::Text => {
            print!("{}", render(&detection));
            Ok(())
        }
    }
}

fn render(detection: &DetectionResult) -> String {
    let mut out = format!(
        "{} ({:.2})\n{}\n",
        detection.language, detection.confidence, detection.justification
    );
    if !detection.alternatives.is_empty() {
        let alternatives: Vec<String> = detection
            .alternatives
            .iter()
            .map(|alt| format!("{} ({:.2})", alt.language, alt.confidence))
            .collect();
        out.push_str(&format!("alternatives: {}\n", alternatives.join(", ")));
    }
    out
}
