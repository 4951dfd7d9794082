//! `codeshift` command-line interface.

mod commands;
mod config;

use anyhow::Context;
use clap::{Parser, Subcommand};
use codeshift::ConversionCoordinator;
use config::{CodeshiftConfig, OutputFormat};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "codeshift",
    version,
    about = "Line-level conversion between python and javascript"
)]
struct Cli {
    /// Output format (defaults to the configured format, then text)
    #[arg(long, global = true, value_enum)]
    format: Option<OutputFormat>,

    /// Config file applied after the global and project config
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Identify the language of a file or stdin
    Detect(commands::detect::DetectArgs),
    /// Convert a file or stdin to another language
    Convert(commands::convert::ConvertArgs),
    /// List supported conversion pairs
    Pairs,
}

/// Log to stderr, filtered by `CODESHIFT_LOG` (default `warn`).
fn init_tracing() {
    let filter = EnvFilter::try_from_env("CODESHIFT_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir().context("failed to read working directory")?;
    let config = CodeshiftConfig::load(&cwd, cli.config.as_deref())?;
    let format = cli.format.unwrap_or(config.output.format);
    let coordinator = ConversionCoordinator::new(config.convert);

    match cli.command {
        Command::Detect(args) => commands::detect::run(&coordinator, &args, format),
        Command::Convert(args) => commands::convert::run(&coordinator, &args, format),
        Command::Pairs => commands::pairs::run(&coordinator, format),
    }
}
