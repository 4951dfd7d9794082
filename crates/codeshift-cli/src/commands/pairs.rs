use crate::config::OutputFormat;
use codeshift::ConversionCoordinator;

/// Print the registered conversion pairs, one per line.
pub fn run(coordinator: &ConversionCoordinator, format: OutputFormat) -> anyhow::Result<()> {
    let pairs = coordinator.supported_pairs();
    match format {
        OutputFormat::Json => super::print_json(&pairs),
        OutputFormat::Text => {
            for pair in pairs {
                println!("{pair}");
            }
            Ok(())
        }
    }
}
