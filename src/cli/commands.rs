//! CLI Command Implementations
//!
//! Runs a conversion and prints what was read and written.

use std::path::Path;

use log::{info, warn};

use crate::config::ConvertOptions;
use crate::convert::{Conversion, ConversionSummary};
use crate::error::{ChartError, Result};

/// Convert one chart file.
pub fn convert(input: &Path, options: &ConvertOptions) -> Result<ConversionSummary> {
    let conversion = Conversion::resolve(input, options)?;
    info!(
        "Converting {} to {}",
        input.display(),
        conversion.target.extension()
    );

    let summary = conversion.run()?;
    print_summary(&conversion, &summary);

    Ok(summary)
}

fn print_summary(conversion: &Conversion, summary: &ConversionSummary) {
    println!("Input chart: {}", conversion.input.display());
    if let Some(input) = &summary.input {
        println!("{}", input);
    }

    println!("Output chart: {}", summary.output_path.display());
    if let Some(output) = &summary.output {
        println!("{}", output);
    }

    let line = diagnostics_line(summary);
    if !line.is_empty() {
        warn!("{}", line);
    }
}

/// One-line tally of the non-fatal diagnostics a conversion raised
fn diagnostics_line(summary: &ConversionSummary) -> String {
    if summary.warnings.is_empty() {
        return String::new();
    }
    let dropped = summary
        .warnings
        .iter()
        .filter(|w| matches!(w, ChartError::UnknownNoteType { .. }))
        .count();
    format!(
        "{} non-fatal diagnostics ({} entries dropped); see warnings above",
        summary.warnings.len(),
        dropped
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn summary(warnings: Vec<ChartError>) -> ConversionSummary {
        ConversionSummary {
            output_path: PathBuf::from("song.xmk"),
            input: None,
            output: None,
            warnings,
        }
    }

    #[test]
    fn test_diagnostics_line_counts_only_drops() {
        let line = diagnostics_line(&summary(vec![
            ChartError::UnknownNoteType { code: 26, index: 3 },
            ChartError::OverlappingCrossfades { start: 1.5 },
        ]));
        assert_eq!(
            line,
            "2 non-fatal diagnostics (1 entries dropped); see warnings above"
        );
    }

    #[test]
    fn test_no_diagnostics() {
        assert!(diagnostics_line(&summary(Vec::new())).is_empty());
    }
}
