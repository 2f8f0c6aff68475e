//! Console output for the command line.

use colored::Colorize;
use serde::Serialize;

use crate::batch::BatchSummary;
use crate::pipeline::StructureOutcome;
use crate::OutputFormat;

/// Print a serializable value as pretty JSON. Text output is left to the caller.
pub fn print<T: Serialize>(value: &T, format: OutputFormat, quiet: bool) {
    if quiet || format != OutputFormat::Json {
        return;
    }

    if let Ok(json) = serde_json::to_string_pretty(value) {
        println!("{}", json);
    }
}

/// Print a success message.
pub fn success(msg: &str, format: OutputFormat, quiet: bool) {
    if quiet || format != OutputFormat::Text {
        return;
    }
    println!("{} {}", "✓".green().bold(), msg);
}

/// Print a warning message.
pub fn warning(msg: &str, format: OutputFormat, quiet: bool) {
    if quiet || format != OutputFormat::Text {
        return;
    }
    eprintln!("{} {}", "⚠".yellow().bold(), msg);
}

/// Print the totals of a batch run and the structures that failed.
pub fn summary(summary: &BatchSummary, format: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }

    match format {
        OutputFormat::Json => print(summary, format, quiet),
        OutputFormat::Text => {
            println!("{}", "Batch summary".bold());
            println!("  Processed: {}", summary.processed);
            println!("  Wrapped:   {}", summary.wrapped);
            println!("  Fallbacks: {}", summary.fallbacks);
            let failed = format!("  Failed:    {}", summary.failed);
            if summary.failed > 0 {
                println!("{}", failed.red());
            } else {
                println!("{}", failed);
            }

            for outcome in summary.failures() {
                if let StructureOutcome::Failed {
                    organ,
                    structure,
                    reason,
                } = outcome
                {
                    warning(&format!("{}/{}: {}", organ, structure, reason), format, quiet);
                }
            }

            if summary.failed == 0 {
                success("All structures processed", format, quiet);
            }
        }
    }
}
