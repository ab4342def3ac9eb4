//! Shared result printing for the text and JSON formats.

use colored::Colorize;
use serde::Serialize;

use crate::OutputFormat;

/// Print a result as pretty JSON. Text output is handled by each command.
pub fn print<T: Serialize>(value: &T, format: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    if let OutputFormat::Json = format {
        match serde_json::to_string_pretty(value) {
            Ok(json) => println!("{json}"),
            Err(e) => eprintln!("{}: {}", "Error".red().bold(), e),
        }
    }
}

pub fn success(message: &str, format: OutputFormat, quiet: bool) {
    if !quiet && matches!(format, OutputFormat::Text) {
        println!("{} {}", "✓".green().bold(), message);
    }
}

pub fn warning(message: &str, format: OutputFormat, quiet: bool) {
    if !quiet && matches!(format, OutputFormat::Text) {
        eprintln!("{} {}", "!".yellow().bold(), message);
    }
}
