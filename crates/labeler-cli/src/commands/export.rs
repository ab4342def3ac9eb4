//! step-labeler export - write feature names into a copy of the file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use colored::Colorize;
use label_types::{FaceId, FeatureMap};
use serde::Serialize;

use crate::commands::{check_extension, open};
use crate::{output, Cli, OutputFormat};

#[derive(Serialize)]
struct ExportResult {
    input: String,
    output: String,
    renamed: Vec<(FaceId, String)>,
    skipped: Vec<FaceId>,
}

pub fn run(input: &Path, features_path: &Path, output_path: Option<&Path>, cli: &Cli) -> Result<()> {
    let features_json = std::fs::read_to_string(features_path)
        .with_context(|| format!("Failed to read feature map {}", features_path.display()))?;
    let features: FeatureMap = serde_json::from_str(&features_json)
        .with_context(|| format!("Invalid feature map {}", features_path.display()))?;

    let (_kernel, session, _) = open(input, cli)?;
    let output_path = match output_path {
        Some(path) => path.to_path_buf(),
        None => named_output_path(input)?,
    };

    let outcome = session
        .export_with(&features)
        .with_context(|| format!("Failed to export {}", input.display()))?;
    std::fs::write(&output_path, &outcome.text)
        .with_context(|| format!("Failed to write {}", output_path.display()))?;

    let result = ExportResult {
        input: input.display().to_string(),
        output: output_path.display().to_string(),
        renamed: outcome.renamed,
        skipped: outcome.skipped,
    };

    match cli.format {
        OutputFormat::Json => output::print(&result, cli.format, cli.quiet),
        OutputFormat::Text => {
            output::success(
                &format!(
                    "Named {} faces in {}",
                    result.renamed.len(),
                    output_path.display()
                ),
                cli.format,
                cli.quiet,
            );
            if !cli.quiet {
                for (face, name) in &result.renamed {
                    println!("  {:>5} {}", face.to_string().cyan(), name);
                }
            }
            if !result.skipped.is_empty() {
                let ids: Vec<String> = result.skipped.iter().map(|f| f.to_string()).collect();
                output::warning(
                    &format!(
                        "{} faces have no ADVANCED_FACE entity and were left unnamed: {}",
                        result.skipped.len(),
                        ids.join(", ")
                    ),
                    cli.format,
                    cli.quiet,
                );
            }
        }
    }
    Ok(())
}

/// `dir/part.step` becomes `dir/part_named.step`.
fn named_output_path(input: &Path) -> Result<PathBuf> {
    check_extension(input)?;
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .context("Input file name is not valid UTF-8")?;
    let ext = input.extension().and_then(|e| e.to_str()).unwrap_or("step");
    Ok(input.with_file_name(format!("{stem}_named.{ext}")))
}
