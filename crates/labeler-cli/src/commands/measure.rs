//! step-labeler measure - radius, diameter, distance or angle.

use std::path::Path;

use anyhow::Result;
use colored::Colorize;
use label_types::{FaceId, Measurement};
use serde::Serialize;

use crate::commands::{display_unit, open};
use crate::{output, Cli, OutputFormat};

#[derive(Serialize)]
struct MeasureResult {
    faces: Vec<FaceId>,
    unit: String,
    measurement: Measurement,
}

pub fn run(input: &Path, ids: &[u32], cli: &Cli) -> Result<()> {
    let (_kernel, session, _) = open(input, cli)?;
    let (unit, _) = display_unit(&session, cli);

    let faces: Vec<FaceId> = ids.iter().map(|&id| FaceId(id)).collect();
    let measurement = session.measure_in(&faces, &unit);
    let result = MeasureResult {
        faces,
        unit: unit.symbol().to_string(),
        measurement,
    };

    match cli.format {
        OutputFormat::Json => output::print(&result, cli.format, cli.quiet),
        OutputFormat::Text => {
            if !cli.quiet {
                let ids: Vec<String> = result.faces.iter().map(|f| f.to_string()).collect();
                let text = result.measurement.describe(&result.unit);
                if result.measurement.is_incompatible() {
                    println!("{}: {}", ids.join(" + ").cyan(), text.yellow());
                } else {
                    println!("{}: {}", ids.join(" + ").cyan(), text.bold());
                }
            }
        }
    }
    Ok(())
}
