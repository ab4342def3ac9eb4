//! step-labeler info - document summary.

use std::path::Path;

use anyhow::Result;
use colored::Colorize;
use label_types::SurfaceKind;
use serde::Serialize;

use crate::commands::open;
use crate::{output, Cli, OutputFormat};

#[derive(Serialize)]
struct DocumentInfo {
    path: String,
    #[serde(flatten)]
    load: face_engine::LoadInfo,
    untessellated: usize,
    surface_kinds: Vec<KindCount>,
}

#[derive(Serialize)]
struct KindCount {
    kind: SurfaceKind,
    count: usize,
}

pub fn run(input: &Path, cli: &Cli) -> Result<()> {
    let (_kernel, session, load) = open(input, cli)?;

    let surface_kinds = SurfaceKind::ALL
        .iter()
        .map(|&kind| KindCount {
            kind,
            count: session.faces_by_kind(kind).count(),
        })
        .filter(|k| k.count > 0)
        .collect();
    let info = DocumentInfo {
        path: input.display().to_string(),
        load,
        untessellated: session.untessellated().len(),
        surface_kinds,
    };

    match cli.format {
        OutputFormat::Json => output::print(&info, cli.format, cli.quiet),
        OutputFormat::Text => {
            if !cli.quiet {
                println!("{}", "STEP Document".bold().underline());
                println!("  {}: {}", "File".cyan(), info.path);
                println!("  {}: {}", "Faces".cyan(), info.load.num_faces);
                println!(
                    "  {}: {}",
                    "ADVANCED_FACE entities".cyan(),
                    info.load.num_step_entities
                );
                println!("  {}: {}", "Triangles".cyan(), info.load.triangle_count);
                println!(
                    "  {}: {} ({} mm per unit)",
                    "Length unit".cyan(),
                    info.load.length_unit,
                    info.load.length_scale
                );
                for k in &info.surface_kinds {
                    println!("    {:<12} {}", k.kind.as_str(), k.count);
                }
            }
            if info.load.num_unmapped > 0 {
                output::warning(
                    &format!(
                        "{} faces have no ADVANCED_FACE entity and cannot be named",
                        info.load.num_unmapped
                    ),
                    cli.format,
                    cli.quiet,
                );
            }
            if info.untessellated > 0 {
                output::warning(
                    &format!("{} faces could not be tessellated", info.untessellated),
                    cli.format,
                    cli.quiet,
                );
            }
        }
    }

    Ok(())
}
