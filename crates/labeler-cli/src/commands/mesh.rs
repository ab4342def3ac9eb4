//! step-labeler mesh - dump the indexed triangle buffer.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;

use crate::commands::open;
use crate::{output, Cli, OutputFormat};

#[derive(Serialize)]
struct MeshResult {
    input: String,
    output: String,
    faces: usize,
    triangles: usize,
    edge_segments: usize,
}

pub fn run(input: &Path, output_path: &Path, cli: &Cli) -> Result<()> {
    let (_kernel, session, _) = open(input, cli)?;
    let mesh = session.mesh();

    let json = serde_json::to_string(mesh).context("Failed to serialize mesh")?;
    std::fs::write(output_path, json)
        .with_context(|| format!("Failed to write mesh to {}", output_path.display()))?;

    let result = MeshResult {
        input: input.display().to_string(),
        output: output_path.display().to_string(),
        faces: mesh.num_faces,
        triangles: mesh.triangle_count(),
        edge_segments: mesh.edges.len() / 6,
    };

    match cli.format {
        OutputFormat::Json => output::print(&result, cli.format, cli.quiet),
        OutputFormat::Text => {
            output::success(
                &format!("Mesh written to {}", output_path.display()),
                cli.format,
                cli.quiet,
            );
            if !cli.quiet {
                println!("  {}: {}", "Faces".cyan(), result.faces);
                println!("  {}: {}", "Triangles".cyan(), result.triangles);
                println!("  {}: {}", "Edge segments".cyan(), result.edge_segments);
            }
        }
    }
    Ok(())
}
