//! step-labeler faces - face table listing.

use std::path::Path;

use anyhow::{anyhow, Result};
use colored::Colorize;
use label_types::{FaceInfo, SurfaceKind};

use crate::commands::{display_unit, open};
use crate::{output, Cli, OutputFormat};

pub fn run(input: &Path, kind: Option<&str>, cli: &Cli) -> Result<()> {
    let kind = kind.map(parse_kind).transpose()?;
    let (_kernel, session, _) = open(input, cli)?;
    let (unit, scale) = display_unit(&session, cli);

    let faces: Vec<&FaceInfo> = session
        .faces()
        .iter()
        .filter(|f| kind.map_or(true, |k| f.surface_type == k))
        .collect();

    match cli.format {
        OutputFormat::Json => output::print(&faces, cli.format, cli.quiet),
        OutputFormat::Text => {
            if cli.quiet {
                return Ok(());
            }
            println!(
                "{}",
                format!("{:>5}  {:<12} {:>12}  {:<24} {}", "id", "type", "area", "centroid", "name")
                    .bold()
            );
            for face in faces {
                let centroid = face.centroid.map(|c| c * scale);
                let mut line = format!(
                    "{:>5}  {:<12} {:>12.3}  ({:.2}, {:.2}, {:.2})",
                    face.id,
                    face.surface_type.as_str(),
                    face.area * scale * scale,
                    centroid[0],
                    centroid[1],
                    centroid[2],
                );
                if let Some(radius) = face.radius {
                    line.push_str(&format!("  r={:.3} {unit}", radius * scale));
                }
                if let Some(arc) = face.arc_angle {
                    line.push_str(&format!(" arc={arc:.1}°"));
                }
                match &face.step_name {
                    Some(name) => println!("{line}  {}", name.green()),
                    None => println!("{line}"),
                }
            }
        }
    }
    Ok(())
}

fn parse_kind(text: &str) -> Result<SurfaceKind> {
    let wanted = text.trim().to_ascii_lowercase();
    SurfaceKind::ALL
        .into_iter()
        .find(|k| k.as_str() == wanted)
        .ok_or_else(|| {
            let known: Vec<&str> = SurfaceKind::ALL.iter().map(|k| k.as_str()).collect();
            anyhow!("unknown surface type {text:?}; expected one of {}", known.join(", "))
        })
}
