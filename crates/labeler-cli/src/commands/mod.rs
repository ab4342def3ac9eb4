pub mod export;
pub mod faces;
pub mod info;
pub mod measure;
pub mod mesh;

use std::path::Path;

use anyhow::{bail, Context, Result};
use brep_kernel::TruckKernel;
use face_engine::{LabelSession, LengthUnit, LoadInfo};

use crate::Cli;

/// Read and load a STEP file. The kernel is returned because the session's
/// face ids refer into it.
pub fn open(input: &Path, cli: &Cli) -> Result<(TruckKernel, LabelSession, LoadInfo)> {
    check_extension(input)?;
    let text = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;

    let mut kernel = TruckKernel::new();
    let (session, info) = LabelSession::load(&mut kernel, &text, cli.engine_config())
        .with_context(|| format!("Failed to load {}", input.display()))?;
    Ok((kernel, session, info))
}

/// Only `.step` / `.stp` files are accepted.
pub fn check_extension(path: &Path) -> Result<()> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("step" | "stp") => Ok(()),
        _ => bail!("{} is not a STEP file (.step or .stp)", path.display()),
    }
}

/// Unit lengths are shown in, and the factor from document units to it.
pub fn display_unit(session: &LabelSession, cli: &Cli) -> (LengthUnit, f64) {
    match &cli.unit {
        Some(unit) => (unit.clone(), session.units().scale_to(unit)),
        None => (session.units().unit.clone(), 1.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_step_extensions_in_any_case() {
        assert!(check_extension(Path::new("a/part.step")).is_ok());
        assert!(check_extension(Path::new("part.STP")).is_ok());
        assert!(check_extension(Path::new("part.stl")).is_err());
        assert!(check_extension(Path::new("part")).is_err());
    }
}
