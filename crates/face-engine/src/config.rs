//! Configuration for loading and measuring.

use serde::{Deserialize, Serialize};

pub use brep_kernel::TessellationParams;

/// Tolerances used by the classifier and the measurement engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToleranceConfig {
    /// Directions count as parallel when `|d1·d2| > 1 - parallel`.
    pub parallel: f64,
    /// An axis counts as perpendicular to a plane normal when `|a·n| < perpendicular`.
    pub perpendicular: f64,
    /// Cross products shorter than this are treated as parallel.
    pub degenerate_cross: f64,
    /// Skew axes closer than this are treated as intersecting (model units).
    pub coincident: f64,
}

impl Default for ToleranceConfig {
    fn default() -> Self {
        Self {
            parallel: 1e-3,
            perpendicular: 0.01,
            degenerate_cross: 1e-9,
            coincident: 1e-6,
        }
    }
}

/// Everything a document load needs besides the STEP text.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub tessellation: TessellationParams,
    pub tolerance: ToleranceConfig,
}

impl EngineConfig {
    /// Coarse mesh without edge outlines, for quick previews of large files.
    pub fn preview() -> Self {
        Self {
            tessellation: TessellationParams {
                linear_deflection: 0.5,
                angular_deflection: 1.0,
                include_edges: false,
            },
            ..Self::default()
        }
    }

    /// Dense mesh for close inspection.
    pub fn fine() -> Self {
        Self {
            tessellation: TessellationParams {
                linear_deflection: 0.02,
                angular_deflection: 0.2,
                include_edges: true,
            },
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.tessellation.linear_deflection, 0.1);
        assert_eq!(config.tessellation.angular_deflection, 0.5);
        assert!(config.tessellation.include_edges);
        assert_eq!(config.tolerance.parallel, 1e-3);
        assert_eq!(config.tolerance.perpendicular, 0.01);
    }

    #[test]
    fn presets_only_change_tessellation() {
        assert!(!EngineConfig::preview().tessellation.include_edges);
        assert!(
            EngineConfig::fine().tessellation.linear_deflection
                < EngineConfig::default().tessellation.linear_deflection
        );
        assert_eq!(EngineConfig::fine().tolerance, ToleranceConfig::default());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"tessellation": {"linear_deflection": 0.05}}"#).unwrap();
        assert_eq!(config.tessellation.linear_deflection, 0.05);
        assert_eq!(config.tessellation.angular_deflection, 0.5);
        assert_eq!(config.tolerance, ToleranceConfig::default());
    }
}
