use serde::{Deserialize, Serialize};

/// Which pair of surfaces a two-face measurement was taken between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairRelation {
    PlanePlane,
    AxisAxis,
    AxisPlane,
}

impl PairRelation {
    fn label(self) -> &'static str {
        match self {
            PairRelation::PlanePlane => "plane to plane",
            PairRelation::AxisAxis => "axis to axis",
            PairRelation::AxisPlane => "axis to plane",
        }
    }
}

/// Result of measuring the current selection.
///
/// Lengths are in the document's native unit; angles are in degrees and
/// never scale. Use [`Measurement::scaled`] to convert for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Measurement {
    Diameter { value: f64, arc_angle: f64 },
    Radius { value: f64, arc_angle: f64 },
    /// `axis_angle` annotates a distance between skew (non-parallel) axes.
    Distance {
        value: f64,
        between: PairRelation,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        axis_angle: Option<f64>,
    },
    Angle { degrees: f64, between: PairRelation },
    Incompatible { note: String },
}

impl Measurement {
    pub fn incompatible(note: impl Into<String>) -> Self {
        Measurement::Incompatible { note: note.into() }
    }

    /// The primary scalar, if any.
    pub fn value(&self) -> Option<f64> {
        match self {
            Measurement::Diameter { value, .. }
            | Measurement::Radius { value, .. }
            | Measurement::Distance { value, .. } => Some(*value),
            Measurement::Angle { degrees, .. } => Some(*degrees),
            Measurement::Incompatible { .. } => None,
        }
    }

    /// True when the value is a length and therefore unit-scale relative.
    pub fn is_length(&self) -> bool {
        matches!(
            self,
            Measurement::Diameter { .. } | Measurement::Radius { .. } | Measurement::Distance { .. }
        )
    }

    pub fn is_incompatible(&self) -> bool {
        matches!(self, Measurement::Incompatible { .. })
    }

    /// Multiply length values by `factor`. Angles and incompatible results are unchanged.
    pub fn scaled(&self, factor: f64) -> Self {
        match self.clone() {
            Measurement::Diameter { value, arc_angle } => Measurement::Diameter {
                value: value * factor,
                arc_angle,
            },
            Measurement::Radius { value, arc_angle } => Measurement::Radius {
                value: value * factor,
                arc_angle,
            },
            Measurement::Distance {
                value,
                between,
                axis_angle,
            } => Measurement::Distance {
                value: value * factor,
                between,
                axis_angle,
            },
            other => other,
        }
    }

    /// One-line human description, `unit` appended to lengths.
    pub fn describe(&self, unit: &str) -> String {
        match self {
            Measurement::Diameter { value, arc_angle } => {
                format!("diameter {value:.3} {unit} (arc {arc_angle:.1}°)")
            }
            Measurement::Radius { value, arc_angle } => {
                format!("radius {value:.3} {unit} (arc {arc_angle:.1}°)")
            }
            Measurement::Distance {
                value,
                between,
                axis_angle: Some(angle),
            } => format!(
                "distance {value:.3} {unit} ({}, skew at {angle:.2}°)",
                between.label()
            ),
            Measurement::Distance { value, between, .. } => {
                format!("distance {value:.3} {unit} ({})", between.label())
            }
            Measurement::Angle { degrees, between } => {
                format!("angle {degrees:.2}° ({})", between.label())
            }
            Measurement::Incompatible { note } => format!("incompatible: {note}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tagged_wire_form() {
        let m = Measurement::Distance {
            value: 5.0,
            between: PairRelation::PlanePlane,
            axis_angle: None,
        };
        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(json["kind"], "distance");
        assert_eq!(json["between"], "plane_plane");
        assert_eq!(json["value"], 5.0);
        assert!(json.get("axis_angle").is_none());
    }

    #[test]
    fn scaling_leaves_angles_alone() {
        let angle = Measurement::Angle {
            degrees: 30.0,
            between: PairRelation::AxisAxis,
        };
        assert_eq!(angle.scaled(25.4), angle);

        let radius = Measurement::Radius {
            value: 2.0,
            arc_angle: 90.0,
        };
        assert_eq!(radius.scaled(0.5).value(), Some(1.0));
        assert!(radius.is_length());
    }

    #[test]
    fn describe_mentions_unit() {
        let d = Measurement::Diameter {
            value: 6.0,
            arc_angle: 360.0,
        };
        assert_eq!(d.describe("mm"), "diameter 6.000 mm (arc 360.0°)");
        assert!(Measurement::incompatible("x").describe("mm").starts_with("incompatible"));
    }
}
