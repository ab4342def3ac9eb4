use std::fmt;

use serde::{Deserialize, Serialize};

/// Canonical face identity: the 0-based position of the face in kernel
/// traversal order. Assigned once per loaded document, never recomputed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FaceId(pub u32);

impl FaceId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl From<usize> for FaceId {
    fn from(index: usize) -> Self {
        FaceId(index as u32)
    }
}

impl From<u32> for FaceId {
    fn from(raw: u32) -> Self {
        FaceId(raw)
    }
}

impl fmt::Display for FaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Surface classification of a face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceKind {
    Planar,
    Cylindrical,
    Conical,
    Spherical,
    Toroidal,
    #[serde(rename = "bspline")]
    BSpline,
    Bezier,
    Revolution,
    Extrusion,
    Offset,
    Other,
}

impl SurfaceKind {
    /// All kinds, in a fixed order.
    pub const ALL: [SurfaceKind; 11] = [
        SurfaceKind::Planar,
        SurfaceKind::Cylindrical,
        SurfaceKind::Conical,
        SurfaceKind::Spherical,
        SurfaceKind::Toroidal,
        SurfaceKind::BSpline,
        SurfaceKind::Bezier,
        SurfaceKind::Revolution,
        SurfaceKind::Extrusion,
        SurfaceKind::Offset,
        SurfaceKind::Other,
    ];

    /// The lowercase tag used on the wire and as the default sub-name of a
    /// feature member.
    pub fn as_str(self) -> &'static str {
        match self {
            SurfaceKind::Planar => "planar",
            SurfaceKind::Cylindrical => "cylindrical",
            SurfaceKind::Conical => "conical",
            SurfaceKind::Spherical => "spherical",
            SurfaceKind::Toroidal => "toroidal",
            SurfaceKind::BSpline => "bspline",
            SurfaceKind::Bezier => "bezier",
            SurfaceKind::Revolution => "revolution",
            SurfaceKind::Extrusion => "extrusion",
            SurfaceKind::Offset => "offset",
            SurfaceKind::Other => "other",
        }
    }
}

impl fmt::Display for SurfaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

impl Aabb {
    /// An inverted box that any `include` call will overwrite.
    pub fn empty() -> Self {
        Self {
            min: [f64::INFINITY; 3],
            max: [f64::NEG_INFINITY; 3],
        }
    }

    pub fn is_empty(&self) -> bool {
        (0..3).any(|i| self.min[i] > self.max[i])
    }

    pub fn include(&mut self, p: [f64; 3]) {
        for i in 0..3 {
            self.min[i] = self.min[i].min(p[i]);
            self.max[i] = self.max[i].max(p[i]);
        }
    }

    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a [f64; 3]>) -> Self {
        let mut bounds = Self::empty();
        for p in points {
            bounds.include(*p);
        }
        bounds
    }

    /// The six scalars `[xmin, ymin, zmin, xmax, ymax, zmax]`, or zeros when empty.
    pub fn to_array(&self) -> [f64; 6] {
        if self.is_empty() {
            return [0.0; 6];
        }
        [
            self.min[0], self.min[1], self.min[2], self.max[0], self.max[1], self.max[2],
        ]
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::empty()
    }
}

/// Per-face metadata record handed to the renderer and the measurement engine.
///
/// The cylinder fields (`radius`, `axis_point`, `axis_direction`, `arc_angle`)
/// are `None` for every other surface type and for degenerate cylinders.
/// Callers treat `None` as "unmeasurable".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceInfo {
    pub id: FaceId,
    pub surface_type: SurfaceKind,
    pub area: f64,
    pub centroid: [f64; 3],
    /// Exact for planar faces, averaged otherwise.
    pub normal: [f64; 3],
    /// `[xmin, ymin, zmin, xmax, ymax, zmax]`.
    pub bounds: [f64; 6],
    pub radius: Option<f64>,
    pub axis_point: Option<[f64; 3]>,
    /// Unit vector with a canonical sign.
    pub axis_direction: Option<[f64; 3]>,
    /// Degrees; 360 for a full cylinder.
    pub arc_angle: Option<f64>,
    /// Name already present on the corresponding STEP entity, if any.
    pub step_name: Option<String>,
}

impl FaceInfo {
    /// A record with only identity and type set. Everything else is zero or `None`.
    pub fn bare(id: FaceId, surface_type: SurfaceKind) -> Self {
        Self {
            id,
            surface_type,
            area: 0.0,
            centroid: [0.0; 3],
            normal: [0.0; 3],
            bounds: [0.0; 6],
            radius: None,
            axis_point: None,
            axis_direction: None,
            arc_angle: None,
            step_name: None,
        }
    }

    /// `(axis_point, axis_direction, radius)` when this face is a measurable cylinder.
    pub fn cylinder_axis(&self) -> Option<([f64; 3], [f64; 3], f64)> {
        match (self.surface_type, self.axis_point, self.axis_direction, self.radius) {
            (SurfaceKind::Cylindrical, Some(p), Some(d), Some(r)) => Some((p, d, r)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surface_kind_wire_names() {
        for kind in SurfaceKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }

    #[test]
    fn face_id_is_transparent_on_the_wire() {
        assert_eq!(serde_json::to_string(&FaceId(7)).unwrap(), "7");
        let id: FaceId = serde_json::from_str("12").unwrap();
        assert_eq!(id, FaceId(12));
    }

    #[test]
    fn empty_bounds_serialize_as_zeros() {
        assert_eq!(Aabb::empty().to_array(), [0.0; 6]);
        let b = Aabb::from_points(&[[1.0, -2.0, 3.0], [-1.0, 2.0, 0.0]]);
        assert_eq!(b.to_array(), [-1.0, -2.0, 0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn cylinder_axis_requires_all_fields() {
        let mut info = FaceInfo::bare(FaceId(0), SurfaceKind::Cylindrical);
        assert!(info.cylinder_axis().is_none());
        info.radius = Some(2.0);
        info.axis_point = Some([0.0; 3]);
        info.axis_direction = Some([0.0, 0.0, 1.0]);
        assert_eq!(info.cylinder_axis(), Some(([0.0; 3], [0.0, 0.0, 1.0], 2.0)));
    }
}
