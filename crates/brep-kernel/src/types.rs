use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

pub use label_types::Aabb;

/// Opaque handle to a solid in the geometry kernel.
/// NEVER persisted. Valid only until the solid is unloaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KernelSolidHandle(pub(crate) u64);

impl KernelSolidHandle {
    pub(crate) fn id(&self) -> u64 {
        self.0
    }
}

/// Transient kernel-internal entity identifier.
/// Unique within one kernel instance. Documents key faces by traversal
/// position instead, see `label_types::FaceId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KernelId(pub u64);

/// Errors from kernel operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum KernelError {
    #[error("STEP parse failed: {reason}")]
    StepParse { reason: String },

    #[error("no shells found in STEP data")]
    NoShells,

    #[error("tessellation failed: {reason}")]
    TessellationFailed { reason: String },

    #[error("entity not found: {id:?}")]
    EntityNotFound { id: KernelId },

    #[error("operation not supported: {operation}")]
    NotSupported { operation: String },

    #[error("kernel error: {message}")]
    Other { message: String },
}

/// Mesh controls shared by face tessellation and edge discretization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TessellationParams {
    /// Maximum chordal deviation, in model units.
    pub linear_deflection: f64,
    /// Maximum angle between adjacent segment normals, in radians.
    pub angular_deflection: f64,
    /// Whether topological edges are discretized for outline display.
    pub include_edges: bool,
}

impl Default for TessellationParams {
    fn default() -> Self {
        Self {
            linear_deflection: 0.1,
            angular_deflection: 0.5,
            include_edges: true,
        }
    }
}

/// The kernel's native description of the surface under a face.
///
/// Directions are unit vectors as reported by the kernel; no sign
/// convention is applied here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SurfaceGeometry {
    Plane {
        origin: [f64; 3],
        /// Normal of the underlying surface.
        normal: [f64; 3],
        /// True when the face is oriented against the surface normal.
        reversed: bool,
    },
    Cylinder {
        axis_point: [f64; 3],
        axis_direction: [f64; 3],
        radius: f64,
        /// Parametric angle range covered by the face, radians.
        u_range: (f64, f64),
    },
    Cone {
        apex: [f64; 3],
        axis_direction: [f64; 3],
        half_angle: f64,
    },
    Sphere {
        center: [f64; 3],
        radius: f64,
    },
    Torus {
        center: [f64; 3],
        axis_direction: [f64; 3],
        major_radius: f64,
        minor_radius: f64,
    },
    BSpline,
    Bezier,
    Revolution,
    Extrusion,
    Offset,
    Unknown,
}

/// Mass and extent properties of one face.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaceProperties {
    pub area: f64,
    /// Center of mass of the face.
    pub centroid: [f64; 3],
    /// Area-weighted mean of the outward normal.
    pub mean_normal: [f64; 3],
    pub bounds: Aabb,
}

/// Triangle mesh of a single face.
///
/// Triangles are wound for the underlying surface; `reversed` says the face
/// uses the opposite orientation and consumers must flip winding and normals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FaceMesh {
    pub positions: Vec<[f64; 3]>,
    /// Per-vertex normals, parallel to `positions`, or empty when the kernel
    /// produced none.
    pub normals: Vec<[f64; 3]>,
    pub triangles: Vec<[u32; 3]>,
    pub reversed: bool,
}

impl FaceMesh {
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Area and area-weighted centroid and normal, computed from the triangles.
    pub fn properties(&self) -> FaceProperties {
        let mut area = 0.0;
        let mut weighted = Vector3::zeros();
        let mut normal_sum = Vector3::zeros();
        for tri in &self.triangles {
            let [a, b, c] = tri.map(|i| Vector3::from(self.positions[i as usize]));
            let n = (b - a).cross(&(c - a));
            let tri_area = 0.5 * n.norm();
            area += tri_area;
            weighted += (a + b + c) * (tri_area / 3.0);
            normal_sum += n * 0.5;
        }
        let centroid = if area > 0.0 {
            weighted / area
        } else {
            Vector3::zeros()
        };
        let mut mean_normal = normal_sum.try_normalize(1e-12).unwrap_or_else(Vector3::zeros);
        if self.reversed {
            mean_normal = -mean_normal;
        }
        FaceProperties {
            area,
            centroid: centroid.into(),
            mean_normal: mean_normal.into(),
            bounds: Aabb::from_points(&self.positions),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_square() -> FaceMesh {
        FaceMesh {
            positions: vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [1.0, 1.0, 0.0],
                [0.0, 1.0, 0.0],
            ],
            normals: vec![],
            triangles: vec![[0, 1, 2], [0, 2, 3]],
            reversed: false,
        }
    }

    #[test]
    fn mesh_properties_of_unit_square() {
        let props = unit_square().properties();
        assert_relative_eq!(props.area, 1.0);
        assert_relative_eq!(props.centroid[0], 0.5);
        assert_relative_eq!(props.centroid[1], 0.5);
        assert_eq!(props.mean_normal, [0.0, 0.0, 1.0]);
        assert_eq!(props.bounds.to_array(), [0.0, 0.0, 0.0, 1.0, 1.0, 0.0]);
    }

    #[test]
    fn reversed_mesh_flips_mean_normal() {
        let mut mesh = unit_square();
        mesh.reversed = true;
        assert_eq!(mesh.properties().mean_normal, [0.0, 0.0, -1.0]);
    }
}
