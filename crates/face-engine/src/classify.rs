//! Surface classifier: kernel surface description to `FaceInfo`.

use brep_kernel::{FaceProperties, KernelId, KernelIntrospect, SurfaceGeometry};
use label_types::{FaceId, FaceInfo, SurfaceKind};
use nalgebra::Vector3;
use tracing::{debug, warn};

use crate::config::ToleranceConfig;

/// Classify one kernel face. Never fails: kernel errors degrade to an
/// `other` face with no type-specific fields.
pub fn classify_face<K: KernelIntrospect + ?Sized>(
    kernel: &K,
    face: KernelId,
    id: FaceId,
    tolerance: &ToleranceConfig,
) -> FaceInfo {
    let surface = kernel.face_surface(face).unwrap_or_else(|e| {
        warn!(face = %id, error = %e, "surface query failed; classifying as other");
        SurfaceGeometry::Unknown
    });
    let properties = match kernel.face_properties(face) {
        Ok(props) => Some(props),
        Err(e) => {
            warn!(face = %id, error = %e, "face properties unavailable");
            None
        }
    };
    classify_surface(id, &surface, properties.as_ref(), tolerance)
}

/// Build the metadata record for a face from its surface and properties.
pub fn classify_surface(
    id: FaceId,
    surface: &SurfaceGeometry,
    properties: Option<&FaceProperties>,
    tolerance: &ToleranceConfig,
) -> FaceInfo {
    let mut info = FaceInfo::bare(id, SurfaceKind::Other);
    if let Some(props) = properties {
        info.area = props.area;
        info.centroid = props.centroid;
        info.normal = props.mean_normal;
        info.bounds = props.bounds.to_array();
    }

    match surface {
        SurfaceGeometry::Plane {
            normal, reversed, ..
        } => match unit(*normal, tolerance) {
            Some(n) => {
                info.surface_type = SurfaceKind::Planar;
                let n = if *reversed { -n } else { n };
                info.normal = n.into();
            }
            None => warn!(face = %id, "degenerate plane normal"),
        },
        SurfaceGeometry::Cylinder {
            axis_point,
            axis_direction,
            radius,
            u_range,
        } => match canonical_axis(*axis_point, *axis_direction, tolerance) {
            Some((point, direction)) if radius.is_finite() && *radius > 0.0 => {
                info.surface_type = SurfaceKind::Cylindrical;
                info.radius = Some(*radius);
                info.axis_point = Some(point);
                info.axis_direction = Some(direction);
                info.arc_angle = Some(arc_degrees(*u_range));
            }
            _ => warn!(face = %id, radius, "degenerate cylinder"),
        },
        SurfaceGeometry::Cone { .. } => info.surface_type = SurfaceKind::Conical,
        SurfaceGeometry::Sphere { .. } => info.surface_type = SurfaceKind::Spherical,
        SurfaceGeometry::Torus { .. } => info.surface_type = SurfaceKind::Toroidal,
        SurfaceGeometry::BSpline => info.surface_type = SurfaceKind::BSpline,
        SurfaceGeometry::Bezier => info.surface_type = SurfaceKind::Bezier,
        SurfaceGeometry::Revolution => info.surface_type = SurfaceKind::Revolution,
        SurfaceGeometry::Extrusion => info.surface_type = SurfaceKind::Extrusion,
        SurfaceGeometry::Offset => info.surface_type = SurfaceKind::Offset,
        SurfaceGeometry::Unknown => {}
    }
    debug!(face = %id, kind = %info.surface_type, "classified");
    info
}

fn unit(v: [f64; 3], tolerance: &ToleranceConfig) -> Option<Vector3<f64>> {
    Vector3::from(v).try_normalize(tolerance.degenerate_cross)
}

/// Axis with a fixed sign and a fixed reference point.
///
/// The direction is flipped so its largest-magnitude component is positive
/// (first such component on ties). The point is the foot of the perpendicular
/// from the origin onto the axis line. Both depend only on the line, never on
/// how the kernel happened to parametrise it.
fn canonical_axis(
    point: [f64; 3],
    direction: [f64; 3],
    tolerance: &ToleranceConfig,
) -> Option<([f64; 3], [f64; 3])> {
    let mut d = unit(direction, tolerance)?;
    let dominant = d.iamax();
    if d[dominant] < 0.0 {
        d = -d;
    }
    let p = Vector3::from(point);
    let foot = p - d * p.dot(&d);
    Some((foot.into(), d.into()))
}

/// Parametric angle range in degrees, clamped to (0, 360].
fn arc_degrees((start, end): (f64, f64)) -> f64 {
    let degrees = (end - start).abs().to_degrees();
    if !degrees.is_finite() || degrees >= 360.0 - 1e-6 || degrees == 0.0 {
        360.0
    } else {
        degrees
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use brep_kernel::Aabb;
    use std::f64::consts::{FRAC_PI_2, PI, TAU};

    fn props() -> FaceProperties {
        FaceProperties {
            area: 12.0,
            centroid: [1.0, 2.0, 3.0],
            mean_normal: [0.0, 1.0, 0.0],
            bounds: Aabb::from_points(&[[0.0, 0.0, 0.0], [2.0, 4.0, 6.0]]),
        }
    }

    fn cylinder(point: [f64; 3], dir: [f64; 3], u_range: (f64, f64)) -> SurfaceGeometry {
        SurfaceGeometry::Cylinder {
            axis_point: point,
            axis_direction: dir,
            radius: 3.0,
            u_range,
        }
    }

    #[test]
    fn plane_uses_exact_normal_and_centroid() {
        let surface = SurfaceGeometry::Plane {
            origin: [0.0; 3],
            normal: [0.0, 0.0, 2.0],
            reversed: false,
        };
        let info = classify_surface(FaceId(4), &surface, Some(&props()), &Default::default());
        assert_eq!(info.surface_type, SurfaceKind::Planar);
        assert_eq!(info.normal, [0.0, 0.0, 1.0]);
        assert_eq!(info.centroid, [1.0, 2.0, 3.0]);
        assert_eq!(info.area, 12.0);
        assert_eq!(info.bounds, [0.0, 0.0, 0.0, 2.0, 4.0, 6.0]);
        assert!(info.radius.is_none());
    }

    #[test]
    fn reversed_plane_flips_normal() {
        let surface = SurfaceGeometry::Plane {
            origin: [0.0; 3],
            normal: [1.0, 0.0, 0.0],
            reversed: true,
        };
        let info = classify_surface(FaceId(0), &surface, None, &Default::default());
        assert_eq!(info.normal, [-1.0, 0.0, 0.0]);
    }

    #[test]
    fn cylinder_axis_sign_is_canonical() {
        let tol = ToleranceConfig::default();
        let up = classify_surface(FaceId(0), &cylinder([1.0, 1.0, 5.0], [0.0, 0.0, 1.0], (0.0, TAU)), None, &tol);
        let down = classify_surface(FaceId(0), &cylinder([1.0, 1.0, -7.0], [0.0, 0.0, -1.0], (0.0, TAU)), None, &tol);
        assert_eq!(up.axis_direction, Some([0.0, 0.0, 1.0]));
        assert_eq!(up.axis_direction, down.axis_direction);
        assert_eq!(up.axis_point, down.axis_point);
        assert_eq!(up.axis_point, Some([1.0, 1.0, 0.0]));
    }

    #[test]
    fn oblique_axis_keeps_dominant_component_positive() {
        let tol = ToleranceConfig::default();
        let info = classify_surface(FaceId(0), &cylinder([0.0; 3], [0.6, -0.8, 0.0], (0.0, TAU)), None, &tol);
        let d = info.axis_direction.unwrap();
        assert_relative_eq!(d[0], -0.6);
        assert_relative_eq!(d[1], 0.8);
    }

    #[test]
    fn arc_angle_from_u_range() {
        let tol = ToleranceConfig::default();
        let full = classify_surface(FaceId(0), &cylinder([0.0; 3], [0.0, 0.0, 1.0], (0.0, TAU)), None, &tol);
        assert_eq!(full.arc_angle, Some(360.0));
        let half = classify_surface(FaceId(0), &cylinder([0.0; 3], [0.0, 0.0, 1.0], (PI, TAU)), None, &tol);
        assert_relative_eq!(half.arc_angle.unwrap(), 180.0);
        let quarter = classify_surface(FaceId(0), &cylinder([0.0; 3], [0.0, 0.0, 1.0], (0.0, FRAC_PI_2)), None, &tol);
        assert_relative_eq!(quarter.arc_angle.unwrap(), 90.0);
    }

    #[test]
    fn degenerate_cylinder_is_other_with_null_fields() {
        let tol = ToleranceConfig::default();
        let zero_axis = classify_surface(FaceId(2), &cylinder([0.0; 3], [0.0; 3], (0.0, TAU)), None, &tol);
        assert_eq!(zero_axis.surface_type, SurfaceKind::Other);
        assert!(zero_axis.radius.is_none());
        assert!(zero_axis.axis_direction.is_none());

        let flat = SurfaceGeometry::Cylinder {
            axis_point: [0.0; 3],
            axis_direction: [0.0, 0.0, 1.0],
            radius: 0.0,
            u_range: (0.0, TAU),
        };
        let info = classify_surface(FaceId(2), &flat, None, &tol);
        assert_eq!(info.surface_type, SurfaceKind::Other);
        assert!(info.arc_angle.is_none());
    }

    #[test]
    fn tag_only_surfaces_map_to_kinds() {
        let tol = ToleranceConfig::default();
        let cases = [
            (SurfaceGeometry::BSpline, SurfaceKind::BSpline),
            (SurfaceGeometry::Offset, SurfaceKind::Offset),
            (SurfaceGeometry::Unknown, SurfaceKind::Other),
            (
                SurfaceGeometry::Sphere {
                    center: [0.0; 3],
                    radius: 1.0,
                },
                SurfaceKind::Spherical,
            ),
        ];
        for (surface, kind) in cases {
            let info = classify_surface(FaceId(0), &surface, Some(&props()), &tol);
            assert_eq!(info.surface_type, kind);
            assert_eq!(info.normal, [0.0, 1.0, 0.0]);
            assert!(info.cylinder_axis().is_none());
        }
    }
}
