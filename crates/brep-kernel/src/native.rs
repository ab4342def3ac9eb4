//! Native truck surfaces mapped to `SurfaceGeometry`.

use std::f64::consts::TAU;

use nalgebra::Vector3 as Vec3;
use truck_stepio::r#in::alias::*;

use crate::types::SurfaceGeometry;

/// Points taken along each boundary edge when measuring a face's angular span.
pub(crate) const EDGE_SAMPLES: usize = 32;

/// Describe the surface under a face.
///
/// `orientation` is the face's sense relative to its surface. `boundary` holds
/// points sampled from the face's trimming edges; it fixes the angular range
/// of cylindrical faces.
pub(crate) fn surface_geometry(
    surface: &Surface,
    orientation: bool,
    boundary: &[Point3],
) -> SurfaceGeometry {
    match surface {
        Surface::ElementarySurface(elementary) => match elementary.as_ref() {
            ElementarySurface::Plane(plane) => SurfaceGeometry::Plane {
                origin: array(point(plane.origin())),
                normal: array(vector(plane.normal())),
                reversed: !orientation,
            },
            ElementarySurface::Sphere(sphere) => {
                let m = *sphere.transform();
                SurfaceGeometry::Sphere {
                    center: array(point(m.transform_point(sphere.entity().0.center()))),
                    radius: sphere.entity().0.radius(),
                }
            }
            ElementarySurface::CylindricalSurface(cylinder) => {
                let axis = RevolvedLine::from(cylinder);
                let Some(radial) = axis.radial(axis.start).try_normalize(1e-12) else {
                    return SurfaceGeometry::Unknown;
                };
                SurfaceGeometry::Cylinder {
                    axis_point: array(axis.origin),
                    axis_direction: array(axis.direction),
                    radius: axis.radial(axis.start).norm(),
                    u_range: angular_span(&axis, radial, boundary),
                }
            }
            ElementarySurface::ConicalSurface(cone) => {
                let axis = RevolvedLine::from(cone);
                let radial_step = axis.radial_vector(axis.step);
                let axial_step = axis.step.dot(&axis.direction);
                let spread = radial_step.norm_squared();
                let apex = if spread > 1e-24 {
                    axis.start - axis.step * (axis.radial(axis.start).dot(&radial_step) / spread)
                } else {
                    axis.origin
                };
                SurfaceGeometry::Cone {
                    apex: array(apex),
                    axis_direction: array(axis.direction),
                    half_angle: radial_step.norm().atan2(axial_step.abs()),
                }
            }
            ElementarySurface::ToroidalSurface(torus) => {
                let m = *torus.transform();
                let Some(direction) =
                    vector(m.transform_vector(Vector3::unit_z())).try_normalize(1e-12)
                else {
                    return SurfaceGeometry::Unknown;
                };
                SurfaceGeometry::Torus {
                    center: array(point(m.transform_point(torus.entity().center()))),
                    axis_direction: array(direction),
                    major_radius: torus.entity().large_radius(),
                    minor_radius: torus.entity().small_radius(),
                }
            }
        },
        Surface::SweptCurve(swept) => match swept.as_ref() {
            SweptCurve::ExtrudedCurve(_) => SurfaceGeometry::Extrusion,
            SweptCurve::RevolutedCurve(_) => SurfaceGeometry::Revolution,
        },
        Surface::BSplineSurface(_) | Surface::NurbsSurface(_) => SurfaceGeometry::BSpline,
    }
}

/// Evenly spaced points along a bounded edge curve, ends included.
pub(crate) fn sample_curve(curve: &Curve3D) -> Vec<Point3> {
    let Some((t0, t1)) = curve.try_range_tuple() else {
        return Vec::new();
    };
    (0..=EDGE_SAMPLES)
        .map(|i| curve.subs(t0 + (t1 - t0) * i as f64 / EDGE_SAMPLES as f64))
        .collect()
}

/// A straight generator line revolved about an axis, in world coordinates.
struct RevolvedLine {
    origin: Vec3<f64>,
    direction: Vec3<f64>,
    start: Vec3<f64>,
    step: Vec3<f64>,
}

impl RevolvedLine {
    fn radial_vector(&self, v: Vec3<f64>) -> Vec3<f64> {
        v - self.direction * v.dot(&self.direction)
    }

    fn radial(&self, p: Vec3<f64>) -> Vec3<f64> {
        self.radial_vector(p - self.origin)
    }
}

impl From<&Processor<RevolutedCurve<Line<Point3>>, Matrix4>> for RevolvedLine {
    fn from(surface: &Processor<RevolutedCurve<Line<Point3>>, Matrix4>) -> Self {
        let m = *surface.transform();
        let revolved = surface.entity();
        let Line(a, b) = *revolved.entity_curve();
        let direction = vector(m.transform_vector(revolved.axis()));
        Self {
            origin: point(m.transform_point(revolved.origin())),
            direction: direction.try_normalize(1e-12).unwrap_or(direction),
            start: point(m.transform_point(a)),
            step: vector(m.transform_vector(b - a)),
        }
    }
}

/// Angular range, in radians, that the boundary covers around the axis.
///
/// The complement of the widest empty sector is the face's span. A boundary
/// with no sector wider than one sampling step wraps the full turn.
fn angular_span(axis: &RevolvedLine, reference: Vec3<f64>, boundary: &[Point3]) -> (f64, f64) {
    let across = axis.direction.cross(&reference);
    let mut angles: Vec<f64> = boundary
        .iter()
        .map(|p| axis.radial(point(*p)))
        .filter(|r| r.norm() > 1e-9)
        .map(|r| r.dot(&across).atan2(r.dot(&reference)).rem_euclid(TAU))
        .collect();
    angles.sort_by(f64::total_cmp);
    angles.dedup_by(|a, b| (*a - *b).abs() < 1e-9);
    if angles.len() < 2 {
        return (0.0, TAU);
    }

    let last = angles.len() - 1;
    let (mut gap, mut after) = (angles[0] + TAU - angles[last], 0);
    for i in 0..last {
        let g = angles[i + 1] - angles[i];
        if g > gap {
            gap = g;
            after = i + 1;
        }
    }
    if gap <= TAU / EDGE_SAMPLES as f64 * 1.01 {
        return (0.0, TAU);
    }
    let start = angles[after];
    (start, start + TAU - gap)
}

fn point(p: Point3) -> Vec3<f64> {
    Vec3::new(p.x, p.y, p.z)
}

fn vector(v: Vector3) -> Vec3<f64> {
    Vec3::new(v.x, v.y, v.z)
}

fn array(v: Vec3<f64>) -> [f64; 3] {
    [v.x, v.y, v.z]
}
