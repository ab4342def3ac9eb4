//! Measurement engine: distances, radii and angles between analytic faces.
//!
//! Pure over the face table. Lengths come back in the document's native
//! unit; scaling for display is the caller's job.

use label_types::{FaceId, FaceInfo, Measurement, PairRelation, SurfaceKind};
use nalgebra::Vector3;

use crate::config::ToleranceConfig;

/// Measure the current selection.
///
/// One cylindrical face gives its diameter (arc of 180° or more) or radius.
/// Two faces give a distance when parallel (or, for skew cylinder axes,
/// separated) and an angle otherwise. Anything else is `Incompatible`.
pub fn measure(selected: &[FaceId], faces: &[FaceInfo], tolerance: &ToleranceConfig) -> Measurement {
    let resolve = |id: FaceId| faces.get(id.index()).filter(|f| f.id == id);

    match *selected {
        [only] => match resolve(only) {
            Some(face) => measure_single(face),
            None => Measurement::incompatible(format!("face {only} does not exist")),
        },
        [a, b] => {
            // Fixed evaluation order makes measure([a, b]) == measure([b, a]) exactly.
            let (first, second) = if a <= b { (a, b) } else { (b, a) };
            match (resolve(first), resolve(second)) {
                (Some(f1), Some(f2)) => measure_pair(f1, f2, tolerance),
                (None, _) => Measurement::incompatible(format!("face {first} does not exist")),
                (_, None) => Measurement::incompatible(format!("face {second} does not exist")),
            }
        }
        _ => Measurement::incompatible(format!(
            "select one or two faces ({} selected)",
            selected.len()
        )),
    }
}

fn measure_single(face: &FaceInfo) -> Measurement {
    match (face.surface_type, face.radius) {
        (SurfaceKind::Cylindrical, Some(radius)) => {
            let arc_angle = face.arc_angle.unwrap_or(360.0);
            if arc_angle >= 180.0 {
                Measurement::Diameter {
                    value: 2.0 * radius,
                    arc_angle,
                }
            } else {
                Measurement::Radius {
                    value: radius,
                    arc_angle,
                }
            }
        }
        (kind, _) => Measurement::incompatible(format!(
            "a single {kind} face has no radius to measure"
        )),
    }
}

fn measure_pair(a: &FaceInfo, b: &FaceInfo, tolerance: &ToleranceConfig) -> Measurement {
    use SurfaceKind::{Cylindrical, Planar};

    match (a.surface_type, b.surface_type) {
        (Cylindrical, Cylindrical) => match (Axis::of(a), Axis::of(b)) {
            (Some(x), Some(y)) => axis_to_axis(&x, &y, tolerance),
            _ => missing_data(a, b),
        },
        (Planar, Planar) => match (Plane::of(a), Plane::of(b)) {
            (Some(x), Some(y)) => plane_to_plane(&x, &y, tolerance),
            _ => missing_data(a, b),
        },
        (Cylindrical, Planar) => match (Axis::of(a), Plane::of(b)) {
            (Some(axis), Some(plane)) => axis_to_plane(&axis, &plane, tolerance),
            _ => missing_data(a, b),
        },
        (Planar, Cylindrical) => match (Axis::of(b), Plane::of(a)) {
            (Some(axis), Some(plane)) => axis_to_plane(&axis, &plane, tolerance),
            _ => missing_data(a, b),
        },
        (x, y) => Measurement::incompatible(format!("cannot measure between {x} and {y} faces")),
    }
}

fn missing_data(a: &FaceInfo, b: &FaceInfo) -> Measurement {
    Measurement::incompatible(format!(
        "faces {} and {} lack the geometry needed to measure",
        a.id, b.id
    ))
}

struct Axis {
    point: Vector3<f64>,
    direction: Vector3<f64>,
}

impl Axis {
    fn of(face: &FaceInfo) -> Option<Self> {
        let (point, direction, _) = face.cylinder_axis()?;
        Some(Self {
            point: point.into(),
            direction: Vector3::from(direction).try_normalize(1e-12)?,
        })
    }
}

struct Plane {
    point: Vector3<f64>,
    normal: Vector3<f64>,
}

impl Plane {
    fn of(face: &FaceInfo) -> Option<Self> {
        Some(Self {
            point: face.centroid.into(),
            normal: Vector3::from(face.normal).try_normalize(1e-12)?,
        })
    }
}

/// Angle in degrees between two lines with unit directions `u` and `v`, in [0, 90].
fn acute_angle(u: &Vector3<f64>, v: &Vector3<f64>) -> f64 {
    u.dot(v).abs().clamp(0.0, 1.0).acos().to_degrees()
}

/// Length of the part of `p2 - p1` perpendicular to `direction`.
fn perpendicular_offset(p1: &Vector3<f64>, p2: &Vector3<f64>, direction: &Vector3<f64>) -> f64 {
    let v = p2 - p1;
    (v - direction * v.dot(direction)).norm()
}

fn axis_to_axis(a: &Axis, b: &Axis, tolerance: &ToleranceConfig) -> Measurement {
    let parallel_distance = || Measurement::Distance {
        value: perpendicular_offset(&a.point, &b.point, &a.direction),
        between: PairRelation::AxisAxis,
        axis_angle: None,
    };

    if a.direction.dot(&b.direction).abs() > 1.0 - tolerance.parallel {
        return parallel_distance();
    }
    let cross = a.direction.cross(&b.direction);
    let cross_len = cross.norm();
    if cross_len < tolerance.degenerate_cross {
        return parallel_distance();
    }

    let separation = (b.point - a.point).dot(&cross).abs() / cross_len;
    let angle = acute_angle(&a.direction, &b.direction);
    if separation <= tolerance.coincident {
        Measurement::Angle {
            degrees: angle,
            between: PairRelation::AxisAxis,
        }
    } else {
        Measurement::Distance {
            value: separation,
            between: PairRelation::AxisAxis,
            axis_angle: Some(angle),
        }
    }
}

fn plane_to_plane(a: &Plane, b: &Plane, tolerance: &ToleranceConfig) -> Measurement {
    if a.normal.dot(&b.normal).abs() > 1.0 - tolerance.parallel {
        Measurement::Distance {
            value: a.normal.dot(&(b.point - a.point)).abs(),
            between: PairRelation::PlanePlane,
            axis_angle: None,
        }
    } else {
        Measurement::Angle {
            degrees: acute_angle(&a.normal, &b.normal),
            between: PairRelation::PlanePlane,
        }
    }
}

fn axis_to_plane(axis: &Axis, plane: &Plane, tolerance: &ToleranceConfig) -> Measurement {
    if axis.direction.dot(&plane.normal).abs() < tolerance.perpendicular {
        Measurement::Distance {
            value: plane.normal.dot(&(axis.point - plane.point)).abs(),
            between: PairRelation::AxisPlane,
            axis_angle: None,
        }
    } else {
        Measurement::Angle {
            degrees: 90.0 - acute_angle(&axis.direction, &plane.normal),
            between: PairRelation::AxisPlane,
        }
    }
}
