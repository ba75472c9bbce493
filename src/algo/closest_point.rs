//! Closest points on segments and triangles.
//!
//! These are the leaf predicates of the projection oracle: given a query
//! point they return the distance to, and the nearest point on, a single
//! segment or triangle.
//!
//! # Example
//!
//! ```
//! use resurface::algo::closest_point::closest_point_on_triangle;
//! use nalgebra::Point3;
//!
//! let (d, q) = closest_point_on_triangle(
//!     &Point3::new(0.2, 0.2, 1.0),
//!     &Point3::new(0.0, 0.0, 0.0),
//!     &Point3::new(1.0, 0.0, 0.0),
//!     &Point3::new(0.0, 1.0, 0.0),
//! );
//! assert!((d - 1.0).abs() < 1e-12);
//! assert!((q - Point3::new(0.2, 0.2, 0.0)).norm() < 1e-12);
//! ```

use nalgebra::{Point3, Vector3};

/// Squared normal length below which a triangle is treated as degenerate.
pub const DEGENERATE_EPSILON: f64 = 1e-30;

/// Smallest magnitude accepted as a divisor.
const DIVISOR_EPSILON: f64 = 1e-300;

#[inline]
fn safe_ratio(num: f64, den: f64) -> f64 {
    if den.abs() > DIVISOR_EPSILON {
        num / den
    } else {
        0.0
    }
}

/// Nearest point on segment `[a, b]` to `p`.
///
/// Returns `(distance, point)`. A zero-length segment behaves like the point `a`.
pub fn closest_point_on_segment(
    p: &Point3<f64>,
    a: &Point3<f64>,
    b: &Point3<f64>,
) -> (f64, Point3<f64>) {
    let ab = b - a;
    let len2 = ab.norm_squared();

    let nearest = if len2 > DEGENERATE_EPSILON {
        let t = (p - a).dot(&ab) / len2;
        if t >= 1.0 {
            *b
        } else if t > 0.0 {
            a + ab * t
        } else {
            *a
        }
    } else {
        *a
    };

    ((p - nearest).norm(), nearest)
}

/// Parameter of `p` projected on the segment starting at `a` with direction `d`.
#[inline]
fn segment_parameter(p: &Point3<f64>, a: &Point3<f64>, d: &Vector3<f64>) -> f64 {
    safe_ratio(d.dot(&(p - a)), d.norm_squared())
}

/// Clamp a segment parameter and evaluate the point.
#[inline]
fn point_on_segment(a: &Point3<f64>, b: &Point3<f64>, t: f64) -> Point3<f64> {
    if t <= 0.0 {
        *a
    } else if t >= 1.0 {
        *b
    } else {
        a + (b - a) * t
    }
}

/// Nearest point on triangle `(v0, v1, v2)` to `p`.
///
/// Returns `(distance, point)`. The query is classified into one of seven
/// Voronoi regions (three vertices, three edges, the interior) using
/// coordinates `a` along `v0 -> v1` and `b` along `v0 -> v2`. Degenerate
/// triangles fall back to the closest of their three edges.
pub fn closest_point_on_triangle(
    p: &Point3<f64>,
    v0: &Point3<f64>,
    v1: &Point3<f64>,
    v2: &Point3<f64>,
) -> (f64, Point3<f64>) {
    let v0v1 = v1 - v0;
    let v0v2 = v2 - v0;
    let n = v0v1.cross(&v0v2);
    let d = n.norm_squared();

    if d < DEGENERATE_EPSILON {
        return degenerate_triangle(p, v0, v1, v2);
    }

    let inv_d = 1.0 / d;
    let v1v2 = v2 - v1;
    let v0p = p - v0;
    let t = v0p.cross(&n);
    let a = -t.dot(&v0v2) * inv_d;
    let b = t.dot(&v0v1) * inv_d;

    let nearest = if a < 0.0 {
        let s02 = segment_parameter(p, v0, &v0v2);
        if s02 < 0.0 {
            point_on_segment(v0, v1, segment_parameter(p, v0, &v0v1))
        } else if s02 > 1.0 {
            point_on_segment(v1, v2, segment_parameter(p, v1, &v1v2))
        } else {
            v0 + v0v2 * s02
        }
    } else if b < 0.0 {
        let s01 = segment_parameter(p, v0, &v0v1);
        if s01 < 0.0 {
            point_on_segment(v0, v2, segment_parameter(p, v0, &v0v2))
        } else if s01 > 1.0 {
            point_on_segment(v1, v2, segment_parameter(p, v1, &v1v2))
        } else {
            v0 + v0v1 * s01
        }
    } else if a + b > 1.0 {
        let s12 = segment_parameter(p, v1, &v1v2);
        if s12 >= 1.0 {
            point_on_segment(v0, v2, segment_parameter(p, v0, &v0v2))
        } else if s12 <= 0.0 {
            point_on_segment(v0, v1, segment_parameter(p, v0, &v0v1))
        } else {
            v1 + v1v2 * s12
        }
    } else {
        // Interior: drop the perpendicular onto the plane.
        p - n * (n.dot(&v0p) * inv_d)
    };

    ((p - nearest).norm(), nearest)
}

fn degenerate_triangle(
    p: &Point3<f64>,
    v0: &Point3<f64>,
    v1: &Point3<f64>,
    v2: &Point3<f64>,
) -> (f64, Point3<f64>) {
    [
        closest_point_on_segment(p, v0, v1),
        closest_point_on_segment(p, v1, v2),
        closest_point_on_segment(p, v2, v0),
    ]
    .into_iter()
    .fold((f64::INFINITY, *v0), |best, candidate| {
        if candidate.0 < best.0 {
            candidate
        } else {
            best
        }
    })
}

/// Barycentric coordinates of `p` with respect to triangle `(u, v, w)`.
///
/// `p` is projected onto the triangle's plane first. Degenerate triangles
/// yield the barycenter `(1/3, 1/3, 1/3)`.
pub fn barycentric_coordinates(
    p: &Point3<f64>,
    u: &Point3<f64>,
    v: &Point3<f64>,
    w: &Point3<f64>,
) -> Vector3<f64> {
    let e0 = v - u;
    let e1 = w - u;
    let ep = p - u;

    let d00 = e0.dot(&e0);
    let d01 = e0.dot(&e1);
    let d11 = e1.dot(&e1);
    let d20 = ep.dot(&e0);
    let d21 = ep.dot(&e1);
    let denom = d00 * d11 - d01 * d01;

    if denom.abs() <= DEGENERATE_EPSILON || denom.abs() <= f64::EPSILON * d00 * d11 {
        return Vector3::repeat(1.0 / 3.0);
    }

    let b1 = (d11 * d20 - d01 * d21) / denom;
    let b2 = (d00 * d21 - d01 * d20) / denom;
    Vector3::new(1.0 - b1 - b2, b1, b2)
}
