//! Closest-point primitives used by the BVH leaf test.

use nalgebra::{Point3, Vector3};

/// Compute the closest point on a triangle to a query point.
///
/// Classifies the query against the Voronoi regions of the triangle's
/// vertices, edges and face ("Real-Time Collision Detection", Ericson).
/// Zero-area triangles are handled as the union of their three edges.
#[must_use]
#[allow(clippy::many_single_char_names)]
pub fn closest_point_on_triangle(
    point: &Point3<f64>,
    a: &Point3<f64>,
    b: &Point3<f64>,
    c: &Point3<f64>,
) -> Point3<f64> {
    let ab = b - a;
    let ac = c - a;

    if ab.cross(&ac).norm_squared() <= f64::MIN_POSITIVE {
        return closest_point_on_degenerate(point, a, b, c);
    }

    let ap = point - a;
    let d1 = ab.dot(&ap);
    let d2 = ac.dot(&ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return *a;
    }

    let bp = point - b;
    let d3 = ab.dot(&bp);
    let d4 = ac.dot(&bp);
    if d3 >= 0.0 && d4 <= d3 {
        return *b;
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        return a + ab * (d1 / (d1 - d3));
    }

    let cp = point - c;
    let d5 = ab.dot(&cp);
    let d6 = ac.dot(&cp);
    if d6 >= 0.0 && d5 <= d6 {
        return *c;
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        return a + ac * (d2 / (d2 - d6));
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return b + (c - b) * w;
    }

    // Face region
    let denom = 1.0 / (va + vb + vc);
    a + ab * (vb * denom) + ac * (vc * denom)
}

/// Compute the closest point on a line segment to a query point.
#[must_use]
pub fn closest_point_on_segment(
    point: &Point3<f64>,
    a: &Point3<f64>,
    b: &Point3<f64>,
) -> Point3<f64> {
    let ab = b - a;
    let t = (point - a).dot(&ab) / ab.norm_squared().max(f64::EPSILON);
    a + ab * t.clamp(0.0, 1.0)
}

/// Unit normal of a counter-clockwise triangle, or zero for a zero-area one.
#[must_use]
pub fn triangle_normal(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>) -> Vector3<f64> {
    (b - a)
        .cross(&(c - a))
        .try_normalize(0.0)
        .unwrap_or_else(Vector3::zeros)
}

fn closest_point_on_degenerate(
    point: &Point3<f64>,
    a: &Point3<f64>,
    b: &Point3<f64>,
    c: &Point3<f64>,
) -> Point3<f64> {
    let mut best = closest_point_on_segment(point, a, b);
    let mut best_dist = (point - best).norm_squared();
    for (p, q) in [(b, c), (c, a)] {
        let candidate = closest_point_on_segment(point, p, q);
        let dist = (point - candidate).norm_squared();
        if dist < best_dist {
            best = candidate;
            best_dist = dist;
        }
    }
    best
}
