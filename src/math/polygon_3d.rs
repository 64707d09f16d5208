use crate::geometry::Plane;

use super::{Point3, Vector3, TOLERANCE};

/// Inside test for a convex quad with counter-clockwise winding around `normal`.
///
/// A point on an edge (within `TOLERANCE`) counts as inside, so adjacent
/// patches leave no crack between them.
#[must_use]
pub fn point_in_convex_quad(point: &Point3, quad: &[Point3; 4], normal: &Vector3) -> bool {
    (0..4).all(|i| {
        let a = quad[i];
        let b = quad[(i + 1) % 4];
        (b - a).cross(&(point - a)).dot(normal) >= -TOLERANCE
    })
}

/// Area of a planar quad, from the cross product of its diagonals.
#[must_use]
pub fn quad_area(quad: &[Point3; 4]) -> f64 {
    0.5 * diagonal_cross(quad).norm()
}

/// Unit normal of a planar quad following its vertex winding.
///
/// Returns `None` for a degenerate (zero-area) quad.
#[must_use]
pub fn quad_normal(quad: &[Point3; 4]) -> Option<Vector3> {
    let n = diagonal_cross(quad);
    let len = n.norm();
    if len < TOLERANCE {
        None
    } else {
        Some(n / len)
    }
}

/// `(v2 - v0) × (v3 - v1)`; its length is twice the quad area.
fn diagonal_cross(quad: &[Point3; 4]) -> Vector3 {
    (quad[2] - quad[0]).cross(&(quad[3] - quad[1]))
}

/// Largest distance of any vertex from the plane through the quad's centroid
/// with the given unit normal.
#[must_use]
pub fn planarity_deviation(quad: &[Point3; 4], normal: &Vector3) -> f64 {
    let centroid = quad_centroid(quad);
    quad.iter()
        .map(|p| (p - centroid).dot(normal).abs())
        .fold(0.0, f64::max)
}

/// Returns `true` if every corner of the quad turns the same way around `normal`.
#[must_use]
pub fn is_convex_quad(quad: &[Point3; 4], normal: &Vector3) -> bool {
    (0..4).all(|i| {
        let prev = quad[(i + 3) % 4];
        let cur = quad[i];
        let next = quad[(i + 1) % 4];
        (cur - prev).cross(&(next - cur)).dot(normal) > TOLERANCE
    })
}

/// Vertex average of a quad.
#[must_use]
pub fn quad_centroid(quad: &[Point3; 4]) -> Point3 {
    let sum = quad
        .iter()
        .fold(Vector3::zeros(), |acc, p| acc + p.coords);
    Point3::from(sum / 4.0)
}

/// Bilinear interpolation of the four quad corners.
///
/// `s` runs along `v0 → v1` and `t` along `v0 → v3`.
#[must_use]
pub fn bilinear_point(quad: &[Point3; 4], s: f64, t: f64) -> Point3 {
    let bottom = quad[0].coords * (1.0 - s) + quad[1].coords * s;
    let top = quad[3].coords * (1.0 - s) + quad[2].coords * s;
    Point3::from(bottom * (1.0 - t) + top * t)
}

/// Inverse of [`bilinear_point`] for a point lying in the quad's plane.
///
/// Returns `(s, t)` clamped to the unit square. Works on the plane
/// projection, so any convex planar quad is supported.
#[must_use]
pub fn inverse_bilinear(quad: &[Point3; 4], plane: &Plane, point: &Point3) -> (f64, f64) {
    let uv = |p: &Point3| {
        let (x, y) = plane.project(p);
        nalgebra::Vector2::new(x, y)
    };
    let cross = |a: &nalgebra::Vector2<f64>, b: &nalgebra::Vector2<f64>| a.x * b.y - a.y * b.x;

    let a = uv(&quad[0]);
    let e = uv(&quad[1]) - a;
    let f = uv(&quad[3]) - a;
    let g = a - uv(&quad[1]) + uv(&quad[2]) - uv(&quad[3]);
    let h = uv(point) - a;

    // h = e s + f t + g s t, solved as a quadratic in t.
    let k2 = cross(&g, &f);
    let k1 = cross(&e, &f) + cross(&h, &g);
    let k0 = cross(&h, &e);

    let s_for = |t: f64| {
        let axis = e + g * t;
        let len2 = axis.norm_squared();
        if len2 < TOLERANCE {
            0.0
        } else {
            (h - f * t).dot(&axis) / len2
        }
    };

    let t = if k2.abs() < TOLERANCE * (e.norm_squared() + f.norm_squared()) {
        if k1.abs() < TOLERANCE {
            0.0
        } else {
            -k0 / k1
        }
    } else {
        let disc = (k1 * k1 - 4.0 * k0 * k2).max(0.0).sqrt();
        let first = (-k1 - disc) / (2.0 * k2);
        let in_range = |x: f64| (-1e-6..=1.0 + 1e-6).contains(&x);
        if in_range(first) && in_range(s_for(first)) {
            first
        } else {
            (-k1 + disc) / (2.0 * k2)
        }
    };

    (s_for(t).clamp(0.0, 1.0), t.clamp(0.0, 1.0))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn v(x: f64, y: f64, z: f64) -> Vector3 {
        Vector3::new(x, y, z)
    }

    fn xy_plane() -> Plane {
        Plane::from_normal(p(0.0, 0.0, 0.0), v(0.0, 0.0, 1.0)).unwrap()
    }

    fn unit_square() -> [Point3; 4] {
        [
            p(0.0, 0.0, 0.0),
            p(1.0, 0.0, 0.0),
            p(1.0, 1.0, 0.0),
            p(0.0, 1.0, 0.0),
        ]
    }

    // ── convex quad helpers ──

    #[test]
    fn convex_quad_contains_edge_points() {
        let n = v(0.0, 0.0, 1.0);
        assert!(point_in_convex_quad(&p(0.5, 0.5, 0.0), &unit_square(), &n));
        assert!(point_in_convex_quad(&p(1.0, 0.5, 0.0), &unit_square(), &n));
        assert!(!point_in_convex_quad(&p(1.01, 0.5, 0.0), &unit_square(), &n));
    }

    #[test]
    fn square_area_and_normal() {
        let sq = unit_square();
        assert!((quad_area(&sq) - 1.0).abs() < TOLERANCE);
        let n = quad_normal(&sq).unwrap();
        assert!((n.z - 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn trapezoid_area() {
        let quad = [
            p(0.0, 0.0, 0.0),
            p(4.0, 0.0, 0.0),
            p(3.0, 2.0, 0.0),
            p(1.0, 2.0, 0.0),
        ];
        assert!((quad_area(&quad) - 6.0).abs() < TOLERANCE);
    }

    #[test]
    fn collapsed_quad_has_no_normal() {
        let quad = [
            p(0.0, 0.0, 0.0),
            p(1.0, 0.0, 0.0),
            p(2.0, 0.0, 0.0),
            p(3.0, 0.0, 0.0),
        ];
        assert!(quad_normal(&quad).is_none());
    }

    #[test]
    fn bowtie_is_not_convex() {
        let quad = [
            p(0.0, 0.0, 0.0),
            p(1.0, 1.0, 0.0),
            p(1.0, 0.0, 0.0),
            p(0.0, 1.0, 0.0),
        ];
        assert!(!is_convex_quad(&quad, &v(0.0, 0.0, 1.0)));
        assert!(is_convex_quad(&unit_square(), &v(0.0, 0.0, 1.0)));
    }

    #[test]
    fn bent_quad_deviation() {
        let quad = [
            p(0.0, 0.0, 0.0),
            p(1.0, 0.0, 0.0),
            p(1.0, 1.0, 0.5),
            p(0.0, 1.0, 0.0),
        ];
        let n = quad_normal(&quad).unwrap();
        assert!(planarity_deviation(&quad, &n) > 0.01);
        assert!(planarity_deviation(&unit_square(), &v(0.0, 0.0, 1.0)) < TOLERANCE);
    }

    #[test]
    fn bilinear_corners_and_center() {
        let sq = unit_square();
        assert!((bilinear_point(&sq, 1.0, 1.0) - sq[2]).norm() < TOLERANCE);
        assert!((bilinear_point(&sq, 0.0, 1.0) - sq[3]).norm() < TOLERANCE);
        assert!((bilinear_point(&sq, 0.5, 0.5) - quad_centroid(&sq)).norm() < TOLERANCE);
    }

    #[test]
    fn inverse_bilinear_recovers_parameters() {
        let quad = [
            p(0.0, 0.0, 0.0),
            p(4.0, 0.0, 0.0),
            p(3.0, 2.0, 0.0),
            p(1.0, 2.0, 0.0),
        ];
        for (s, t) in [(0.0, 0.0), (0.25, 0.75), (0.5, 0.5), (0.9, 0.1), (1.0, 1.0)] {
            let point = bilinear_point(&quad, s, t);
            let (gs, gt) = inverse_bilinear(&quad, &xy_plane(), &point);
            assert!((gs - s).abs() < 1e-9, "s: {gs} vs {s}");
            assert!((gt - t).abs() < 1e-9, "t: {gt} vs {t}");
        }
    }

    #[test]
    fn inverse_bilinear_on_square_is_linear() {
        let (s, t) = inverse_bilinear(&unit_square(), &xy_plane(), &p(0.3, 0.6, 0.0));
        assert!((s - 0.3).abs() < 1e-12);
        assert!((t - 0.6).abs() < 1e-12);
    }
}
