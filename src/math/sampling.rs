//! Stochastic sampling on patches and hemispheres.
//!
//! Every sampler takes the random source explicitly so callers decide how
//! streams are seeded and shared between workers.

use std::f64::consts::TAU;

use rand::Rng;

use super::{Point3, Vector3};

/// Builds an orthonormal basis `(tangent, bitangent)` around a unit normal.
#[must_use]
pub fn orthonormal_basis(normal: &Vector3) -> (Vector3, Vector3) {
    let arbitrary = if normal.x.abs() < 0.9 {
        Vector3::new(1.0, 0.0, 0.0)
    } else {
        Vector3::new(0.0, 1.0, 0.0)
    };
    let tangent = normal.cross(&arbitrary).normalize();
    let bitangent = normal.cross(&tangent);
    (tangent, bitangent)
}

/// Samples a cosine-weighted direction in the hemisphere around a unit normal
/// (Malley's method: uniform disk sample projected up onto the hemisphere).
pub fn cosine_weighted_direction<R: Rng + ?Sized>(normal: &Vector3, rng: &mut R) -> Vector3 {
    let (tangent, bitangent) = orthonormal_basis(normal);

    let u1: f64 = rng.gen();
    let u2: f64 = rng.gen();
    let r = u1.sqrt();
    let phi = TAU * u2;
    let x = r * phi.cos();
    let y = r * phi.sin();
    let z = (1.0 - u1).max(0.0).sqrt();

    tangent * x + bitangent * y + normal * z
}

/// Samples a point uniformly (by area) on a convex planar quad.
///
/// The quad is split along the `v0`-`v2` diagonal; one triangle is picked
/// proportionally to its area and sampled with barycentric coordinates.
pub fn sample_point_in_quad<R: Rng + ?Sized>(quad: &[Point3; 4], rng: &mut R) -> Point3 {
    let area_a = triangle_area(&quad[0], &quad[1], &quad[2]);
    let area_b = triangle_area(&quad[0], &quad[2], &quad[3]);
    let total = area_a + area_b;

    let pick: f64 = rng.gen::<f64>() * total;
    let (a, b, c) = if pick <= area_a {
        (quad[0], quad[1], quad[2])
    } else {
        (quad[0], quad[2], quad[3])
    };

    let u: f64 = rng.gen();
    let v: f64 = rng.gen();
    let (su, sv) = if u + v > 1.0 {
        (1.0 - u, 1.0 - v)
    } else {
        (u, v)
    };

    a + (b - a) * su + (c - a) * sv
}

fn triangle_area(a: &Point3, b: &Point3, c: &Point3) -> f64 {
    0.5 * (b - a).cross(&(c - a)).norm()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::math::polygon_3d::point_in_convex_quad;
    use crate::math::TOLERANCE;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    #[test]
    fn basis_is_orthonormal() {
        for n in [
            Vector3::x(),
            Vector3::y(),
            Vector3::z(),
            Vector3::new(1.0, 2.0, -3.0).normalize(),
        ] {
            let (t, b) = orthonormal_basis(&n);
            assert!(t.dot(&n).abs() < TOLERANCE);
            assert!(b.dot(&n).abs() < TOLERANCE);
            assert!(t.dot(&b).abs() < TOLERANCE);
            assert!((t.norm() - 1.0).abs() < TOLERANCE);
            assert!((b.norm() - 1.0).abs() < TOLERANCE);
        }
    }

    #[test]
    fn directions_stay_in_hemisphere() {
        let mut rng = StdRng::seed_from_u64(7);
        let n = Vector3::new(0.0, -1.0, 0.0);
        for _ in 0..1000 {
            let d = cosine_weighted_direction(&n, &mut rng);
            assert!(d.dot(&n) >= 0.0);
            assert!((d.norm() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn mean_cosine_is_two_thirds() {
        // E[cos θ] under a cosine-weighted density is 2/3.
        let mut rng = StdRng::seed_from_u64(11);
        let n = Vector3::z();
        let count = 20_000;
        let mean: f64 = (0..count)
            .map(|_| cosine_weighted_direction(&n, &mut rng).z)
            .sum::<f64>()
            / f64::from(count);
        assert!((mean - 2.0 / 3.0).abs() < 0.01, "mean cosine {mean}");
    }

    #[test]
    fn quad_samples_stay_inside() {
        let mut rng = StdRng::seed_from_u64(3);
        let quad = [
            p(0.0, 0.0, 0.0),
            p(4.0, 0.0, 0.0),
            p(3.0, 2.0, 0.0),
            p(1.0, 2.0, 0.0),
        ];
        for _ in 0..1000 {
            let s = sample_point_in_quad(&quad, &mut rng);
            assert!(point_in_convex_quad(&s, &quad, &Vector3::z()));
        }
    }

    #[test]
    fn quad_samples_are_area_uniform() {
        // Left half of the unit square should get about half the samples.
        let mut rng = StdRng::seed_from_u64(5);
        let quad = [
            p(0.0, 0.0, 0.0),
            p(1.0, 0.0, 0.0),
            p(1.0, 1.0, 0.0),
            p(0.0, 1.0, 0.0),
        ];
        let count = 20_000;
        let left = (0..count)
            .filter(|_| sample_point_in_quad(&quad, &mut rng).x < 0.5)
            .count();
        #[allow(clippy::cast_precision_loss)]
        let fraction = left as f64 / f64::from(count);
        assert!((fraction - 0.5).abs() < 0.02, "fraction {fraction}");
    }
}
