use crate::geometry::Plane;

use super::polygon_3d::point_in_convex_quad;
use super::{Point3, Vector3, TOLERANCE};

/// A half-line `origin + t * direction`, `t >= 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Start point of the ray.
    pub origin: Point3,
    /// Direction of travel (not required to be unit length).
    pub direction: Vector3,
}

impl Ray {
    /// Creates a new ray.
    #[must_use]
    pub fn new(origin: Point3, direction: Vector3) -> Self {
        Self { origin, direction }
    }

    /// Point reached at parameter `t`.
    #[must_use]
    pub fn at(&self, t: f64) -> Point3 {
        self.origin + self.direction * t
    }
}

/// Relationship of a line with a plane.
#[derive(Debug)]
pub enum LinePlaneRelation {
    /// Line intersects the plane at a single point.
    Point { point: Point3, t: f64 },
    /// Line is parallel to the plane (does not intersect).
    Parallel,
    /// Line lies entirely on the plane.
    OnPlane,
}

/// Computes the intersection of a line `origin + t * dir` with a plane.
#[must_use]
pub fn line_plane_intersect(origin: &Point3, dir: &Vector3, plane: &Plane) -> LinePlaneRelation {
    let normal = plane.plane_normal();
    let denom = normal.dot(dir);

    let diff = plane.origin() - origin;
    let numer = normal.dot(&diff);

    if denom.abs() < TOLERANCE {
        // Line is parallel to the plane
        if numer.abs() < TOLERANCE {
            LinePlaneRelation::OnPlane
        } else {
            LinePlaneRelation::Parallel
        }
    } else {
        let t = numer / denom;
        let point = origin + dir * t;
        LinePlaneRelation::Point { point, t }
    }
}

/// Intersects a ray with a convex planar quad.
///
/// Returns the ray parameter of the hit if it lies in `(t_min, t_max)`.
/// Rays grazing the quad's plane never hit.
#[must_use]
pub fn ray_quad_intersect(
    ray: &Ray,
    quad: &[Point3; 4],
    plane: &Plane,
    t_min: f64,
    t_max: f64,
) -> Option<f64> {
    match line_plane_intersect(&ray.origin, &ray.direction, plane) {
        LinePlaneRelation::Point { point, t } if t > t_min && t < t_max => {
            point_in_convex_quad(&point, quad, plane.plane_normal()).then_some(t)
        }
        _ => None,
    }
}
