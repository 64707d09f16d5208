mod collection;

pub use collection::PatchCollection;

use crate::error::{GeometryError, Result};
use crate::geometry::Plane;
use crate::material::MaterialId;
use crate::math::intersect_3d::{ray_quad_intersect, Ray};
use crate::math::polygon_3d::{
    is_convex_quad, planarity_deviation, quad_area, quad_centroid, quad_normal,
};
use crate::math::{Point3, Rgb, Vector3, TOLERANCE};

/// Largest vertex offset from the quad plane, relative to the quad size,
/// still accepted as planar.
const PLANARITY_TOLERANCE: f64 = 1e-6;

/// The atomic radiosity unit: a planar convex quadrilateral.
///
/// Vertices are ordered counter-clockwise when seen from the front, which
/// fixes the outward normal. Geometry and material are immutable after
/// construction; only the radiosity changes, and only through the solver.
#[derive(Debug, Clone)]
pub struct QuadPatch {
    vertices: [Point3; 4],
    material: MaterialId,
    plane: Plane,
    area: f64,
    emission: Rgb,
    radiosity: Rgb,
}

impl QuadPatch {
    /// Creates a new patch; its radiosity starts at `emission`.
    ///
    /// # Errors
    ///
    /// Returns an error if the quad has zero area, is not planar or is not
    /// convex.
    pub fn new(vertices: [Point3; 4], material: MaterialId, emission: Rgb) -> Result<Self> {
        let plane = quad_plane(&vertices)?;
        let area = quad_area(&vertices);

        Ok(Self {
            vertices,
            material,
            plane,
            area,
            emission,
            radiosity: emission,
        })
    }

    /// The four corners in winding order.
    #[must_use]
    pub fn vertices(&self) -> &[Point3; 4] {
        &self.vertices
    }

    /// The material this patch was cut from.
    #[must_use]
    pub fn material(&self) -> MaterialId {
        self.material
    }

    /// Supporting plane; its normal is the patch's outward normal.
    #[must_use]
    pub fn plane(&self) -> &Plane {
        &self.plane
    }

    /// Unit outward normal.
    #[must_use]
    pub fn normal(&self) -> &Vector3 {
        self.plane.plane_normal()
    }

    /// Surface area, always positive.
    #[must_use]
    pub fn area(&self) -> f64 {
        self.area
    }

    /// Vertex average of the patch.
    #[must_use]
    pub fn centroid(&self) -> Point3 {
        quad_centroid(&self.vertices)
    }

    /// Ray parameter where `ray` crosses this patch, if within `(0, t_max)`.
    ///
    /// Hits from either side count; callers that care about orientation
    /// compare the ray direction with [`QuadPatch::normal`].
    #[must_use]
    pub fn intersect(&self, ray: &Ray, t_max: f64) -> Option<f64> {
        ray_quad_intersect(ray, &self.vertices, &self.plane, 0.0, t_max)
    }

    /// Emitted radiosity, copied from the material at creation.
    #[must_use]
    pub fn emission(&self) -> &Rgb {
        &self.emission
    }

    /// Current radiosity.
    #[must_use]
    pub fn radiosity(&self) -> &Rgb {
        &self.radiosity
    }

    pub(crate) fn set_radiosity(&mut self, radiosity: Rgb) {
        self.radiosity = radiosity;
    }

    /// Resets radiosity to the emitted value.
    pub fn reset_radiosity(&mut self) {
        self.radiosity = self.emission;
    }
}

/// Validates a quad and builds its supporting plane.
///
/// The plane origin is `v0`, `u_dir` follows `v0 → v1` and the normal follows
/// the vertex winding.
pub(crate) fn quad_plane(vertices: &[Point3; 4]) -> Result<Plane> {
    let normal = quad_normal(vertices)
        .ok_or_else(|| GeometryError::Degenerate("quad has zero area".into()))?;

    let size = vertices
        .iter()
        .map(|p| (p - vertices[0]).norm())
        .fold(0.0, f64::max);
    let deviation = planarity_deviation(vertices, &normal);
    if deviation > PLANARITY_TOLERANCE * size.max(1.0) {
        return Err(GeometryError::NonPlanar { deviation }.into());
    }
    if !is_convex_quad(vertices, &normal) {
        return Err(GeometryError::NonConvex.into());
    }

    let u_dir = vertices[1] - vertices[0];
    if u_dir.norm() < TOLERANCE {
        return Err(GeometryError::Degenerate("quad has a zero-length edge".into()).into());
    }
    let v_dir = normal.cross(&u_dir);
    Plane::new(vertices[0], u_dir, v_dir)
}
