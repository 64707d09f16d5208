use tracing::warn;

use crate::error::{ConfigError, Result};
use crate::material::{MaterialId, MaterialStore};
use crate::math::polygon_3d::{bilinear_point, quad_area};
use crate::math::Point3;
use crate::patch::{quad_plane, PatchCollection, QuadPatch};

use super::{check_patch_size, Plane, Shape, MAX_PATCHES};

/// Relative slack so that a side that is an exact multiple of the patch size
/// is not split into one extra sliver because of rounding.
const SEGMENT_SLACK: f64 = 1e-9;

/// A planar convex quadrilateral shape.
///
/// Vertices are ordered counter-clockwise when seen from the lit side. The
/// `v0 → v1` edge is the U direction of the subdivision grid and `v0 → v3`
/// the V direction.
#[derive(Debug, Clone)]
pub struct Quad {
    vertices: [Point3; 4],
    plane: Plane,
    material: MaterialId,
}

impl Quad {
    /// Creates a new quad.
    ///
    /// # Errors
    ///
    /// Returns an error if the vertices are not coplanar, not convex, or
    /// enclose zero area.
    pub fn new(vertices: [Point3; 4], material: MaterialId) -> Result<Self> {
        let plane = quad_plane(&vertices)?;
        Ok(Self {
            vertices,
            plane,
            material,
        })
    }

    /// The four corners in winding order.
    #[must_use]
    pub fn vertices(&self) -> &[Point3; 4] {
        &self.vertices
    }

    /// Supporting plane of the quad.
    #[must_use]
    pub fn plane(&self) -> &Plane {
        &self.plane
    }

    /// Number of `(u, v)` grid cells produced for `patch_size`.
    ///
    /// Each direction uses the longer of its two opposite edges, so every
    /// patch side stays within `patch_size` even for trapezoids.
    #[must_use]
    pub fn subdivision(&self, patch_size: f64) -> (usize, usize) {
        let [v0, v1, v2, v3] = self.vertices;
        let u_len = (v1 - v0).norm().max((v2 - v3).norm());
        let v_len = (v3 - v0).norm().max((v2 - v1).norm());
        (
            segment_count(u_len, patch_size),
            segment_count(v_len, patch_size),
        )
    }
}

impl Shape for Quad {
    fn material(&self) -> MaterialId {
        self.material
    }

    fn surface_area(&self) -> f64 {
        quad_area(&self.vertices)
    }

    fn split_into_patches(
        &self,
        patch_size: f64,
        materials: &MaterialStore,
    ) -> Result<PatchCollection> {
        check_patch_size(patch_size)?;
        let emission = *materials.get(self.material)?.emission();

        let (n_u, n_v) = self.subdivision(patch_size);
        let count = n_u
            .checked_mul(n_v)
            .filter(|&count| count <= MAX_PATCHES)
            .ok_or(ConfigError::TooManyPatches {
                patch_size,
                limit: MAX_PATCHES,
            })?;
        let mut patches = PatchCollection::with_capacity(count);

        #[allow(clippy::cast_precision_loss)]
        let (du, dv) = (1.0 / n_u as f64, 1.0 / n_v as f64);

        // Row-major: rows advance along V, cells inside a row along U.
        for b in 0..n_v {
            #[allow(clippy::cast_precision_loss)]
            let (t0, t1) = (b as f64 * dv, (b + 1) as f64 * dv);
            for a in 0..n_u {
                #[allow(clippy::cast_precision_loss)]
                let (s0, s1) = (a as f64 * du, (a + 1) as f64 * du);
                let corners = [
                    bilinear_point(&self.vertices, s0, t0),
                    bilinear_point(&self.vertices, s1, t0),
                    bilinear_point(&self.vertices, s1, t1),
                    bilinear_point(&self.vertices, s0, t1),
                ];
                match QuadPatch::new(corners, self.material, emission) {
                    Ok(patch) => patches.push(patch),
                    Err(err) => warn!(row = b, column = a, %err, "skipping degenerate patch"),
                }
            }
        }

        Ok(patches)
    }
}

/// Number of equal segments of at most `patch_size` covering `length`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn segment_count(length: f64, patch_size: f64) -> usize {
    let ratio = length / patch_size;
    let count = (ratio - ratio.max(1.0) * SEGMENT_SLACK).ceil();
    if count < 1.0 {
        1
    } else {
        count as usize
    }
}
