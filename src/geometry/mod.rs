mod cuboid;
mod plane;
mod quad;

pub use cuboid::{Cuboid, CuboidFace};
pub use plane::Plane;
pub use quad::Quad;

use crate::error::{ConfigError, Result};
use crate::material::{MaterialId, MaterialStore};
use crate::patch::PatchCollection;

/// Capability shared by every primitive that can be lit by the solver.
pub trait Shape {
    /// The material applied to every patch of this shape.
    fn material(&self) -> MaterialId;

    /// Analytic area of the shape's boundary surface.
    fn surface_area(&self) -> f64;

    /// Decomposes the surface into quadrilateral patches no larger than
    /// `patch_size` along either side (for parallelogram faces).
    ///
    /// The returned patches exactly tile the surface and inherit the shape's
    /// material and its emission.
    ///
    /// # Errors
    ///
    /// Returns an error if `patch_size` is not positive and finite, or the
    /// shape's material is not in `materials`.
    fn split_into_patches(
        &self,
        patch_size: f64,
        materials: &MaterialStore,
    ) -> Result<PatchCollection>;
}

/// Closed set of shapes a scene can hold.
#[derive(Debug, Clone)]
pub enum SceneShape {
    /// A single planar quadrilateral.
    Quad(Quad),
    /// A six-sided box.
    Cuboid(Cuboid),
}

impl Shape for SceneShape {
    fn material(&self) -> MaterialId {
        match self {
            Self::Quad(quad) => quad.material(),
            Self::Cuboid(cuboid) => cuboid.material(),
        }
    }

    fn surface_area(&self) -> f64 {
        match self {
            Self::Quad(quad) => quad.surface_area(),
            Self::Cuboid(cuboid) => cuboid.surface_area(),
        }
    }

    fn split_into_patches(
        &self,
        patch_size: f64,
        materials: &MaterialStore,
    ) -> Result<PatchCollection> {
        match self {
            Self::Quad(quad) => quad.split_into_patches(patch_size, materials),
            Self::Cuboid(cuboid) => cuboid.split_into_patches(patch_size, materials),
        }
    }
}

impl From<Quad> for SceneShape {
    fn from(quad: Quad) -> Self {
        Self::Quad(quad)
    }
}

impl From<Cuboid> for SceneShape {
    fn from(cuboid: Cuboid) -> Self {
        Self::Cuboid(cuboid)
    }
}

/// Upper bound on the patches of one face and of the form factor table.
///
/// The table is dense, so its memory grows with the square of this.
pub const MAX_PATCHES: usize = 1 << 16;

/// Rejects patch sizes that are zero, negative or not finite.
///
/// # Errors
///
/// Returns [`ConfigError::NonPositivePatchSize`] for an unusable size.
pub fn check_patch_size(patch_size: f64) -> Result<()> {
    if patch_size.is_finite() && patch_size > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositivePatchSize(patch_size).into())
    }
}
