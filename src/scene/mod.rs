mod loader;

pub use loader::{
    CameraDescription, MaterialDescription, RotationDescription, SceneDescription, SceneLoader,
    ShapeDescription,
};

use tracing::debug;

use crate::error::{ConfigError, Result};
use crate::geometry::{check_patch_size, SceneShape, Shape};
use crate::material::MaterialStore;
use crate::math::Rgb;
use crate::patch::PatchCollection;
use crate::render::Camera;

/// Image resolution used when a scene does not specify one.
pub const DEFAULT_RESOLUTION: (u32, u32) = (512, 512);

/// Everything needed to light and render a static scene.
///
/// Shapes keep their insertion order; the patches they decompose into are
/// concatenated in that order.
#[derive(Debug, Clone)]
pub struct Scene {
    materials: MaterialStore,
    shapes: Vec<SceneShape>,
    camera: Camera,
    resolution: (u32, u32),
    background: Rgb,
}

impl Scene {
    /// Creates an empty scene viewed through `camera`.
    #[must_use]
    pub fn new(camera: Camera, materials: MaterialStore) -> Self {
        Self {
            materials,
            shapes: Vec::new(),
            camera,
            resolution: DEFAULT_RESOLUTION,
            background: Rgb::zeros(),
        }
    }

    /// Sets the image resolution used when rendering this scene.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidResolution`] if either side is zero.
    pub fn with_resolution(mut self, width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(ConfigError::InvalidResolution { width, height }.into());
        }
        self.resolution = (width, height);
        Ok(self)
    }

    #[must_use]
    pub fn with_background(mut self, background: Rgb) -> Self {
        self.background = background;
        self
    }

    /// Appends a shape.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::MaterialNotFound`](crate::error::SceneError::MaterialNotFound)
    /// if the shape's material is not in this scene's store.
    pub fn add_shape(&mut self, shape: impl Into<SceneShape>) -> Result<()> {
        let shape = shape.into();
        self.materials.get(shape.material())?;
        self.shapes.push(shape);
        Ok(())
    }

    #[must_use]
    pub fn materials(&self) -> &MaterialStore {
        &self.materials
    }

    #[must_use]
    pub fn shapes(&self) -> &[SceneShape] {
        &self.shapes
    }

    #[must_use]
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Preferred `(width, height)` of rendered images.
    #[must_use]
    pub fn resolution(&self) -> (u32, u32) {
        self.resolution
    }

    #[must_use]
    pub fn background(&self) -> &Rgb {
        &self.background
    }

    /// Sum of the analytic surface areas of all shapes.
    #[must_use]
    pub fn surface_area(&self) -> f64 {
        self.shapes.iter().map(Shape::surface_area).sum()
    }

    /// Decomposes every shape and concatenates the patches in shape order.
    ///
    /// # Errors
    ///
    /// Returns an error if `patch_size` is not positive and finite.
    pub fn split_into_patches(&self, patch_size: f64) -> Result<PatchCollection> {
        check_patch_size(patch_size)?;
        let mut patches = PatchCollection::new();
        for (index, shape) in self.shapes.iter().enumerate() {
            let part = shape.split_into_patches(patch_size, &self.materials)?;
            debug!(shape = index, patches = part.len(), "shape decomposed");
            patches.append(part);
        }
        Ok(patches)
    }
}
