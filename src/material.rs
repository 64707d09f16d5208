use slotmap::SlotMap;

use crate::error::{GeometryError, Result, SceneError};
use crate::math::Rgb;

slotmap::new_key_type! {
    /// Unique identifier for a material in the material store.
    pub struct MaterialId;
}

/// Diffuse surface description shared by every patch cut from a shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    reflectance: Rgb,
    emission: Rgb,
}

impl Material {
    /// Creates a new material.
    ///
    /// # Errors
    ///
    /// Returns an error if a reflectance channel is outside `[0, 1]` or an
    /// emission channel is negative or non-finite.
    pub fn new(reflectance: Rgb, emission: Rgb) -> Result<Self> {
        if reflectance.iter().any(|c| !(0.0..=1.0).contains(c)) {
            return Err(GeometryError::InvalidMaterial(format!(
                "reflectance {reflectance:?} must lie in [0, 1]"
            ))
            .into());
        }
        if emission.iter().any(|c| !c.is_finite() || *c < 0.0) {
            return Err(GeometryError::InvalidMaterial(format!(
                "emission {emission:?} must be finite and non-negative"
            ))
            .into());
        }
        Ok(Self {
            reflectance,
            emission,
        })
    }

    /// Creates a non-emissive material.
    ///
    /// # Errors
    ///
    /// Returns an error if a reflectance channel is outside `[0, 1]`.
    pub fn diffuse(reflectance: Rgb) -> Result<Self> {
        Self::new(reflectance, Rgb::zeros())
    }

    /// Fraction of incoming energy re-emitted, per channel.
    #[must_use]
    pub fn reflectance(&self) -> &Rgb {
        &self.reflectance
    }

    /// Self-emitted radiosity, per channel.
    #[must_use]
    pub fn emission(&self) -> &Rgb {
        &self.emission
    }

    /// Returns `true` if any emission channel is positive.
    #[must_use]
    pub fn is_emissive(&self) -> bool {
        self.emission.iter().any(|c| *c > 0.0)
    }
}

/// Arena that owns all materials of a scene.
///
/// Shapes and patches refer to materials via [`MaterialId`], so a material is
/// stored exactly once no matter how many patches use it.
#[derive(Debug, Default, Clone)]
pub struct MaterialStore {
    materials: SlotMap<MaterialId, Material>,
}

impl MaterialStore {
    /// Creates a new, empty material store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a material and returns its ID.
    pub fn add(&mut self, material: Material) -> MaterialId {
        self.materials.insert(material)
    }

    /// Returns a reference to the material, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the material is not in the store.
    pub fn get(&self, id: MaterialId) -> Result<&Material> {
        self.materials
            .get(id)
            .ok_or_else(|| SceneError::MaterialNotFound(format!("{id:?}")).into())
    }

    /// Number of stored materials.
    #[must_use]
    pub fn len(&self) -> usize {
        self.materials.len()
    }

    /// Returns `true` if the store holds no material.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}
