use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use nalgebra::{Unit, UnitQuaternion};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{GeometryError, Result, SceneError};
use crate::geometry::{Cuboid, Quad, SceneShape};
use crate::material::{Material, MaterialId, MaterialStore};
use crate::math::{Point3, Rgb, Vector3, TOLERANCE};
use crate::render::Camera;

use super::Scene;

/// JSON form of a [`Scene`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SceneDescription {
    pub camera: CameraDescription,
    /// `[width, height]`; the default resolution is used when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<[u32; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<[f64; 3]>,
    /// Materials by name.
    pub materials: BTreeMap<String, MaterialDescription>,
    pub shapes: Vec<ShapeDescription>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CameraDescription {
    pub position: [f64; 3],
    pub look_at: [f64; 3],
    pub up: [f64; 3],
    /// Vertical field of view in degrees.
    pub fov: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MaterialDescription {
    pub reflectance: [f64; 3],
    #[serde(default)]
    pub emission: [f64; 3],
}

/// Rotation about `axis` by `angle` degrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RotationDescription {
    pub axis: [f64; 3],
    pub angle: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ShapeDescription {
    Box {
        center: [f64; 3],
        width: f64,
        height: f64,
        depth: f64,
        material: String,
        /// Normals point into the box (a room seen from inside).
        #[serde(default)]
        inward: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        rotation: Option<RotationDescription>,
    },
    Quad {
        vertices: [[f64; 3]; 4],
        material: String,
    },
}

impl SceneDescription {
    /// Parses a description from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::Parse`] for malformed JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json).map_err(SceneError::from)?)
    }

    /// Serializes the description as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::Parse`] if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self).map_err(SceneError::from)?)
    }

    /// Builds the scene: validates materials, then shapes in file order.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::MaterialNotFound`] for a shape naming an unknown
    /// material, [`ConfigError::InvalidResolution`](crate::error::ConfigError::InvalidResolution)
    /// for a zero image side, and a geometry error for invalid materials,
    /// shapes or camera.
    pub fn into_scene(self) -> Result<Scene> {
        let mut materials = MaterialStore::new();
        let mut ids: HashMap<String, MaterialId> = HashMap::new();
        for (name, description) in self.materials {
            let material = Material::new(rgb(description.reflectance), rgb(description.emission))?;
            ids.insert(name, materials.add(material));
        }

        let camera = Camera::new(
            point(self.camera.position),
            point(self.camera.look_at),
            vector(self.camera.up),
            self.camera.fov,
        )?;

        let mut scene = Scene::new(camera, materials);
        if let Some([width, height]) = self.resolution {
            scene = scene.with_resolution(width, height)?;
        }
        if let Some(background) = self.background {
            scene = scene.with_background(rgb(background));
        }

        for shape in self.shapes {
            let shape = build_shape(shape, &ids)?;
            scene.add_shape(shape)?;
        }
        Ok(scene)
    }
}

fn build_shape(
    description: ShapeDescription,
    ids: &HashMap<String, MaterialId>,
) -> Result<SceneShape> {
    let lookup = |name: &str| {
        ids.get(name)
            .copied()
            .ok_or_else(|| SceneError::MaterialNotFound(name.to_owned()))
    };

    match description {
        ShapeDescription::Box {
            center,
            width,
            height,
            depth,
            material,
            inward,
            rotation,
        } => {
            let mut cuboid = Cuboid::new(point(center), width, height, depth, lookup(&material)?)?;
            if let Some(rotation) = rotation {
                let axis = Unit::try_new(vector(rotation.axis), TOLERANCE)
                    .ok_or(GeometryError::ZeroVector)?;
                cuboid = cuboid.with_rotation(UnitQuaternion::from_axis_angle(
                    &axis,
                    rotation.angle.to_radians(),
                ));
            }
            if inward {
                cuboid = cuboid.with_inward_normals();
            }
            Ok(cuboid.into())
        }
        ShapeDescription::Quad { vertices, material } => {
            let quad = Quad::new(vertices.map(point), lookup(&material)?)?;
            Ok(quad.into())
        }
    }
}

fn point([x, y, z]: [f64; 3]) -> Point3 {
    Point3::new(x, y, z)
}

fn vector([x, y, z]: [f64; 3]) -> Vector3 {
    Vector3::new(x, y, z)
}

fn rgb([r, g, b]: [f64; 3]) -> Rgb {
    Rgb::new(r, g, b)
}

/// Reads scenes from JSON files.
#[derive(Debug, Clone, Copy, Default)]
pub struct SceneLoader;

impl SceneLoader {
    /// Loads and builds the scene stored at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::Io`] if the file cannot be read, and any error of
    /// [`SceneLoader::from_json`].
    pub fn load(path: impl AsRef<Path>) -> Result<Scene> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading scene");
        let json = std::fs::read_to_string(path).map_err(|source| SceneError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Builds a scene from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::Parse`] for malformed JSON, and any error of
    /// [`SceneDescription::into_scene`].
    pub fn from_json(json: &str) -> Result<Scene> {
        SceneDescription::from_json(json)?.into_scene()
    }
}
