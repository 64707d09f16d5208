use nalgebra::UnitQuaternion;

use crate::error::{GeometryError, Result};
use crate::material::{MaterialId, MaterialStore};
use crate::math::{Point3, Vector3};
use crate::patch::PatchCollection;

use super::{check_patch_size, Quad, Shape};

/// Faces of a [`Cuboid`], in the order patches are emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CuboidFace {
    /// +Z side.
    Front,
    /// +X side.
    Right,
    /// −Z side.
    Back,
    /// −X side.
    Left,
    /// +Y side.
    Top,
    /// −Y side.
    Bottom,
}

impl CuboidFace {
    /// All faces in emission order.
    pub const ALL: [CuboidFace; 6] = [
        CuboidFace::Front,
        CuboidFace::Right,
        CuboidFace::Back,
        CuboidFace::Left,
        CuboidFace::Top,
        CuboidFace::Bottom,
    ];
}

/// A box given by its center and its extents along its local axes.
///
/// Faces are wound so that normals point away from the interior. A box used
/// as a closed room can flip them with [`Cuboid::with_inward_normals`].
#[derive(Debug, Clone)]
pub struct Cuboid {
    center: Point3,
    width: f64,
    height: f64,
    depth: f64,
    rotation: UnitQuaternion<f64>,
    inward: bool,
    material: MaterialId,
}

impl Cuboid {
    /// Creates an axis-aligned box.
    ///
    /// `width`, `height` and `depth` are measured along X, Y and Z.
    ///
    /// # Errors
    ///
    /// Returns an error if any extent is not positive and finite.
    pub fn new(
        center: Point3,
        width: f64,
        height: f64,
        depth: f64,
        material: MaterialId,
    ) -> Result<Self> {
        for (name, value) in [("width", width), ("height", height), ("depth", depth)] {
            if !(value.is_finite() && value > 0.0) {
                return Err(GeometryError::Degenerate(format!(
                    "box {name} must be positive, got {value}"
                ))
                .into());
            }
        }
        Ok(Self {
            center,
            width,
            height,
            depth,
            rotation: UnitQuaternion::identity(),
            inward: false,
            material,
        })
    }

    /// Rotates the box about its center.
    #[must_use]
    pub fn with_rotation(mut self, rotation: UnitQuaternion<f64>) -> Self {
        self.rotation = rotation;
        self
    }

    /// Makes every face normal point into the box.
    #[must_use]
    pub fn with_inward_normals(mut self) -> Self {
        self.inward = true;
        self
    }

    /// Center of the box.
    #[must_use]
    pub fn center(&self) -> &Point3 {
        &self.center
    }

    /// Returns `true` if face normals point into the box.
    #[must_use]
    pub fn is_inward(&self) -> bool {
        self.inward
    }

    /// Builds the quad of one face.
    ///
    /// # Errors
    ///
    /// Returns an error if the face quad is degenerate.
    pub fn face(&self, face: CuboidFace) -> Result<Quad> {
        let x = self.rotation * Vector3::x();
        let y = self.rotation * Vector3::y();
        let z = self.rotation * Vector3::z();

        let hw = self.width / 2.0;
        let hh = self.height / 2.0;
        let hd = self.depth / 2.0;

        let corner = |sx: f64, sy: f64, sz: f64| {
            self.center + x * (sx * hw) + y * (sy * hh) + z * (sz * hd)
        };

        let vertices = match face {
            CuboidFace::Front => [
                corner(-1.0, -1.0, 1.0),
                corner(1.0, -1.0, 1.0),
                corner(1.0, 1.0, 1.0),
                corner(-1.0, 1.0, 1.0),
            ],
            CuboidFace::Right => [
                corner(1.0, -1.0, 1.0),
                corner(1.0, -1.0, -1.0),
                corner(1.0, 1.0, -1.0),
                corner(1.0, 1.0, 1.0),
            ],
            CuboidFace::Back => [
                corner(1.0, -1.0, -1.0),
                corner(-1.0, -1.0, -1.0),
                corner(-1.0, 1.0, -1.0),
                corner(1.0, 1.0, -1.0),
            ],
            CuboidFace::Left => [
                corner(-1.0, -1.0, -1.0),
                corner(-1.0, -1.0, 1.0),
                corner(-1.0, 1.0, 1.0),
                corner(-1.0, 1.0, -1.0),
            ],
            CuboidFace::Top => [
                corner(1.0, 1.0, 1.0),
                corner(1.0, 1.0, -1.0),
                corner(-1.0, 1.0, -1.0),
                corner(-1.0, 1.0, 1.0),
            ],
            CuboidFace::Bottom => [
                corner(1.0, -1.0, 1.0),
                corner(-1.0, -1.0, 1.0),
                corner(-1.0, -1.0, -1.0),
                corner(1.0, -1.0, -1.0),
            ],
        };

        let vertices = if self.inward {
            let [v0, v1, v2, v3] = vertices;
            [v0, v3, v2, v1]
        } else {
            vertices
        };

        Quad::new(vertices, self.material)
    }

    /// The six face quads in emission order.
    ///
    /// # Errors
    ///
    /// Returns an error if a face quad is degenerate.
    pub fn faces(&self) -> Result<Vec<Quad>> {
        CuboidFace::ALL.iter().map(|&face| self.face(face)).collect()
    }
}

impl Shape for Cuboid {
    fn material(&self) -> MaterialId {
        self.material
    }

    fn surface_area(&self) -> f64 {
        2.0 * (self.width * self.height + self.height * self.depth + self.width * self.depth)
    }

    fn split_into_patches(
        &self,
        patch_size: f64,
        materials: &MaterialStore,
    ) -> Result<PatchCollection> {
        check_patch_size(patch_size)?;

        let mut patches = PatchCollection::new();
        for face in self.faces()? {
            patches.append(face.split_into_patches(patch_size, materials)?);
        }
        Ok(patches)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::f64::consts::FRAC_PI_4;

    use approx::assert_relative_eq;

    use super::*;
    use crate::material::Material;
    use crate::math::polygon_3d::point_in_convex_quad;
    use crate::math::{Rgb, TOLERANCE};

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn store_with_material() -> (MaterialStore, MaterialId) {
        let mut store = MaterialStore::new();
        let id = store.add(Material::diffuse(Rgb::new(0.7, 0.7, 0.7)).unwrap());
        (store, id)
    }

    #[test]
    fn large_patch_size_yields_one_patch_per_face() {
        let (store, id) = store_with_material();
        let cuboid = Cuboid::new(p(1.0, 2.0, 3.0), 2.0, 3.0, 4.0, id).unwrap();
        let patches = cuboid.split_into_patches(4.0, &store).unwrap();
        assert_eq!(patches.len(), 6);
    }

    #[test]
    fn two_unit_box_with_unit_patches() {
        let (store, id) = store_with_material();
        let cuboid = Cuboid::new(p(0.0, 0.0, 0.0), 2.0, 2.0, 2.0, id).unwrap();
        let patches = cuboid.split_into_patches(1.0, &store).unwrap();
        assert_eq!(patches.len(), 24);
        for patch in &patches {
            assert_relative_eq!(patch.area(), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn faces_are_emitted_in_order() {
        let (store, id) = store_with_material();
        let cuboid = Cuboid::new(p(0.0, 0.0, 0.0), 2.0, 2.0, 2.0, id).unwrap();
        let patches = cuboid.split_into_patches(1.0, &store).unwrap();
        let expected = [
            Vector3::z(),
            Vector3::x(),
            -Vector3::z(),
            -Vector3::x(),
            Vector3::y(),
            -Vector3::y(),
        ];
        for (face, normal) in expected.iter().enumerate() {
            for patch in patches.iter().skip(face * 4).take(4) {
                assert!((patch.normal() - normal).norm() < TOLERANCE);
            }
        }
    }

    #[test]
    fn tiling_is_complete_for_uneven_sizes() {
        let (store, id) = store_with_material();
        let cuboid = Cuboid::new(p(0.5, -1.0, 2.0), 1.3, 2.2, 0.9, id).unwrap();
        let patches = cuboid.split_into_patches(0.4, &store).unwrap();
        assert_relative_eq!(patches.total_area(), cuboid.surface_area(), epsilon = 1e-9);

        for patch in &patches {
            let c = patch.centroid();
            let owners = patches
                .iter()
                .filter(|other| {
                    other.plane().signed_distance(&c).abs() < 1e-9
                        && point_in_convex_quad(&c, other.vertices(), other.normal())
                })
                .count();
            assert_eq!(owners, 1);
        }
    }

    #[test]
    fn normals_point_outward() {
        let (store, id) = store_with_material();
        let center = p(3.0, -2.0, 1.0);
        let cuboid = Cuboid::new(center, 1.0, 2.0, 3.0, id)
            .unwrap()
            .with_rotation(UnitQuaternion::from_euler_angles(0.3, FRAC_PI_4, -0.2));
        let patches = cuboid.split_into_patches(0.5, &store).unwrap();
        for patch in &patches {
            let outward = patch.centroid() - center;
            assert!(patch.normal().dot(&outward) > 0.0);
        }
        assert_relative_eq!(patches.total_area(), cuboid.surface_area(), epsilon = 1e-9);
    }

    #[test]
    fn inward_normals_point_to_center() {
        let (store, id) = store_with_material();
        let center = p(0.0, 0.0, 0.0);
        let cuboid = Cuboid::new(center, 4.0, 4.0, 4.0, id)
            .unwrap()
            .with_inward_normals();
        let patches = cuboid.split_into_patches(1.0, &store).unwrap();
        assert_eq!(patches.len(), 96);
        for patch in &patches {
            let outward = patch.centroid() - center;
            assert!(patch.normal().dot(&outward) < 0.0);
        }
    }

    #[test]
    fn degenerate_extent_is_rejected() {
        let (_, id) = store_with_material();
        assert!(Cuboid::new(p(0.0, 0.0, 0.0), 0.0, 1.0, 1.0, id).is_err());
        assert!(Cuboid::new(p(0.0, 0.0, 0.0), 1.0, -1.0, 1.0, id).is_err());
        assert!(Cuboid::new(p(0.0, 0.0, 0.0), 1.0, 1.0, f64::NAN, id).is_err());
    }

    #[test]
    fn non_positive_patch_size_is_rejected() {
        let (store, id) = store_with_material();
        let cuboid = Cuboid::new(p(0.0, 0.0, 0.0), 1.0, 1.0, 1.0, id).unwrap();
        assert!(cuboid.split_into_patches(0.0, &store).is_err());
    }
}
