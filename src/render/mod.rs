//! Turns solved patches into an image.
//!
//! One primary ray per pixel center; the nearest patch, seen from either
//! side, decides the colour.

mod camera;
mod pixel_buffer;

pub use camera::Camera;
pub use pixel_buffer::PixelBuffer;

use std::collections::HashMap;

use rayon::prelude::*;
use tracing::info;

use crate::error::{ConfigError, Result};
use crate::math::polygon_3d::inverse_bilinear;
use crate::math::{Point3, Rgb, Vector3};
use crate::patch::QuadPatch;
use crate::trace::{Tracer, Visibility};

/// Grid used to weld vertex positions shared by neighbouring patches.
const WELD_POSITION: f64 = 1e-6;

/// Grid used to compare vertex normals.
const WELD_NORMAL: f64 = 1e-3;

/// How a patch's radiosity is spread over its pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Shading {
    /// One constant colour per patch.
    Flat,
    /// Bilinear interpolation of per-vertex radiosity.
    #[default]
    Smooth,
}

/// Renders a patch list as seen from a camera.
#[derive(Debug, Clone)]
pub struct RenderScene<'a> {
    camera: &'a Camera,
    width: u32,
    height: u32,
    shading: Shading,
    background: Rgb,
    exposure: f64,
}

impl<'a> RenderScene<'a> {
    /// Creates a new render operation for a `width × height` image.
    #[must_use]
    pub fn new(camera: &'a Camera, width: u32, height: u32) -> Self {
        Self {
            camera,
            width,
            height,
            shading: Shading::default(),
            background: Rgb::zeros(),
            exposure: 1.0,
        }
    }

    /// Selects flat or smooth shading.
    #[must_use]
    pub fn with_shading(mut self, shading: Shading) -> Self {
        self.shading = shading;
        self
    }

    /// Colour of pixels whose ray hits nothing.
    #[must_use]
    pub fn with_background(mut self, background: Rgb) -> Self {
        self.background = background;
        self
    }

    /// Scale applied to patch radiosity (not to the background).
    #[must_use]
    pub fn with_exposure(mut self, exposure: f64) -> Self {
        self.exposure = exposure;
        self
    }

    /// Executes the render.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidResolution`] if the width or height is
    /// zero, or [`ConfigError::InvalidParameter`] for a negative or
    /// non-finite exposure.
    pub fn execute(&self, patches: &[QuadPatch]) -> Result<PixelBuffer> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::InvalidResolution {
                width: self.width,
                height: self.height,
            }
            .into());
        }
        if !self.exposure.is_finite() || self.exposure < 0.0 {
            return Err(ConfigError::InvalidParameter(format!(
                "exposure must be finite and non-negative, got {}",
                self.exposure
            ))
            .into());
        }

        info!(
            width = self.width,
            height = self.height,
            patches = patches.len(),
            shading = ?self.shading,
            "rendering scene"
        );

        let tracer = Tracer::new(patches, Visibility::Bvh);
        let corners = match self.shading {
            Shading::Flat => None,
            Shading::Smooth => Some(vertex_radiosities(patches)),
        };

        let width = self.width as usize;
        let mut pixels = vec![self.background; width * self.height as usize];
        pixels
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(y, row)| {
                for (x, pixel) in row.iter_mut().enumerate() {
                    #[allow(clippy::cast_precision_loss)]
                    let ray = self.camera.primary_ray(
                        x as f64 + 0.5,
                        y as f64 + 0.5,
                        self.width,
                        self.height,
                    );
                    if let Some(hit) = tracer.nearest_hit(&ray, None) {
                        let patch = &patches[hit.index];
                        let color = match &corners {
                            None => *patch.radiosity(),
                            Some(corners) => {
                                interpolate(patch, &corners[hit.index], &ray.at(hit.t))
                            }
                        };
                        *pixel = color * self.exposure;
                    }
                }
            });

        Ok(PixelBuffer::from_pixels(self.width, self.height, pixels))
    }
}

/// Position and normal snapped to the weld grids.
type VertexKey = ([i64; 3], [i64; 3]);

#[allow(clippy::cast_possible_truncation)]
fn vertex_key(position: &Point3, normal: &Vector3) -> VertexKey {
    let snap = |x: f64, grid: f64| (x / grid).round() as i64;
    (
        [
            snap(position.x, WELD_POSITION),
            snap(position.y, WELD_POSITION),
            snap(position.z, WELD_POSITION),
        ],
        [
            snap(normal.x, WELD_NORMAL),
            snap(normal.y, WELD_NORMAL),
            snap(normal.z, WELD_NORMAL),
        ],
    )
}

/// Per-vertex radiosity of every patch: the area-weighted mean radiosity of
/// all patches sharing that vertex position and normal.
fn vertex_radiosities(patches: &[QuadPatch]) -> Vec<[Rgb; 4]> {
    let mut sums: HashMap<VertexKey, (Rgb, f64)> = HashMap::new();
    for patch in patches {
        for vertex in patch.vertices() {
            let entry = sums
                .entry(vertex_key(vertex, patch.normal()))
                .or_insert((Rgb::zeros(), 0.0));
            entry.0 += patch.radiosity() * patch.area();
            entry.1 += patch.area();
        }
    }

    patches
        .iter()
        .map(|patch| {
            let mut corners = [*patch.radiosity(); 4];
            for (corner, vertex) in corners.iter_mut().zip(patch.vertices()) {
                if let Some((sum, weight)) = sums.get(&vertex_key(vertex, patch.normal())) {
                    if *weight > 0.0 {
                        *corner = sum / *weight;
                    }
                }
            }
            corners
        })
        .collect()
}

fn interpolate(patch: &QuadPatch, corners: &[Rgb; 4], point: &Point3) -> Rgb {
    let (s, t) = inverse_bilinear(patch.vertices(), patch.plane(), point);
    let bottom = corners[0] * (1.0 - s) + corners[1] * s;
    let top = corners[3] * (1.0 - s) + corners[2] * s;
    bottom * (1.0 - t) + top * t
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::RadiosityError;
    use crate::geometry::{Quad, Shape};
    use crate::material::{Material, MaterialStore};
    use crate::patch::PatchCollection;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn camera() -> Camera {
        Camera::new(p(0.0, 0.0, 5.0), p(0.0, 0.0, 0.0), Vector3::y(), 60.0).unwrap()
    }

    /// Large square at `z = 0` facing the camera, split into a 2x2 grid.
    fn wall(emission: Rgb) -> PatchCollection {
        let mut store = MaterialStore::new();
        let id = store.add(Material::new(Rgb::new(0.5, 0.5, 0.5), emission).unwrap());
        Quad::new(
            [p(-20.0, -20.0, 0.0), p(20.0, -20.0, 0.0), p(20.0, 20.0, 0.0), p(-20.0, 20.0, 0.0)],
            id,
        )
        .unwrap()
        .split_into_patches(20.0, &store)
        .unwrap()
    }

    #[test]
    fn empty_view_shows_background() {
        let background = Rgb::new(0.1, 0.2, 0.3);
        let buffer = RenderScene::new(&camera(), 8, 6)
            .with_background(background)
            .execute(&[])
            .unwrap();
        assert_eq!(buffer.width(), 8);
        assert_eq!(buffer.height(), 6);
        assert!(buffer.pixels().iter().all(|c| *c == background));
    }

    #[test]
    fn zero_resolution_is_rejected() {
        let result = RenderScene::new(&camera(), 0, 10).execute(&[]);
        assert!(matches!(
            result,
            Err(RadiosityError::Config(ConfigError::InvalidResolution {
                width: 0,
                height: 10
            }))
        ));
    }

    #[test]
    fn negative_exposure_is_rejected() {
        let result = RenderScene::new(&camera(), 4, 4).with_exposure(-1.0).execute(&[]);
        assert!(result.is_err());
    }

    #[test]
    fn uniform_wall_fills_the_frame() {
        let patches = wall(Rgb::new(0.4, 0.4, 0.4));
        for shading in [Shading::Flat, Shading::Smooth] {
            let buffer = RenderScene::new(&camera(), 16, 16)
                .with_shading(shading)
                .with_exposure(2.0)
                .execute(patches.as_slice())
                .unwrap();
            for color in buffer.pixels() {
                assert!((color - Rgb::new(0.8, 0.8, 0.8)).norm() < 1e-9, "{shading:?}");
            }
        }
    }

    #[test]
    fn back_side_of_patch_is_visible() {
        let patches = wall(Rgb::new(1.0, 1.0, 1.0));
        let behind = Camera::new(p(0.0, 0.0, -5.0), p(0.0, 0.0, 0.0), Vector3::y(), 60.0).unwrap();
        let buffer = RenderScene::new(&behind, 4, 4).execute(patches.as_slice()).unwrap();
        assert!((buffer.get(2, 2).unwrap() - Rgb::new(1.0, 1.0, 1.0)).norm() < 1e-9);
    }

    #[test]
    fn shared_vertices_average_by_area() {
        let mut patches = wall(Rgb::zeros());
        assert_eq!(patches.len(), 4);
        patches[0].set_radiosity(Rgb::new(1.0, 0.0, 0.0));

        let corners = vertex_radiosities(patches.as_slice());
        // The center vertex is shared by all four equal patches.
        let center = corners[0]
            .iter()
            .zip(patches[0].vertices())
            .find(|(_, v)| v.coords.norm() < 1e-9)
            .map(|(c, _)| *c)
            .unwrap();
        assert!((center - Rgb::new(0.25, 0.0, 0.0)).norm() < 1e-12);
        // The outer corner belongs to patch 0 alone.
        assert!((corners[0][0] - Rgb::new(1.0, 0.0, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn smooth_shading_blends_across_patch_edges() {
        let mut patches = wall(Rgb::zeros());
        patches[0].set_radiosity(Rgb::new(1.0, 1.0, 1.0));
        patches[2].set_radiosity(Rgb::new(1.0, 1.0, 1.0));
        // Left half bright, right half dark; image column 0 looks left.
        let render = |shading| {
            RenderScene::new(&camera(), 64, 8)
                .with_shading(shading)
                .execute(patches.as_slice())
                .unwrap()
        };

        let flat = render(Shading::Flat);
        let smooth = render(Shading::Smooth);
        let (left, right) = (31, 32);
        assert!((flat.get(left, 4).unwrap().x - 1.0).abs() < 1e-12);
        assert!(flat.get(right, 4).unwrap().x.abs() < 1e-12);

        let jump = smooth.get(left, 4).unwrap().x - smooth.get(right, 4).unwrap().x;
        assert!(jump > 0.0 && jump < 0.05, "smooth jump {jump}");
    }
}
