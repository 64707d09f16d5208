use std::path::Path;

use tracing::info;

use crate::config::IlluminationParams;
use crate::error::{ConfigError, RenderError, Result, SceneError};
use crate::form_factor::{EstimateFormFactors, FormFactorTable};
use crate::patch::PatchCollection;
use crate::render::{PixelBuffer, RenderScene, Shading};
use crate::scene::Scene;
use crate::solver::{SolveRadiosity, SolveReport};

/// Drives the pipeline: decomposition, form factors, solve, render, save.
///
/// Each phase needs the previous one; calling a phase early is an error,
/// never a panic. Setting a new scene discards everything computed for the
/// old one.
#[derive(Debug, Default)]
pub struct RadiosityEngine {
    scene: Option<Scene>,
    resolution: Option<(u32, u32)>,
    shading: Shading,
    patches: PatchCollection,
    form_factors: Option<FormFactorTable>,
    image: Option<PixelBuffer>,
}

impl RadiosityEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the scene and drops all derived results.
    pub fn set_scene(&mut self, scene: Scene) {
        self.scene = Some(scene);
        self.patches = PatchCollection::new();
        self.form_factors = None;
        self.image = None;
    }

    /// Overrides the scene's image resolution.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidResolution`] if either side is zero.
    pub fn set_image_resolution(&mut self, width: u32, height: u32) -> Result<()> {
        if width == 0 || height == 0 {
            return Err(ConfigError::InvalidResolution { width, height }.into());
        }
        self.resolution = Some((width, height));
        Ok(())
    }

    /// Selects the shading used by [`RadiosityEngine::render_scene`].
    pub fn set_shading(&mut self, shading: Shading) {
        self.shading = shading;
    }

    #[must_use]
    pub fn scene(&self) -> Option<&Scene> {
        self.scene.as_ref()
    }

    /// Resolution used by [`RadiosityEngine::render_scene`].
    #[must_use]
    pub fn image_resolution(&self) -> Option<(u32, u32)> {
        self.resolution.or_else(|| self.scene.as_ref().map(Scene::resolution))
    }

    /// Patches of the last illumination run, with their solved radiosity.
    #[must_use]
    pub fn patches(&self) -> &PatchCollection {
        &self.patches
    }

    #[must_use]
    pub fn form_factors(&self) -> Option<&FormFactorTable> {
        self.form_factors.as_ref()
    }

    #[must_use]
    pub fn rendered_image(&self) -> Option<&PixelBuffer> {
        self.image.as_ref()
    }

    /// Lights the scene with default settings for everything but the budget.
    ///
    /// # Errors
    ///
    /// See [`RadiosityEngine::calculate_illumination_with`].
    pub fn calculate_illumination(
        &mut self,
        iterations: usize,
        patch_size: f64,
        rays_per_patch: usize,
    ) -> Result<SolveReport> {
        self.calculate_illumination_with(&IlluminationParams::new(
            iterations,
            patch_size,
            rays_per_patch,
        ))
    }

    /// Decomposes the scene, estimates form factors and solves for radiosity.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for invalid parameters,
    /// [`SceneError::NotLoaded`] without a scene, or the first error of any
    /// phase. Previous results are kept when an error occurs.
    pub fn calculate_illumination_with(
        &mut self,
        params: &IlluminationParams,
    ) -> Result<SolveReport> {
        params.validate()?;
        let scene = self.scene.as_ref().ok_or(SceneError::NotLoaded)?;

        let mut patches = scene.split_into_patches(params.patch_size)?;
        info!(
            shapes = scene.shapes().len(),
            patches = patches.len(),
            "scene decomposed"
        );

        let table = EstimateFormFactors::new(params.rays_per_patch)
            .with_seed(params.seed)
            .with_visibility(params.visibility)
            .with_reciprocity(params.enforce_reciprocity)
            .execute(&patches)?;

        let report = SolveRadiosity::new(params.iterations)
            .with_scheme(params.scheme)
            .execute(&mut patches, &table, scene.materials())?;
        info!(
            initial = report.initial_total(),
            last = report.final_total(),
            "illumination solved"
        );

        self.patches = patches;
        self.form_factors = Some(table);
        self.image = None;
        Ok(report)
    }

    /// Renders the lit patches from the scene camera.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::NotLoaded`] without a scene,
    /// [`RenderError::NotIlluminated`] before
    /// [`RadiosityEngine::calculate_illumination`], or a render error.
    pub fn render_scene(&mut self) -> Result<&PixelBuffer> {
        let scene = self.scene.as_ref().ok_or(SceneError::NotLoaded)?;
        if self.form_factors.is_none() {
            return Err(RenderError::NotIlluminated.into());
        }
        let (width, height) = self.resolution.unwrap_or_else(|| scene.resolution());

        let image = RenderScene::new(scene.camera(), width, height)
            .with_shading(self.shading)
            .with_background(*scene.background())
            .execute(self.patches.as_slice())?;
        Ok(self.image.insert(image))
    }

    /// Writes the last rendered image to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::NotRendered`] before
    /// [`RadiosityEngine::render_scene`], or [`RenderError::ImageWrite`].
    pub fn save_rendered_image_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let image = self.image.as_ref().ok_or(RenderError::NotRendered)?;
        let path = path.as_ref();
        image.save(path)?;
        info!(path = %path.display(), "image saved");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::RadiosityError;
    use crate::math::Rgb;
    use crate::scene::SceneLoader;

    const SMALL_ROOM: &str = r#"{
        "camera": { "position": [0, 0, 1.9], "look_at": [0, 0, 0], "up": [0, 1, 0], "fov": 70 },
        "resolution": [12, 10],
        "background": [1, 0, 1],
        "materials": {
            "wall": { "reflectance": [0.6, 0.6, 0.6] },
            "lamp": { "reflectance": [0.2, 0.2, 0.2], "emission": [3, 3, 3] }
        },
        "shapes": [
            { "type": "box", "center": [0, 0, 0], "width": 4, "height": 4, "depth": 4,
              "material": "wall", "inward": true },
            { "type": "quad",
              "vertices": [[-0.5, 1.99, -0.5], [0.5, 1.99, -0.5],
                           [0.5, 1.99, 0.5], [-0.5, 1.99, 0.5]],
              "material": "lamp" }
        ]
    }"#;

    fn engine() -> RadiosityEngine {
        let mut engine = RadiosityEngine::new();
        engine.set_scene(SceneLoader::from_json(SMALL_ROOM).unwrap());
        engine
    }

    #[test]
    fn full_pipeline_lights_and_renders() {
        let mut engine = engine();
        let report = engine.calculate_illumination(4, 1.0, 300).unwrap();
        assert_eq!(report.passes(), 4);
        assert_eq!(engine.patches().len(), 97);
        assert_eq!(engine.form_factors().unwrap().len(), 97);
        assert!(report.final_total() > report.initial_total());

        let image = engine.render_scene().unwrap();
        assert_eq!((image.width(), image.height()), (12, 10));
        // The camera sits inside a closed room: no pixel shows the background.
        assert!(image.pixels().iter().all(|c| *c != Rgb::new(1.0, 0.0, 1.0)));
        assert!(image.pixels().iter().any(|c| c.x > 0.0));

        let path =
            std::env::temp_dir().join(format!("radiosity-engine-{}.png", std::process::id()));
        engine.save_rendered_image_to_file(&path).unwrap();
        assert!(path.exists());
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn resolution_override_wins() {
        let mut engine = engine();
        assert_eq!(engine.image_resolution(), Some((12, 10)));
        engine.set_image_resolution(6, 4).unwrap();
        engine.set_shading(Shading::Flat);
        engine.calculate_illumination(1, 2.0, 50).unwrap();
        let image = engine.render_scene().unwrap();
        assert_eq!((image.width(), image.height()), (6, 4));
    }

    #[test]
    fn lit_patches_carry_at_least_their_emission() {
        let mut engine = engine();
        engine.calculate_illumination(3, 2.0, 200).unwrap();
        for patch in engine.patches() {
            for c in 0..3 {
                assert!(patch.radiosity()[c] >= patch.emission()[c]);
            }
        }
    }

    #[test]
    fn missing_scene_is_reported() {
        let mut engine = RadiosityEngine::new();
        assert!(matches!(
            engine.calculate_illumination(1, 1.0, 10),
            Err(RadiosityError::Scene(SceneError::NotLoaded))
        ));
        assert!(matches!(
            engine.render_scene(),
            Err(RadiosityError::Scene(SceneError::NotLoaded))
        ));
    }

    #[test]
    fn bad_parameters_are_rejected_before_work() {
        let mut engine = engine();
        assert!(matches!(
            engine.calculate_illumination(1, 0.0, 10),
            Err(RadiosityError::Config(ConfigError::NonPositivePatchSize(_)))
        ));
        assert!(engine.patches().is_empty());
        assert!(engine.set_image_resolution(0, 5).is_err());
    }

    #[test]
    fn phases_must_run_in_order() {
        let mut engine = engine();
        assert!(matches!(
            engine.render_scene(),
            Err(RadiosityError::Render(RenderError::NotIlluminated))
        ));
        assert!(matches!(
            engine.save_rendered_image_to_file("unused.png"),
            Err(RadiosityError::Render(RenderError::NotRendered))
        ));
    }

    #[test]
    fn new_scene_discards_results() {
        let mut engine = engine();
        engine.calculate_illumination(1, 2.0, 50).unwrap();
        engine.render_scene().unwrap();
        engine.set_scene(SceneLoader::from_json(SMALL_ROOM).unwrap());
        assert!(engine.patches().is_empty());
        assert!(engine.form_factors().is_none());
        assert!(engine.rendered_image().is_none());
    }

    #[test]
    fn same_seed_gives_same_image() {
        let render = || {
            let mut engine = engine();
            engine.calculate_illumination(2, 2.0, 100).unwrap();
            engine.render_scene().unwrap().clone()
        };
        assert_eq!(render(), render());
    }
}
