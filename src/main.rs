//! Command-line front end: load a scene, light it, render it, save the image.
//!
//! ```text
//! radiosity --scene scene.json --output image.png \
//!     --resolution-x 512 --resolution-y 512 \
//!     --num-iterations 10 --patch-size 1.5 --num-rays-per-patch 5000
//! ```
//!
//! Progress is logged through `tracing`; set `RUST_LOG` to change the level.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing::info;

use radiosity::config::IlluminationParams;
use radiosity::engine::RadiosityEngine;
use radiosity::form_factor::DEFAULT_SEED;
use radiosity::render::Shading;
use radiosity::scene::SceneLoader;
use radiosity::solver::SolverScheme;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Scheme {
    Jacobi,
    GaussSeidel,
}

impl From<Scheme> for SolverScheme {
    fn from(scheme: Scheme) -> Self {
        match scheme {
            Scheme::Jacobi => SolverScheme::Jacobi,
            Scheme::GaussSeidel => SolverScheme::GaussSeidel,
        }
    }
}

/// Radiosity global illumination renderer.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Scene description (JSON).
    #[arg(long)]
    scene: PathBuf,

    /// Output image; the format follows the extension.
    #[arg(long)]
    output: PathBuf,

    /// Image width in pixels (defaults to the scene's).
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    resolution_x: Option<u32>,

    /// Image height in pixels (defaults to the scene's).
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    resolution_y: Option<u32>,

    /// Number of solver passes.
    #[arg(long, default_value_t = 10)]
    num_iterations: usize,

    /// Target patch edge length.
    #[arg(long, default_value_t = 1.5)]
    patch_size: f64,

    /// Rays cast from each patch to estimate form factors.
    #[arg(long, default_value_t = 5000)]
    num_rays_per_patch: usize,

    /// Seed of the form factor estimator.
    #[arg(long, default_value_t = DEFAULT_SEED)]
    seed: u64,

    #[arg(long, value_enum, default_value_t = Scheme::Jacobi)]
    scheme: Scheme,

    /// Disable smooth shading.
    #[arg(long)]
    flat: bool,
}

fn main() -> anyhow::Result<()> {
    // Default: WARN for dependencies, INFO for the engine.
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing_subscriber::filter::LevelFilter::WARN.into())
        .add_directive("radiosity=info".parse().unwrap_or_default());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let args = Args::parse();

    let params = IlluminationParams {
        iterations: args.num_iterations,
        patch_size: args.patch_size,
        rays_per_patch: args.num_rays_per_patch,
        seed: args.seed,
        scheme: args.scheme.into(),
        ..IlluminationParams::default()
    };
    params.validate().context("invalid illumination parameters")?;

    info!("Loading scene...");
    let scene = SceneLoader::load(&args.scene)
        .with_context(|| format!("failed to load scene {}", args.scene.display()))?;
    info!("Loading scene is finished");

    let (scene_width, scene_height) = scene.resolution();
    let mut engine = RadiosityEngine::new();
    engine.set_scene(scene);
    engine.set_image_resolution(
        args.resolution_x.unwrap_or(scene_width),
        args.resolution_y.unwrap_or(scene_height),
    )?;
    if args.flat {
        engine.set_shading(Shading::Flat);
    }

    info!("Calculating illumination...");
    engine.calculate_illumination_with(&params)?;
    info!("Calculating illumination is finished");

    info!("Rendering scene...");
    engine.render_scene()?;
    info!("Rendering scene is finished");

    info!("Saving image to file '{}'...", args.output.display());
    engine.save_rendered_image_to_file(&args.output)?;
    info!("Image is saved");

    Ok(())
}
