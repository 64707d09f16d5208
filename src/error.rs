use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for the radiosity engine.
#[derive(Debug, Error)]
pub enum RadiosityError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Scene(#[from] SceneError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Errors related to shapes, patches and materials.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("degenerate geometry: {0}")]
    Degenerate(String),

    #[error("quad vertices are not coplanar (deviation {deviation})")]
    NonPlanar { deviation: f64 },

    #[error("quad is not convex")]
    NonConvex,

    #[error("zero-length vector")]
    ZeroVector,

    #[error("invalid material: {0}")]
    InvalidMaterial(String),
}

/// Errors in caller-supplied run parameters.
///
/// These are always detected before any computation starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("patch size must be positive and finite, got {0}")]
    NonPositivePatchSize(f64),

    #[error("patch size {patch_size} is too small: more than {limit} patches")]
    TooManyPatches { patch_size: f64, limit: usize },

    #[error("form factor table for {patches} patches exceeds the limit of {limit}")]
    TableTooLarge { patches: usize, limit: usize },

    #[error("iteration count must be positive")]
    ZeroIterations,

    #[error("rays per patch must be positive")]
    ZeroRaysPerPatch,

    #[error("image resolution must be positive, got {width}x{height}")]
    InvalidResolution { width: u32, height: u32 },

    #[error("form factor table covers {table} patches but {patches} were given")]
    FormFactorMismatch { table: usize, patches: usize },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Errors raised while loading or accessing the scene.
#[derive(Debug, Error)]
pub enum SceneError {
    #[error("no scene has been loaded")]
    NotLoaded,

    #[error("failed to read scene file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse scene description: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("material not found: {0}")]
    MaterialNotFound(String),
}

/// Errors related to rendering and image output.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("scene has not been rendered yet")]
    NotRendered,

    #[error("illumination has not been calculated yet")]
    NotIlluminated,

    #[error("failed to write image {path}: {source}")]
    ImageWrite {
        path: PathBuf,
        source: image::ImageError,
    },
}

/// Convenience type alias for results using [`RadiosityError`].
pub type Result<T> = std::result::Result<T, RadiosityError>;
