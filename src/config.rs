use crate::error::{ConfigError, Result};
use crate::form_factor::DEFAULT_SEED;
use crate::geometry::check_patch_size;
use crate::solver::SolverScheme;
use crate::trace::Visibility;

/// Parameters of one illumination run.
#[derive(Debug, Clone, PartialEq)]
pub struct IlluminationParams {
    /// Number of solver passes.
    pub iterations: usize,
    /// Target edge length of a patch.
    pub patch_size: f64,
    /// Rays cast from every patch while estimating form factors.
    pub rays_per_patch: usize,
    /// Seed of the form factor estimator.
    pub seed: u64,
    /// Iteration scheme of the solver.
    pub scheme: SolverScheme,
    /// Occlusion query used while casting rays.
    pub visibility: Visibility,
    /// Average `A_i F_ij` and `A_j F_ji` after estimation.
    pub enforce_reciprocity: bool,
}

impl Default for IlluminationParams {
    fn default() -> Self {
        Self {
            iterations: 10,
            patch_size: 1.5,
            rays_per_patch: 5000,
            seed: DEFAULT_SEED,
            scheme: SolverScheme::default(),
            visibility: Visibility::default(),
            enforce_reciprocity: false,
        }
    }
}

impl IlluminationParams {
    /// Parameters with the given budget and defaults for everything else.
    #[must_use]
    pub fn new(iterations: usize, patch_size: f64, rays_per_patch: usize) -> Self {
        Self {
            iterations,
            patch_size,
            rays_per_patch,
            ..Self::default()
        }
    }

    /// Checks every parameter before any work starts.
    ///
    /// # Errors
    ///
    /// Returns the [`ConfigError`] of the first invalid parameter.
    pub fn validate(&self) -> Result<()> {
        if self.iterations == 0 {
            return Err(ConfigError::ZeroIterations.into());
        }
        check_patch_size(self.patch_size)?;
        if self.rays_per_patch == 0 {
            return Err(ConfigError::ZeroRaysPerPatch.into());
        }
        Ok(())
    }
}
