pub mod analytic;
mod table;

pub use table::FormFactorTable;

use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::error::{ConfigError, Result};
use crate::math::intersect_3d::Ray;
use crate::math::sampling::{cosine_weighted_direction, sample_point_in_quad};
use crate::math::{RAY_EPSILON, TOLERANCE};
use crate::patch::PatchCollection;
use crate::trace::{Tracer, Visibility};

/// Seed used when the caller does not pick one.
pub const DEFAULT_SEED: u64 = 0x5EED_CAFE;

/// Estimates the form factor table of a patch collection by Monte Carlo ray
/// casting.
///
/// For every source patch, `rays_per_patch` rays start at area-uniform points
/// on the patch and leave in cosine-weighted directions. A ray contributes to
/// `F_ij` when the nearest patch it meets is `j` and it arrives on `j`'s front
/// side; a hit on the back of a patch is absorbed and a ray that leaves the
/// scene contributes nothing. Cosine weighting at the source and the solid
/// angle of the receiver account for both cosine terms and the inverse-square
/// falloff, so `F_ij = hits_ij / rays_per_patch`.
///
/// Source patches are processed in parallel. Each owns a random stream seeded
/// from `(seed, index)`, so the table depends only on the seed, never on
/// thread scheduling.
#[derive(Debug, Clone)]
pub struct EstimateFormFactors {
    rays_per_patch: usize,
    seed: u64,
    visibility: Visibility,
    enforce_reciprocity: bool,
}

impl EstimateFormFactors {
    /// Creates a new estimator casting `rays_per_patch` rays from every patch.
    #[must_use]
    pub fn new(rays_per_patch: usize) -> Self {
        Self {
            rays_per_patch,
            seed: DEFAULT_SEED,
            visibility: Visibility::default(),
            enforce_reciprocity: false,
        }
    }

    /// Sets the seed of the random streams.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the nearest-hit strategy.
    #[must_use]
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Averages `A_i F_ij` and `A_j F_ji` after estimation.
    #[must_use]
    pub fn with_reciprocity(mut self, enforce: bool) -> Self {
        self.enforce_reciprocity = enforce;
        self
    }

    /// Executes the estimation.
    ///
    /// # Errors
    ///
    /// Returns an error if `rays_per_patch` is zero, or
    /// [`ConfigError::TableTooLarge`] if the table for `patches` would hold
    /// more than [`MAX_PATCHES`](crate::geometry::MAX_PATCHES) rows.
    pub fn execute(&self, patches: &PatchCollection) -> Result<FormFactorTable> {
        if self.rays_per_patch == 0 {
            return Err(ConfigError::ZeroRaysPerPatch.into());
        }
        table::cell_count(patches.len())?;

        info!(
            patches = patches.len(),
            rays_per_patch = self.rays_per_patch,
            visibility = ?self.visibility,
            "estimating form factors"
        );

        let tracer = Tracer::new(patches.as_slice(), self.visibility);
        let rows: Vec<Vec<f64>> = (0..patches.len())
            .into_par_iter()
            .map(|i| self.estimate_row(&tracer, i))
            .collect();

        let mut table = FormFactorTable::from_rows(rows)?;
        if self.enforce_reciprocity {
            debug!("enforcing reciprocity");
            table.enforce_reciprocity(&patches.areas());
        }
        Ok(table)
    }

    /// Estimates row `i` of the table.
    #[allow(clippy::cast_precision_loss)]
    fn estimate_row(&self, tracer: &Tracer<'_>, i: usize) -> Vec<f64> {
        let patches = tracer.patches();
        let n = patches.len();
        let source = &patches[i];

        if source.area() < TOLERANCE {
            warn!(patch = i, "skipping degenerate source patch");
            return vec![0.0; n];
        }

        let mut rng = StdRng::seed_from_u64(stream_seed(self.seed, i));
        let normal = *source.normal();
        let mut hits = vec![0u64; n];

        for _ in 0..self.rays_per_patch {
            let origin = sample_point_in_quad(source.vertices(), &mut rng) + normal * RAY_EPSILON;
            let direction = cosine_weighted_direction(&normal, &mut rng);
            let ray = Ray::new(origin, direction);

            if let Some(hit) = tracer.nearest_hit(&ray, Some(i)) {
                if direction.dot(patches[hit.index].normal()) < 0.0 {
                    hits[hit.index] += 1;
                }
            }
        }

        let scale = 1.0 / self.rays_per_patch as f64;
        hits.into_iter().map(|h| h as f64 * scale).collect()
    }
}

/// Derives an independent stream seed for source patch `index` (`SplitMix64`
/// finalizer over the mixed inputs).
fn stream_seed(seed: u64, index: usize) -> u64 {
    let mut z = seed ^ (index as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
