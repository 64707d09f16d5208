use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::error::{ConfigError, Result};
use crate::form_factor::FormFactorTable;
use crate::material::MaterialStore;
use crate::math::{is_finite_rgb, Rgb};
use crate::patch::{PatchCollection, QuadPatch};

/// Update order used by [`SolveRadiosity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SolverScheme {
    /// Every patch reads the previous pass's values; patches update in
    /// parallel.
    #[default]
    Jacobi,
    /// Patches update in index order and later patches see earlier updates
    /// of the same pass.
    GaussSeidel,
}

/// Total radiant exitance recorded while solving.
#[derive(Debug, Clone, PartialEq)]
pub struct SolveReport {
    totals: Vec<f64>,
}

impl SolveReport {
    /// `Σ A_i (B_i.r + B_i.g + B_i.b)` after initialisation (index 0) and after
    /// every pass.
    #[must_use]
    pub fn totals(&self) -> &[f64] {
        &self.totals
    }

    /// Number of passes performed.
    #[must_use]
    pub fn passes(&self) -> usize {
        self.totals.len().saturating_sub(1)
    }

    /// Total exitance of the emitters alone.
    #[must_use]
    pub fn initial_total(&self) -> f64 {
        self.totals.first().copied().unwrap_or(0.0)
    }

    /// Total exitance after the last pass.
    #[must_use]
    pub fn final_total(&self) -> f64 {
        self.totals.last().copied().unwrap_or(0.0)
    }
}

/// Iteratively solves `B_i = E_i + ρ_i ⊙ Σ_j F_ij B_j` for a fixed number of
/// passes.
#[derive(Debug, Clone)]
pub struct SolveRadiosity {
    iterations: usize,
    scheme: SolverScheme,
}

impl SolveRadiosity {
    /// Creates a new solver running exactly `iterations` passes.
    #[must_use]
    pub fn new(iterations: usize) -> Self {
        Self {
            iterations,
            scheme: SolverScheme::default(),
        }
    }

    /// Sets the update order.
    #[must_use]
    pub fn with_scheme(mut self, scheme: SolverScheme) -> Self {
        self.scheme = scheme;
        self
    }

    /// Executes the solve, overwriting the radiosity of every patch.
    ///
    /// Radiosity starts at emission. An update that turns out non-finite is
    /// discarded and the patch keeps its previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if `iterations` is zero, the table does not match the
    /// patch count, or a patch refers to a material missing from `materials`.
    pub fn execute(
        &self,
        patches: &mut PatchCollection,
        table: &FormFactorTable,
        materials: &MaterialStore,
    ) -> Result<SolveReport> {
        if self.iterations == 0 {
            return Err(ConfigError::ZeroIterations.into());
        }
        if table.len() != patches.len() {
            return Err(ConfigError::FormFactorMismatch {
                table: table.len(),
                patches: patches.len(),
            }
            .into());
        }

        let reflectances = patches
            .iter()
            .map(|patch| materials.get(patch.material()).map(|m| *m.reflectance()))
            .collect::<Result<Vec<Rgb>>>()?;

        info!(
            patches = patches.len(),
            iterations = self.iterations,
            scheme = ?self.scheme,
            "solving radiosity"
        );

        patches.reset_radiosity();
        let mut totals = Vec::with_capacity(self.iterations + 1);
        totals.push(patches.total_power());

        for pass in 0..self.iterations {
            match self.scheme {
                SolverScheme::Jacobi => jacobi_pass(patches, table, &reflectances),
                SolverScheme::GaussSeidel => gauss_seidel_pass(patches, table, &reflectances),
            }
            let total = patches.total_power();
            debug!(pass, total, "radiosity pass complete");
            totals.push(total);
        }

        Ok(SolveReport { totals })
    }
}

/// Gathered radiosity `E_i + ρ_i ⊙ Σ_j F_ij B_j` for patch `i`.
fn gather(
    i: usize,
    emission: &Rgb,
    reflectance: &Rgb,
    table: &FormFactorTable,
    current: &[Rgb],
) -> Rgb {
    let incoming = table
        .row(i)
        .iter()
        .zip(current)
        .enumerate()
        .filter(|&(j, (f, _))| j != i && *f > 0.0)
        .fold(Rgb::zeros(), |acc, (_, (f, b))| acc + b * *f);
    emission + reflectance.component_mul(&incoming)
}

fn accept(i: usize, patch: &QuadPatch, candidate: Rgb) -> Rgb {
    if is_finite_rgb(&candidate) {
        candidate
    } else {
        warn!(patch = i, "non-finite radiosity update discarded");
        *patch.radiosity()
    }
}

fn jacobi_pass(patches: &mut PatchCollection, table: &FormFactorTable, reflectances: &[Rgb]) {
    let previous = patches.radiosities();
    let updated: Vec<Rgb> = patches
        .as_slice()
        .par_iter()
        .enumerate()
        .map(|(i, patch)| {
            let candidate = gather(i, patch.emission(), &reflectances[i], table, &previous);
            accept(i, patch, candidate)
        })
        .collect();

    for (patch, radiosity) in patches.iter_mut().zip(updated) {
        patch.set_radiosity(radiosity);
    }
}

fn gauss_seidel_pass(
    patches: &mut PatchCollection,
    table: &FormFactorTable,
    reflectances: &[Rgb],
) {
    let mut current = patches.radiosities();
    for i in 0..current.len() {
        let patch = &patches[i];
        let candidate = gather(i, patch.emission(), &reflectances[i], table, &current);
        current[i] = accept(i, patch, candidate);
    }

    for (patch, radiosity) in patches.iter_mut().zip(current) {
        patch.set_radiosity(radiosity);
    }
}
