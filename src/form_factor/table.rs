use crate::error::{ConfigError, Result};
use crate::geometry::MAX_PATCHES;

/// Dense row-major table of form factors `F_ij` for `n` patches.
///
/// Row `i` holds the fractions of energy leaving patch `i` that reach every
/// other patch. Self pairs and unreached pairs are zero.
#[derive(Debug, Clone, PartialEq)]
pub struct FormFactorTable {
    n: usize,
    values: Vec<f64>,
}

impl FormFactorTable {
    /// Creates an all-zero table for `n` patches.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::TableTooLarge`] if `n` exceeds [`MAX_PATCHES`].
    pub fn zeros(n: usize) -> Result<Self> {
        Ok(Self {
            n,
            values: vec![0.0; cell_count(n)?],
        })
    }

    /// Assembles a table from per-patch rows.
    ///
    /// Rows must all have `rows.len()` entries; `from_rows` is only used by
    /// the estimator, which guarantees this.
    pub(crate) fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let n = rows.len();
        let mut values = Vec::with_capacity(cell_count(n)?);
        for row in rows {
            debug_assert_eq!(row.len(), n);
            values.extend(row);
        }
        Ok(Self { n, values })
    }

    /// Number of patches covered by the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.n
    }

    /// Returns `true` if the table covers no patch.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// `F_ij`, or zero if either index is out of range.
    #[must_use]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        if i < self.n && j < self.n {
            self.values[i * self.n + j]
        } else {
            0.0
        }
    }

    /// Sets `F_ij`. Out-of-range indices are ignored.
    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        if i < self.n && j < self.n {
            self.values[i * self.n + j] = value;
        }
    }

    /// All form factors leaving patch `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i` is out of range.
    #[must_use]
    pub fn row(&self, i: usize) -> &[f64] {
        &self.values[i * self.n..(i + 1) * self.n]
    }

    /// Fraction of energy leaving patch `i` that reaches any patch.
    ///
    /// At most one up to sampling error; exactly one for a closed enclosure.
    #[must_use]
    pub fn row_sum(&self, i: usize) -> f64 {
        if i < self.n {
            self.row(i).iter().sum()
        } else {
            0.0
        }
    }

    /// Relative reciprocity error `|A_i F_ij - A_j F_ji| / max(A_i F_ij, A_j F_ji)`.
    ///
    /// Zero when both products vanish.
    #[must_use]
    pub fn reciprocity_error(&self, i: usize, j: usize, areas: &[f64]) -> f64 {
        let forward = areas[i] * self.get(i, j);
        let backward = areas[j] * self.get(j, i);
        let scale = forward.max(backward);
        if scale > 0.0 {
            (forward - backward).abs() / scale
        } else {
            0.0
        }
    }

    /// Replaces `A_i F_ij` and `A_j F_ji` by their mean for every pair.
    pub fn enforce_reciprocity(&mut self, areas: &[f64]) {
        for i in 0..self.n {
            for j in (i + 1)..self.n {
                let ai = areas[i];
                let aj = areas[j];
                if ai <= 0.0 || aj <= 0.0 {
                    continue;
                }
                let mean = 0.5 * (ai * self.get(i, j) + aj * self.get(j, i));
                self.set(i, j, mean / ai);
                self.set(j, i, mean / aj);
            }
        }
    }
}

/// Number of cells of a table for `n` patches.
pub(super) fn cell_count(n: usize) -> Result<usize> {
    n.checked_mul(n)
        .filter(|_| n <= MAX_PATCHES)
        .ok_or_else(|| {
            ConfigError::TableTooLarge {
                patches: n,
                limit: MAX_PATCHES,
            }
            .into()
        })
}
