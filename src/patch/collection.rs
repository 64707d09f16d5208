use std::ops::{Index, IndexMut};

use crate::math::{channel_sum, Rgb};

use super::QuadPatch;

/// Ordered, append-only sequence of patches.
///
/// The position of a patch in the scene-wide collection is its index in the
/// form factor table, so concatenation always keeps creation order.
#[derive(Debug, Clone, Default)]
pub struct PatchCollection {
    patches: Vec<QuadPatch>,
}

impl PatchCollection {
    /// Creates an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty collection with room for `capacity` patches.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            patches: Vec::with_capacity(capacity),
        }
    }

    /// Appends one patch at the end.
    pub fn push(&mut self, patch: QuadPatch) {
        self.patches.push(patch);
    }

    /// Moves every patch of `other` to the end of `self`, in order.
    pub fn append(&mut self, mut other: PatchCollection) {
        self.patches.append(&mut other.patches);
    }

    /// Number of patches.
    #[must_use]
    pub fn len(&self) -> usize {
        self.patches.len()
    }

    /// Returns `true` if the collection holds no patch.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }

    /// Patch at `index`, if any.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&QuadPatch> {
        self.patches.get(index)
    }

    /// Iterates over patches in creation order.
    pub fn iter(&self) -> std::slice::Iter<'_, QuadPatch> {
        self.patches.iter()
    }

    /// Iterates mutably over patches in creation order.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, QuadPatch> {
        self.patches.iter_mut()
    }

    /// Borrows the patches as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[QuadPatch] {
        &self.patches
    }

    /// Areas of all patches, in order.
    #[must_use]
    pub fn areas(&self) -> Vec<f64> {
        self.patches.iter().map(QuadPatch::area).collect()
    }

    /// Sum of all patch areas.
    #[must_use]
    pub fn total_area(&self) -> f64 {
        self.patches.iter().map(QuadPatch::area).sum()
    }

    /// Total radiant exitance `Σ A_i (B_i.r + B_i.g + B_i.b)`.
    #[must_use]
    pub fn total_power(&self) -> f64 {
        self.patches
            .iter()
            .map(|p| p.area() * channel_sum(p.radiosity()))
            .sum()
    }

    /// Current radiosity of every patch, in order.
    #[must_use]
    pub fn radiosities(&self) -> Vec<Rgb> {
        self.patches.iter().map(|p| *p.radiosity()).collect()
    }

    /// Resets every patch's radiosity to its emission.
    pub fn reset_radiosity(&mut self) {
        self.patches.iter_mut().for_each(QuadPatch::reset_radiosity);
    }
}

impl Index<usize> for PatchCollection {
    type Output = QuadPatch;

    fn index(&self, index: usize) -> &Self::Output {
        &self.patches[index]
    }
}

impl IndexMut<usize> for PatchCollection {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.patches[index]
    }
}

impl FromIterator<QuadPatch> for PatchCollection {
    fn from_iter<I: IntoIterator<Item = QuadPatch>>(iter: I) -> Self {
        Self {
            patches: iter.into_iter().collect(),
        }
    }
}

impl Extend<QuadPatch> for PatchCollection {
    fn extend<I: IntoIterator<Item = QuadPatch>>(&mut self, iter: I) {
        self.patches.extend(iter);
    }
}

impl IntoIterator for PatchCollection {
    type Item = QuadPatch;
    type IntoIter = std::vec::IntoIter<QuadPatch>;

    fn into_iter(self) -> Self::IntoIter {
        self.patches.into_iter()
    }
}

impl<'a> IntoIterator for &'a PatchCollection {
    type Item = &'a QuadPatch;
    type IntoIter = std::slice::Iter<'a, QuadPatch>;

    fn into_iter(self) -> Self::IntoIter {
        self.patches.iter()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::material::{Material, MaterialStore};
    use crate::math::Point3;

    fn square_at(x: f64) -> QuadPatch {
        let mut store = MaterialStore::new();
        let id = store.add(Material::diffuse(Rgb::new(0.5, 0.5, 0.5)).unwrap());
        QuadPatch::new(
            [
                Point3::new(x, 0.0, 0.0),
                Point3::new(x + 1.0, 0.0, 0.0),
                Point3::new(x + 1.0, 1.0, 0.0),
                Point3::new(x, 1.0, 0.0),
            ],
            id,
            Rgb::new(1.0, 0.0, 0.0),
        )
        .unwrap()
    }

    #[test]
    fn append_preserves_order() {
        let mut first: PatchCollection = (0..3).map(|i| square_at(f64::from(i))).collect();
        let second: PatchCollection = (3..5).map(|i| square_at(f64::from(i))).collect();
        first.append(second);

        assert_eq!(first.len(), 5);
        for (i, patch) in first.iter().enumerate() {
            #[allow(clippy::cast_precision_loss)]
            let expected = i as f64;
            assert!((patch.vertices()[0].x - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn totals() {
        let patches: PatchCollection = (0..4).map(|i| square_at(f64::from(i))).collect();
        assert!((patches.total_area() - 4.0).abs() < 1e-12);
        assert!((patches.total_power() - 4.0).abs() < 1e-12);
        assert_eq!(patches.areas().len(), 4);
    }
}
