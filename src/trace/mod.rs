//! Nearest-hit ray queries against a patch list.
//!
//! Shared by the form factor estimator (visibility between patches) and the
//! renderer (primary rays from the camera).

mod bvh;

pub use bvh::{Aabb, PatchBvh};

use std::cmp::Ordering;

use tracing::debug;

use crate::math::intersect_3d::Ray;
use crate::patch::QuadPatch;

/// A ray/patch intersection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    /// Index of the patch in the traced list.
    pub index: usize,
    /// Ray parameter of the hit.
    pub t: f64,
}

/// How nearest-hit queries are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    /// Test every ray against every patch.
    BruteForce,
    /// Walk a bounding volume hierarchy built once per patch list.
    #[default]
    Bvh,
}

/// Nearest-hit query engine over a borrowed patch list.
///
/// Both strategies return the same hit for the same ray: the smallest `t`,
/// with ties broken by the lower patch index.
#[derive(Debug)]
pub struct Tracer<'a> {
    patches: &'a [QuadPatch],
    bvh: Option<PatchBvh>,
}

impl<'a> Tracer<'a> {
    /// Prepares queries over `patches`, building a BVH if requested.
    #[must_use]
    pub fn new(patches: &'a [QuadPatch], visibility: Visibility) -> Self {
        let bvh = match visibility {
            Visibility::BruteForce => None,
            Visibility::Bvh => {
                let bvh = PatchBvh::build(patches);
                debug!(patches = patches.len(), nodes = bvh.node_count(), "built patch BVH");
                Some(bvh)
            }
        };
        Self { patches, bvh }
    }

    /// The patches being traced.
    #[must_use]
    pub fn patches(&self) -> &'a [QuadPatch] {
        self.patches
    }

    /// Nearest patch hit by `ray` with `t > 0`, ignoring the patch at `skip`.
    #[must_use]
    pub fn nearest_hit(&self, ray: &Ray, skip: Option<usize>) -> Option<Hit> {
        match &self.bvh {
            Some(bvh) => bvh.nearest_hit(self.patches, ray, skip),
            None => self.linear_scan(ray, skip),
        }
    }

    fn linear_scan(&self, ray: &Ray, skip: Option<usize>) -> Option<Hit> {
        let mut best: Option<Hit> = None;
        for (index, patch) in self.patches.iter().enumerate() {
            if Some(index) == skip {
                continue;
            }
            if let Some(t) = patch.intersect(ray, f64::INFINITY) {
                let hit = Hit { index, t };
                if closer(&hit, best.as_ref()) {
                    best = Some(hit);
                }
            }
        }
        best
    }
}

/// Returns `true` if `hit` should replace `best`.
fn closer(hit: &Hit, best: Option<&Hit>) -> bool {
    match best {
        None => true,
        Some(best) => {
            (hit.t, hit.index).partial_cmp(&(best.t, best.index)) == Some(Ordering::Less)
        }
    }
}
