use crate::math::intersect_3d::Ray;
use crate::math::{Point3, Vector3};
use crate::patch::QuadPatch;

use super::{closer, Hit};

/// Leaves hold at most this many patches.
const MAX_LEAF_SIZE: usize = 4;

/// Absolute padding added to every box so flat patches keep a non-zero
/// thickness along their normal axis.
const BOX_PADDING: f64 = 1e-9;

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Point3,
    pub max: Point3,
}

impl Aabb {
    /// An inverted box that any `grow` call replaces.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            min: Point3::from(Vector3::repeat(f64::INFINITY)),
            max: Point3::from(Vector3::repeat(f64::NEG_INFINITY)),
        }
    }

    /// Bounds of a patch, padded by [`BOX_PADDING`].
    #[must_use]
    pub fn of_patch(patch: &QuadPatch) -> Self {
        let mut b = Self::empty();
        for v in patch.vertices() {
            b.grow_point(v);
        }
        let pad = Vector3::repeat(BOX_PADDING);
        b.min -= pad;
        b.max += pad;
        b
    }

    /// Grow to include a point.
    #[inline]
    pub fn grow_point(&mut self, p: &Point3) {
        self.min = Point3::from(self.min.coords.inf(&p.coords));
        self.max = Point3::from(self.max.coords.sup(&p.coords));
    }

    /// Grow to include another AABB.
    #[inline]
    pub fn grow(&mut self, other: &Aabb) {
        self.min = Point3::from(self.min.coords.inf(&other.min.coords));
        self.max = Point3::from(self.max.coords.sup(&other.max.coords));
    }

    /// Longest axis (0=x, 1=y, 2=z).
    #[inline]
    #[must_use]
    pub fn longest_axis(&self) -> usize {
        let d = self.max - self.min;
        if d.x >= d.y && d.x >= d.z {
            0
        } else if d.y >= d.z {
            1
        } else {
            2
        }
    }

    /// Centroid of the AABB.
    #[inline]
    #[must_use]
    pub fn centroid(&self) -> Point3 {
        nalgebra::center(&self.min, &self.max)
    }

    /// Slab test. Returns the entry parameter if the ray overlaps the box
    /// inside `[t_min, t_max]`.
    ///
    /// `inv_dir` is the component-wise inverse of the ray direction. NaNs
    /// from `0 * inf` are ignored by `f64::max`/`f64::min`, which treats the
    /// slab as passed; this may visit extra nodes but never drops a hit.
    #[inline]
    #[must_use]
    pub fn entry(&self, ray: &Ray, inv_dir: &Vector3, t_min: f64, t_max: f64) -> Option<f64> {
        let mut t0 = t_min;
        let mut t1 = t_max;
        for axis in 0..3 {
            let mut near = (self.min[axis] - ray.origin[axis]) * inv_dir[axis];
            let mut far = (self.max[axis] - ray.origin[axis]) * inv_dir[axis];
            if near > far {
                std::mem::swap(&mut near, &mut far);
            }
            t0 = near.max(t0);
            t1 = far.min(t1);
            if t0 > t1 {
                return None;
            }
        }
        Some(t0)
    }
}

#[derive(Debug, Clone)]
enum BvhNode {
    Leaf {
        bounds: Aabb,
        first: usize,
        count: usize,
    },
    Inner {
        bounds: Aabb,
        left: usize,
        right: usize,
    },
}

impl BvhNode {
    fn bounds(&self) -> &Aabb {
        match self {
            Self::Leaf { bounds, .. } | Self::Inner { bounds, .. } => bounds,
        }
    }
}

/// Bounding volume hierarchy over the patches of a scene.
///
/// Built once per patch list by median split along the longest axis of the
/// centroid bounds. Nearest-hit queries return exactly what a linear scan
/// over all patches returns, ties included.
#[derive(Debug, Clone)]
pub struct PatchBvh {
    nodes: Vec<BvhNode>,
    order: Vec<usize>,
}

impl PatchBvh {
    /// Builds the hierarchy for `patches`.
    #[must_use]
    pub fn build(patches: &[QuadPatch]) -> Self {
        let boxes: Vec<Aabb> = patches.iter().map(Aabb::of_patch).collect();
        let mut bvh = Self {
            nodes: Vec::with_capacity(2 * patches.len() / MAX_LEAF_SIZE + 1),
            order: (0..patches.len()).collect(),
        };
        if !patches.is_empty() {
            bvh.build_node(&boxes, 0, patches.len());
        }
        bvh
    }

    /// Number of nodes in the hierarchy.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn build_node(&mut self, boxes: &[Aabb], first: usize, end: usize) -> usize {
        let mut bounds = Aabb::empty();
        let mut centroids = Aabb::empty();
        for &i in &self.order[first..end] {
            bounds.grow(&boxes[i]);
            centroids.grow_point(&boxes[i].centroid());
        }

        let count = end - first;
        let node = self.nodes.len();
        if count <= MAX_LEAF_SIZE {
            self.nodes.push(BvhNode::Leaf {
                bounds,
                first,
                count,
            });
            return node;
        }

        let axis = centroids.longest_axis();
        let mid = first + count / 2;
        self.order[first..end].select_nth_unstable_by(count / 2, |&a, &b| {
            boxes[a].centroid()[axis].total_cmp(&boxes[b].centroid()[axis])
        });

        // Placeholder, patched once both children exist.
        self.nodes.push(BvhNode::Leaf {
            bounds,
            first,
            count: 0,
        });
        let left = self.build_node(boxes, first, mid);
        let right = self.build_node(boxes, mid, end);
        self.nodes[node] = BvhNode::Inner {
            bounds,
            left,
            right,
        };
        node
    }

    /// Nearest patch hit by `ray` with `t > 0`, ignoring `skip`.
    #[must_use]
    pub fn nearest_hit(
        &self,
        patches: &[QuadPatch],
        ray: &Ray,
        skip: Option<usize>,
    ) -> Option<Hit> {
        if self.nodes.is_empty() {
            return None;
        }

        let inv_dir = ray.direction.map(|d| 1.0 / d);
        let mut best: Option<Hit> = None;
        let mut stack = vec![0usize];

        while let Some(node) = stack.pop() {
            let limit = best.map_or(f64::INFINITY, |hit| hit.t);
            // Inclusive limit so equal-distance patches are still compared by index.
            if self.nodes[node].bounds().entry(ray, &inv_dir, 0.0, limit).is_none() {
                continue;
            }
            match &self.nodes[node] {
                BvhNode::Leaf { first, count, .. } => {
                    for &index in &self.order[*first..*first + *count] {
                        if Some(index) == skip {
                            continue;
                        }
                        if let Some(t) = patches[index].intersect(ray, f64::INFINITY) {
                            let hit = Hit { index, t };
                            if closer(&hit, best.as_ref()) {
                                best = Some(hit);
                            }
                        }
                    }
                }
                BvhNode::Inner { left, right, .. } => {
                    stack.push(*right);
                    stack.push(*left);
                }
            }
        }

        best
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::TOLERANCE;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    #[test]
    fn slab_test_hits_and_misses() {
        let b = Aabb {
            min: p(0.0, 0.0, 0.0),
            max: p(1.0, 1.0, 1.0),
        };
        let ray = Ray::new(p(-1.0, 0.5, 0.5), Vector3::x());
        let inv = ray.direction.map(|d| 1.0 / d);
        let t = b.entry(&ray, &inv, 0.0, f64::INFINITY).unwrap();
        assert!((t - 1.0).abs() < TOLERANCE);

        let away = Ray::new(p(-1.0, 0.5, 0.5), -Vector3::x());
        let inv = away.direction.map(|d| 1.0 / d);
        assert!(b.entry(&away, &inv, 0.0, f64::INFINITY).is_none());

        let beside = Ray::new(p(-1.0, 2.0, 0.5), Vector3::x());
        let inv = beside.direction.map(|d| 1.0 / d);
        assert!(b.entry(&beside, &inv, 0.0, f64::INFINITY).is_none());
    }

    #[test]
    fn origin_inside_box_enters_at_t_min() {
        let b = Aabb {
            min: p(0.0, 0.0, 0.0),
            max: p(1.0, 1.0, 1.0),
        };
        let ray = Ray::new(p(0.5, 0.5, 0.5), Vector3::new(1.0, 1.0, 0.0));
        let inv = ray.direction.map(|d| 1.0 / d);
        assert_eq!(b.entry(&ray, &inv, 0.0, f64::INFINITY), Some(0.0));
    }

    #[test]
    fn longest_axis_and_centroid() {
        let b = Aabb {
            min: p(0.0, 0.0, 0.0),
            max: p(1.0, 4.0, 2.0),
        };
        assert_eq!(b.longest_axis(), 1);
        assert!((b.centroid() - p(0.5, 2.0, 1.0)).norm() < TOLERANCE);
    }

    #[test]
    fn build_splits_until_leaves_are_small() {
        use crate::geometry::{Cuboid, Shape};
        use crate::material::{Material, MaterialStore};
        use crate::math::Rgb;

        let mut store = MaterialStore::new();
        let id = store.add(Material::diffuse(Rgb::new(0.5, 0.5, 0.5)).unwrap());
        let patches = Cuboid::new(Point3::origin(), 2.0, 2.0, 2.0, id)
            .unwrap()
            .split_into_patches(1.0, &store)
            .unwrap();

        let bvh = PatchBvh::build(patches.as_slice());
        // 24 patches, at most 4 per leaf: at least 6 leaves and 5 inner nodes.
        assert!(bvh.node_count() >= 11);
        assert!(bvh.node_count() < 2 * patches.len());
        let mut seen = bvh.order.clone();
        seen.sort_unstable();
        assert_eq!(seen, (0..patches.len()).collect::<Vec<_>>());

        assert_eq!(PatchBvh::build(&[]).node_count(), 0);
    }
}
