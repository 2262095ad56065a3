//! Overlap and ray queries over the dynamic AABB tree.

use super::node::NULL_NODE;
use super::tree::Bvh;
use crate::math::{Box3, Ray, Vector3};
use serde::{Deserialize, Serialize};

/// Flag mask controlling ray traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RayFlags(u32);

impl RayFlags {
    /// No flags set.
    pub const NONE: Self = Self(0);

    /// Skip leaves whose padded AABB contains the ray origin.
    pub const IGNORE_IF_INSIDE: Self = Self(1);

    /// Check if all bits of `other` are set.
    #[inline]
    pub fn contains(&self, other: RayFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for RayFlags {
    type Output = Self;
    #[inline]
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// What a ray hit resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HitKind {
    /// The broad-phase padded AABB of a leaf. Callbacks may refine the
    /// hit in place without changing the kind the caller sees.
    #[default]
    Aabb,
}

/// A single raycast hit. Unordered in the result list; callers may sort
/// by `distance`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RayHit {
    /// What was hit.
    pub kind: HitKind,
    /// Leaf node id.
    pub node: u32,
    /// Leaf user payload.
    pub user: u64,
    /// Distance from the ray origin to the entry point.
    pub distance: f32,
    /// Entry point on the padded AABB.
    pub position: Vector3,
}

impl Bvh {
    /// Collect the ids of all leaves whose padded AABB intersects `aabb`.
    pub fn query(&self, aabb: &Box3) -> Vec<u32> {
        let mut out = Vec::new();
        self.query_overlaps(aabb, |_, id| {
            out.push(id);
            1
        });
        out
    }

    /// Depth-first overlap query.
    ///
    /// The callback receives each overlapping leaf's user payload and
    /// node id; its return value is added to the running hit count.
    pub fn query_overlaps<F>(&self, aabb: &Box3, mut callback: F) -> u32
    where
        F: FnMut(u64, u32) -> u32,
    {
        let mut hit_count = 0;
        if self.root == NULL_NODE {
            return hit_count;
        }

        let mut stack = Vec::with_capacity(64);
        stack.push(self.root);

        while let Some(id) = stack.pop() {
            let node = &self.nodes[id as usize];
            if !node.aabb.intersects_box(aabb) {
                continue;
            }
            if node.is_leaf() {
                hit_count += callback(node.user, id);
            } else {
                stack.push(node.left);
                stack.push(node.right);
            }
        }

        hit_count
    }

    /// Raycast accepting every AABB hit with default fields.
    pub fn raycast(&self, ray: &Ray, max_distance: f32, flags: RayFlags) -> Vec<RayHit> {
        self.raycast_with(ray, max_distance, flags, |_, _, _, _, _| true)
    }

    /// Raycast with a filtering callback.
    ///
    /// At each leaf whose padded AABB the ray enters within
    /// `max_distance`, a default hit is built and passed to the filter
    /// along with the leaf payload, node id, and the slab interval
    /// `[tmin, tmax]`. The filter may overwrite the hit in place; it
    /// returns whether to commit the hit. Leaves entered behind the
    /// origin (`tmin < 0`) are skipped, as are leaves containing the
    /// origin when [`RayFlags::IGNORE_IF_INSIDE`] is set.
    pub fn raycast_with<F>(
        &self,
        ray: &Ray,
        max_distance: f32,
        flags: RayFlags,
        mut filter: F,
    ) -> Vec<RayHit>
    where
        F: FnMut(u64, u32, f32, f32, &mut RayHit) -> bool,
    {
        let mut hits = Vec::new();
        if self.root == NULL_NODE {
            return hits;
        }

        let mut stack = Vec::with_capacity(64);
        stack.push(self.root);

        while let Some(id) = stack.pop() {
            let node = &self.nodes[id as usize];
            let Some((tmin, tmax)) = ray.intersect_box_bounded(&node.aabb, max_distance) else {
                continue;
            };

            if !node.is_leaf() {
                stack.push(node.left);
                stack.push(node.right);
                continue;
            }

            if flags.contains(RayFlags::IGNORE_IF_INSIDE)
                && node.aabb.contains_point(&ray.origin)
            {
                continue;
            }
            if tmin < 0.0 {
                continue;
            }

            let mut hit = RayHit {
                kind: HitKind::Aabb,
                node: id,
                user: node.user,
                distance: tmin,
                position: ray.at(tmin),
            };
            if filter(node.user, id, tmin, tmax, &mut hit) {
                hits.push(hit);
            }
        }

        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box(x: f32, y: f32, z: f32) -> Box3 {
        Box3::from_center_size(Vector3::new(x, y, z), Vector3::ONE)
    }

    #[test]
    fn test_query_callback_counts() {
        let mut tree = Bvh::with_capacity(4);
        tree.insert(&unit_box(0.0, 0.0, 0.0), 10);
        tree.insert(&unit_box(1.0, 0.0, 0.0), 20);
        tree.insert(&unit_box(30.0, 0.0, 0.0), 30);

        let probe = Box3::from_center_size(Vector3::new(0.5, 0.0, 0.0), Vector3::ONE);
        let mut seen = Vec::new();
        let count = tree.query_overlaps(&probe, |user, _| {
            seen.push(user);
            1
        });
        assert_eq!(count, 2);
        seen.sort_unstable();
        assert_eq!(seen, vec![10, 20]);
    }

    #[test]
    fn test_query_callback_can_reject() {
        let mut tree = Bvh::with_capacity(4);
        tree.insert(&unit_box(0.0, 0.0, 0.0), 1);
        tree.insert(&unit_box(0.5, 0.0, 0.0), 2);
        let probe = unit_box(0.25, 0.0, 0.0);
        // Only count payloads above 1
        let count = tree.query_overlaps(&probe, |user, _| u32::from(user > 1));
        assert_eq!(count, 1);
    }

    #[test]
    fn test_raycast_orders_by_filter() {
        let mut tree = Bvh::with_capacity(4);
        tree.insert(&unit_box(0.0, 0.0, 0.0), 1);
        tree.insert(&unit_box(10.0, 0.0, 0.0), 2);

        let ray = Ray::new(Vector3::new(-5.0, 0.0, 0.0), Vector3::UNIT_X);
        let mut hits = tree.raycast(&ray, 100.0, RayFlags::NONE);
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].user, 1);
        assert_eq!(hits[1].user, 2);
    }

    #[test]
    fn test_raycast_max_distance() {
        let mut tree = Bvh::with_capacity(4);
        tree.insert(&unit_box(0.0, 0.0, 0.0), 1);
        tree.insert(&unit_box(10.0, 0.0, 0.0), 2);

        let ray = Ray::new(Vector3::new(-5.0, 0.0, 0.0), Vector3::UNIT_X);
        let hits = tree.raycast(&ray, 6.0, RayFlags::NONE);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].user, 1);
    }

    #[test]
    fn test_raycast_ignore_if_inside() {
        let mut tree = Bvh::with_capacity(4);
        tree.insert(&unit_box(0.0, 0.0, 0.0), 1);
        tree.insert(&unit_box(10.0, 0.0, 0.0), 2);

        let ray = Ray::new(Vector3::ZERO, Vector3::UNIT_X);
        let hits = tree.raycast(&ray, 100.0, RayFlags::IGNORE_IF_INSIDE);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].user, 2);
    }

    #[test]
    fn test_raycast_filter_overwrites_hit() {
        let mut tree = Bvh::with_capacity(4);
        tree.insert(&unit_box(0.0, 0.0, 0.0), 5);

        let ray = Ray::new(Vector3::new(-5.0, 0.0, 0.0), Vector3::UNIT_X);
        let hits = tree.raycast_with(&ray, 100.0, RayFlags::NONE, |_, _, _, tmax, hit| {
            // Commit the exit point instead of the entry point
            hit.distance = tmax;
            hit.position = ray.at(tmax);
            true
        });
        assert_eq!(hits.len(), 1);
        assert!((hits[0].distance - 5.6).abs() < 1e-4);
    }

    #[test]
    fn test_empty_tree_queries() {
        let tree = Bvh::with_capacity(4);
        assert!(tree.query(&unit_box(0.0, 0.0, 0.0)).is_empty());
        let ray = Ray::new(Vector3::ZERO, Vector3::UNIT_X);
        assert!(tree.raycast(&ray, 10.0, RayFlags::NONE).is_empty());
    }
}
