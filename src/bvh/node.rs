//! Node pool records for the dynamic AABB tree.

use crate::math::Box3;

/// Null node sentinel.
pub const NULL_NODE: u32 = u32::MAX;

/// A node in the dynamic AABB tree.
///
/// Leaves carry a padded AABB and a user payload with `height == 0` and
/// no children. Internal nodes carry the union of their children's AABBs
/// and `height == 1 + max(child heights)`. A slot with `height == -1` is
/// free; while free, its `parent` field holds the next free slot.
#[derive(Clone, Debug)]
pub struct BvhNode {
    /// Padded AABB (leaf) or union of child AABBs (internal).
    pub aabb: Box3,
    /// Opaque user payload; meaningful for leaves only.
    pub user: u64,
    /// Parent node index, or the free-list link while `height == -1`.
    pub parent: u32,
    /// Left child (`NULL_NODE` for leaves).
    pub left: u32,
    /// Right child (`NULL_NODE` for leaves).
    pub right: u32,
    /// 0 for leaves, `1 + max(child heights)` for internal, -1 when free.
    pub height: i32,
    /// Set when the leaf was inserted or reinserted by an update.
    pub moved: bool,
}

impl BvhNode {
    /// Create a free pool slot.
    pub(crate) fn free_slot() -> Self {
        Self {
            aabb: Box3::EMPTY,
            user: 0,
            parent: NULL_NODE,
            left: NULL_NODE,
            right: NULL_NODE,
            height: -1,
            moved: false,
        }
    }

    /// Check if this node is a leaf.
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.left == NULL_NODE && self.height >= 0
    }

    /// Check if this pool slot is free.
    #[inline]
    pub fn is_free(&self) -> bool {
        self.height < 0
    }
}
