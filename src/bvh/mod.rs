//! Dynamic bounding-volume hierarchy for broad-phase spatial queries.
//!
//! A self-balancing binary tree of padded AABBs supporting O(log n)
//! insert, remove, and update, plus overlap and ray queries. Leaf AABBs
//! are stored with a fixed margin so small motions do not restructure
//! the tree.

mod node;
mod query;
mod tree;

pub use node::{BvhNode, NULL_NODE};
pub use query::{HitKind, RayFlags, RayHit};
pub use tree::{Bvh, AABB_PADDING};
