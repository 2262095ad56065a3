//! # Kestrel - Real-Time Engine Spatial Core
//!
//! Kestrel provides the two spatial workhorses of a real-time engine
//! runtime: a dynamic bounding-volume hierarchy for broad-phase queries
//! over moving objects, and a hierarchical transform system that feeds
//! world matrices to the GPU once per frame.
//!
//! ## Features
//!
//! - **Math**: self-contained 3D math library (vectors, quaternions, matrices)
//! - **BVH**: incremental AABB tree with SAH insertion and AVL-style rotations
//! - **Transforms**: handle-addressed SoA storage, depth-ordered dirty updates
//! - **GPU mirror**: world matrices copied into a wgpu storage buffer per frame
//!
//! ## Example
//!
//! ```
//! use kestrel::prelude::*;
//!
//! let mut bvh = Bvh::with_capacity(64);
//! let cube = Box3::from_center_size(Vector3::ZERO, Vector3::ONE);
//! let id = bvh.insert(&cube, 42);
//!
//! let mut transforms = TransformSystem::new();
//! let a = transforms.from_position(Vector3::new(1.0, 0.0, 0.0), 0);
//! let b = transforms.from_position(Vector3::new(0.0, 1.0, 0.0), 0);
//! transforms.parent_set(b, a);
//! transforms.update();
//!
//! assert_eq!(bvh.user(id), Some(42));
//! assert!(transforms.world_position_get(b).approx_eq(&Vector3::new(1.0, 1.0, 0.0), 1e-6));
//! ```

#![warn(missing_docs)]

pub mod bvh;
pub mod math;
pub mod transform;

// Re-export commonly used types
pub mod prelude {
    //! Convenient re-exports of commonly used types.

    pub use crate::bvh::*;
    pub use crate::math::*;
    pub use crate::transform::*;
}

/// Engine version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const NAME: &str = "Kestrel";
