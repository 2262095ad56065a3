//! Ray implementation for raycasting.

use super::{Box3, Vector3};
use serde::{Deserialize, Serialize};

/// Axis threshold below which a ray direction component is treated as zero.
const PARALLEL_EPSILON: f32 = 1e-8;

/// A ray with an origin and direction.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Ray {
    /// Origin point of the ray.
    pub origin: Vector3,
    /// Direction of the ray (should be normalized).
    pub direction: Vector3,
}

impl Ray {
    /// Create a new ray.
    #[inline]
    pub const fn new(origin: Vector3, direction: Vector3) -> Self {
        Self { origin, direction }
    }

    /// Get a point at distance t along the ray.
    #[inline]
    pub fn at(&self, t: f32) -> Vector3 {
        self.origin + self.direction * t
    }

    /// Slab-method intersection with a box, bounded by a maximum distance.
    ///
    /// Returns `(tmin, tmax)` on a hit. `tmin` may be negative when the
    /// origin lies inside the box; the test passes as long as part of the
    /// box is ahead of the origin (`tmax >= 0`) and not farther than
    /// `max_distance`. An axis with a near-zero direction component only
    /// passes if the origin lies within that slab.
    pub fn intersect_box_bounded(&self, box3: &Box3, max_distance: f32) -> Option<(f32, f32)> {
        let mut tmin = f32::NEG_INFINITY;
        let mut tmax = f32::INFINITY;

        let origin = self.origin.to_array();
        let dir = self.direction.to_array();
        let lo = box3.min.to_array();
        let hi = box3.max.to_array();

        for axis in 0..3 {
            if dir[axis].abs() < PARALLEL_EPSILON {
                if origin[axis] < lo[axis] || origin[axis] > hi[axis] {
                    return None;
                }
            } else {
                let inv = 1.0 / dir[axis];
                let t1 = (lo[axis] - origin[axis]) * inv;
                let t2 = (hi[axis] - origin[axis]) * inv;
                tmin = tmin.max(t1.min(t2));
                tmax = tmax.min(t1.max(t2));
            }
        }

        if tmin <= tmax && tmin <= max_distance && tmax >= 0.0 {
            Some((tmin, tmax))
        } else {
            None
        }
    }

    /// Check if the ray hits a box within a maximum distance.
    #[inline]
    pub fn intersects_box_bounded(&self, box3: &Box3, max_distance: f32) -> bool {
        self.intersect_box_bounded(box3, max_distance).is_some()
    }

    /// Check if approximately equal.
    pub fn approx_eq(&self, other: &Ray, epsilon: f32) -> bool {
        self.origin.approx_eq(&other.origin, epsilon)
            && self.direction.approx_eq(&other.direction, epsilon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_at() {
        let ray = Ray::new(Vector3::ZERO, Vector3::UNIT_Z);
        assert!(ray.at(5.0).approx_eq(&Vector3::new(0.0, 0.0, 5.0), 1e-6));
    }

    #[test]
    fn test_box_hit() {
        let ray = Ray::new(Vector3::new(-5.0, 0.5, 0.5), Vector3::UNIT_X);
        let b = Box3::new(Vector3::ZERO, Vector3::ONE);
        let (tmin, tmax) = ray.intersect_box_bounded(&b, 100.0).unwrap();
        assert!((tmin - 5.0).abs() < 1e-6);
        assert!((tmax - 6.0).abs() < 1e-6);
    }

    #[test]
    fn test_box_behind_origin() {
        let ray = Ray::new(Vector3::new(5.0, 0.5, 0.5), Vector3::UNIT_X);
        let b = Box3::new(Vector3::ZERO, Vector3::ONE);
        assert!(ray.intersect_box_bounded(&b, 100.0).is_none());
    }

    #[test]
    fn test_box_beyond_max_distance() {
        let ray = Ray::new(Vector3::new(-5.0, 0.5, 0.5), Vector3::UNIT_X);
        let b = Box3::new(Vector3::ZERO, Vector3::ONE);
        assert!(ray.intersect_box_bounded(&b, 4.0).is_none());
    }

    #[test]
    fn test_parallel_axis() {
        let b = Box3::new(Vector3::ZERO, Vector3::ONE);
        // Direction has no Y component; origin outside the Y slab
        let miss = Ray::new(Vector3::new(-5.0, 2.0, 0.5), Vector3::UNIT_X);
        assert!(miss.intersect_box_bounded(&b, 100.0).is_none());
        // Same ray moved inside the Y slab
        let hit = Ray::new(Vector3::new(-5.0, 0.5, 0.5), Vector3::UNIT_X);
        assert!(hit.intersect_box_bounded(&b, 100.0).is_some());
    }

    #[test]
    fn test_origin_inside() {
        let ray = Ray::new(Vector3::splat(0.5), Vector3::UNIT_X);
        let b = Box3::new(Vector3::ZERO, Vector3::ONE);
        let (tmin, tmax) = ray.intersect_box_bounded(&b, 100.0).unwrap();
        assert!(tmin < 0.0);
        assert!(tmax > 0.0);
    }
}
