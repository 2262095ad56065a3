//! Euler angles implementation.

use super::Vector3;
use serde::{Deserialize, Serialize};

/// Order of Euler angle rotations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EulerOrder {
    /// X, then Y, then Z (Z applied to vectors first).
    #[default]
    XYZ,
    /// Z, then Y, then X (X applied to vectors first).
    ZYX,
}

/// Euler angles representation of rotation, in radians.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Euler {
    /// Rotation around X axis in radians.
    pub x: f32,
    /// Rotation around Y axis in radians.
    pub y: f32,
    /// Rotation around Z axis in radians.
    pub z: f32,
    /// Order of rotations.
    pub order: EulerOrder,
}

impl Euler {
    /// Zero rotation.
    pub const ZERO: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        order: EulerOrder::XYZ,
    };

    /// Create new Euler angles.
    #[inline]
    pub const fn new(x: f32, y: f32, z: f32, order: EulerOrder) -> Self {
        Self { x, y, z, order }
    }

    /// Create with default XYZ order.
    #[inline]
    pub const fn xyz(x: f32, y: f32, z: f32) -> Self {
        Self {
            x,
            y,
            z,
            order: EulerOrder::XYZ,
        }
    }

    /// Create XYZ-order angles from degrees.
    #[inline]
    pub fn xyz_degrees(x: f32, y: f32, z: f32) -> Self {
        Self::xyz(x.to_radians(), y.to_radians(), z.to_radians())
    }

    /// Convert to a Vector3 (x, y, z angles).
    #[inline]
    pub const fn to_vector3(&self) -> Vector3 {
        Vector3 {
            x: self.x,
            y: self.y,
            z: self.z,
        }
    }

    /// Check if approximately equal.
    #[inline]
    pub fn approx_eq(&self, other: &Euler, epsilon: f32) -> bool {
        (self.x - other.x).abs() < epsilon
            && (self.y - other.y).abs() < epsilon
            && (self.z - other.z).abs() < epsilon
            && self.order == other.order
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degrees() {
        let e = Euler::xyz_degrees(180.0, 0.0, 90.0);
        assert!((e.x - std::f32::consts::PI).abs() < 1e-6);
        assert!((e.z - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
    }
}
