//! 3D math library for the spatial core.

mod box3;
mod euler;
mod matrix4;
mod quaternion;
mod ray;
mod vector3;

pub use box3::Box3;
pub use euler::{Euler, EulerOrder};
pub use matrix4::Matrix4;
pub use quaternion::Quaternion;
pub use ray::Ray;
pub use vector3::Vector3;
