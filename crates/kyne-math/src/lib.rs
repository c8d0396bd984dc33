//! Spatial algebra and math primitives for the kyne frame tree.
//!
//! Implements rigid poses and 6D spatial vectors following Featherstone's
//! conventions. Spatial vectors are [angular; linear]; a pose carries the
//! adjoint maps that re-express a spatial vector between frames.

pub mod pose;
pub mod spatial;

pub use pose::Pose;
pub use spatial::{SpatialAcceleration, SpatialVec, SpatialVelocity};

use nalgebra as na;

/// 3D vector alias.
pub type Vec3 = na::Vector3<f64>;
/// 3x3 matrix alias.
pub type Mat3 = na::Matrix3<f64>;
/// 6D vector alias.
pub type Vec6 = na::Vector6<f64>;
/// 6x6 matrix alias.
pub type Mat6 = na::Matrix6<f64>;

/// Cross-product matrix: [v]× such that [v]× w = v × w.
#[inline]
pub fn skew(v: &Vec3) -> Mat3 {
    Mat3::new(0.0, -v.z, v.y, v.z, 0.0, -v.x, -v.y, v.x, 0.0)
}
