//! Rigid transforms and the adjoint maps they induce on spatial vectors.

use crate::spatial::SpatialVec;
use crate::{Mat3, Mat6, Vec3, skew};
use nalgebra as na;
use serde::{Deserialize, Serialize};

/// Pose of a frame B relative to a frame A.
///
/// Stored as rotation R and translation p such that a point expressed in B
/// maps into A as `x_A = R x_B + p`. Composition follows the same reading:
/// `T_AC = T_AB * T_BC`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// Orientation of B's axes, expressed in A.
    pub rot: Mat3,
    /// Origin of B, expressed in A.
    pub pos: Vec3,
}

impl Pose {
    /// Create from rotation matrix and translation.
    pub fn new(rot: Mat3, pos: Vec3) -> Self {
        Self { rot, pos }
    }

    /// Identity pose.
    pub fn identity() -> Self {
        Self {
            rot: Mat3::identity(),
            pos: Vec3::zeros(),
        }
    }

    /// Pure translation.
    pub fn from_translation(pos: Vec3) -> Self {
        Self {
            rot: Mat3::identity(),
            pos,
        }
    }

    /// Pure rotation about the X axis.
    pub fn rot_x(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        Self {
            rot: Mat3::new(1.0, 0.0, 0.0, 0.0, c, -s, 0.0, s, c),
            pos: Vec3::zeros(),
        }
    }

    /// Pure rotation about the Y axis.
    pub fn rot_y(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        Self {
            rot: Mat3::new(c, 0.0, s, 0.0, 1.0, 0.0, -s, 0.0, c),
            pos: Vec3::zeros(),
        }
    }

    /// Pure rotation about the Z axis.
    pub fn rot_z(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        Self {
            rot: Mat3::new(c, -s, 0.0, s, c, 0.0, 0.0, 0.0, 1.0),
            pos: Vec3::zeros(),
        }
    }

    /// Rotation about an arbitrary axis.
    pub fn from_axis_angle(axis: &na::Unit<Vec3>, angle: f64) -> Self {
        let rot = na::Rotation3::from_axis_angle(axis, angle);
        Self {
            rot: *rot.matrix(),
            pos: Vec3::zeros(),
        }
    }

    /// Map a point expressed in B into A's coordinates.
    #[inline]
    pub fn transform_point(&self, x: &Vec3) -> Vec3 {
        self.rot * x + self.pos
    }

    /// Rotate a free vector from B's coordinates into A's.
    #[inline]
    pub fn rotate(&self, v: &Vec3) -> Vec3 {
        self.rot * v
    }

    /// Inverse pose (A relative to B).
    pub fn inverse(&self) -> Pose {
        let rt = self.rot.transpose();
        Pose {
            rot: rt,
            pos: -(rt * self.pos),
        }
    }

    /// Adjoint map: re-express a spatial vector from B's coordinates into A's.
    ///
    /// `w_A = R w_B`, `v_A = R v_B + p × (R w_B)`.
    pub fn ad(&self, v: &SpatialVec) -> SpatialVec {
        let w = self.rot * v.angular();
        SpatialVec::new(w, self.rot * v.linear() + self.pos.cross(&w))
    }

    /// Inverse adjoint map: re-express a spatial vector from A into B.
    ///
    /// Equal to `self.inverse().ad(v)` without forming the inverse.
    pub fn ad_inv(&self, v: &SpatialVec) -> SpatialVec {
        let rt = self.rot.transpose();
        SpatialVec::new(
            rt * v.angular(),
            rt * (v.linear() - self.pos.cross(&v.angular())),
        )
    }

    /// Rotation-only adjoint: re-express axes without shifting the origin.
    pub fn ad_rot(&self, v: &SpatialVec) -> SpatialVec {
        SpatialVec::new(self.rot * v.angular(), self.rot * v.linear())
    }

    /// The 6x6 matrix of the adjoint map.
    ///
    /// Ad = | R       0 |
    ///      | [p]× R  R |
    pub fn adjoint_matrix(&self) -> Mat6 {
        let px_r = skew(&self.pos) * self.rot;
        let mut m = Mat6::zeros();
        m.fixed_view_mut::<3, 3>(0, 0).copy_from(&self.rot);
        m.fixed_view_mut::<3, 3>(3, 0).copy_from(&px_r);
        m.fixed_view_mut::<3, 3>(3, 3).copy_from(&self.rot);
        m
    }
}

impl std::ops::Mul for Pose {
    type Output = Pose;

    /// Compose: `T_AC = T_AB * T_BC`.
    fn mul(self, rhs: Pose) -> Pose {
        Pose {
            rot: self.rot * rhs.rot,
            pos: self.rot * rhs.pos + self.pos,
        }
    }
}
