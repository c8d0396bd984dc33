//! The provider contract for a frame's own relative motion.

use kyne_math::{Pose, SpatialAcceleration, SpatialVelocity};
use serde::{Deserialize, Serialize};

/// The kinematic contribution a concrete frame makes at its own attachment:
/// everything is relative to the immediate parent and expressed in the
/// frame's own coordinates.
///
/// Implementations are pure functions of their internal state (joint
/// positions, commanded motion, ...). After mutating that state, the owner
/// must call the matching `FrameTree::notify_*_update` so that dependent
/// caches go stale before the next query.
///
/// The `Any` supertrait lets `FrameTree::kinematics_mut` hand the concrete
/// provider type back to its owner.
pub trait FrameKinematics: std::any::Any {
    /// Pose of this frame relative to its parent.
    fn relative_transform(&self) -> Pose;

    /// Spatial velocity relative to the parent, in this frame's coordinates.
    fn relative_spatial_velocity(&self) -> SpatialVelocity;

    /// The portion of relative acceleration that is not velocity-coupled.
    fn primary_relative_acceleration(&self) -> SpatialAcceleration;

    /// The velocity-coupling portion of relative acceleration.
    ///
    /// Separated from the primary part so a tree-wide forward pass can
    /// compute it once per frame from parent velocity instead of re-deriving
    /// it at every query.
    fn partial_acceleration(&self) -> SpatialAcceleration;

    /// Full spatial acceleration relative to the parent.
    fn relative_spatial_acceleration(&self) -> SpatialAcceleration {
        self.primary_relative_acceleration() + self.partial_acceleration()
    }

    /// Visualization hook invoked by `FrameTree::draw`.
    ///
    /// Must not mutate kinematic state; the tree passes the frame's current
    /// world pose.
    fn draw(&self, _world_transform: &Pose) {}
}

/// Relative state of a freely repositionable frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FreeState {
    /// Pose relative to the parent frame.
    pub pose: Pose,
    /// Spatial velocity relative to the parent, in this frame's coordinates.
    pub velocity: SpatialVelocity,
    /// Primary relative acceleration; the velocity-coupled part is derived
    /// by the tree from the frame's total velocity.
    pub acceleration: SpatialAcceleration,
}

impl Default for FreeState {
    fn default() -> Self {
        Self {
            pose: Pose::identity(),
            velocity: SpatialVelocity::zero(),
            acceleration: SpatialAcceleration::zero(),
        }
    }
}

/// Where a frame's relative motion comes from.
pub enum FrameSource {
    /// The immovable root: identity transform, zero velocity and
    /// acceleration. Reserved for the tree; `add_frame` rejects it.
    World,
    /// Constant offset from the parent; moves only because the parent moves.
    Fixed(Pose),
    /// Directly settable pose, velocity, and acceleration.
    Free(FreeState),
    /// External joint/body kinematics.
    Custom(Box<dyn FrameKinematics>),
}
