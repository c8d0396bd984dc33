//! kyne — kinematic coordinate-frame core.
//!
//! This is the umbrella crate that re-exports the frame tree and the
//! spatial algebra it is built on.
//!
//! ```
//! use kyne::{FrameTree, Pose, SpatialVelocity, Vec3};
//!
//! let mut tree = FrameTree::new();
//! let base = tree.add_free_frame("base", tree.world());
//! let tip = tree.add_fixed_frame(
//!     "tip",
//!     base,
//!     Pose::from_translation(Vec3::new(1.0, 0.0, 0.0)),
//! );
//!
//! // Spin the base about z; the tip's origin sweeps along +y.
//! tree.set_relative_spatial_velocity(
//!     base,
//!     SpatialVelocity::new(Vec3::new(0.0, 0.0, 1.0), Vec3::zeros()),
//! )
//! .unwrap();
//! let v = tree.linear_velocity(tip, tree.world(), tree.world());
//! assert!((v - Vec3::new(0.0, 1.0, 0.0)).norm() < 1e-12);
//! ```

pub use kyne_frame::{
    self, ChildRef, EntityChanges, EntityId, FrameId, FrameKinematics, FrameObserver, FrameSource,
    FrameTree, FreeState, Result, StructureError,
};
pub use kyne_math::{
    self, Mat3, Mat6, Pose, SpatialAcceleration, SpatialVec, SpatialVelocity, Vec3, Vec6, skew,
};
