//! Kinematic frame tree for the kyne toolkit.
//!
//! `FrameTree` is a runtime-mutable tree of reference frames rooted at a
//! world frame. Each frame reports its pose, velocity, and acceleration
//! relative to its parent; the tree composes these into world quantities on
//! demand, caching the results and invalidating whole subtrees eagerly when
//! relative state changes. Non-frame `Entity` records live inside frames and
//! receive the same change notifications.

pub mod entity;
pub mod error;
pub mod kinematics;
mod queries;
pub mod tree;

pub use entity::{ChildRef, EntityChanges, EntityId, FrameObserver};
pub use error::{Result, StructureError};
pub use kinematics::{FrameKinematics, FrameSource, FreeState};
pub use tree::{FrameId, FrameTree};
