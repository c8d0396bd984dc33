//! Structural error types for the frame tree.

use crate::tree::FrameId;
use thiserror::Error;

/// Violations of the tree structure.
///
/// Every violation is detected before any mutation is applied; a rejected
/// operation leaves the tree exactly as it found it.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum StructureError {
    #[error("the world frame cannot be reparented or removed")]
    WorldImmutable,

    #[error("reparenting frame {frame:?} under {new_parent:?} would create a cycle")]
    WouldCycle {
        frame: FrameId,
        new_parent: FrameId,
    },

    #[error("frame {0:?} still has children; reparent or remove them first")]
    HasChildren(FrameId),

    #[error("frame {0:?} does not carry free relative state")]
    NotFree(FrameId),
}

pub type Result<T> = std::result::Result<T, StructureError>;
