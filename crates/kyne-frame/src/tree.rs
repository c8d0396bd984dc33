//! The kinematic frame tree: structure, membership, and invalidation.

use std::cell::Cell;

use kyne_math::{Pose, SpatialVec};
use tracing::debug;

use crate::entity::{ChildRef, EntityChanges, EntityId, EntityNode, FrameObserver};
use crate::error::{Result, StructureError};
use crate::kinematics::{FrameKinematics, FrameSource, FreeState};

/// Identifier of a frame within a [`FrameTree`].
///
/// Ids are never reused; using the id of a removed frame panics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(pub(crate) usize);

impl FrameId {
    /// The world frame at the root of every tree.
    pub const WORLD: FrameId = FrameId(0);
}

/// Cached world-space quantities of one frame.
///
/// The cells let a logically read-only query rebuild a stale value in place;
/// nothing else observes the refresh. Each quantity is either valid or
/// invalid, flipped invalid by the eager notification walk and valid again by
/// the next query.
#[derive(Debug)]
pub(crate) struct FrameCache {
    pub(crate) world_transform: Cell<Pose>,
    pub(crate) velocity: Cell<SpatialVec>,
    pub(crate) acceleration: Cell<SpatialVec>,
    pub(crate) transform_dirty: Cell<bool>,
    pub(crate) velocity_dirty: Cell<bool>,
    pub(crate) acceleration_dirty: Cell<bool>,
}

impl FrameCache {
    /// All quantities stale, the state of a freshly attached frame.
    fn stale() -> Self {
        Self {
            world_transform: Cell::new(Pose::identity()),
            velocity: Cell::new(SpatialVec::zero()),
            acceleration: Cell::new(SpatialVec::zero()),
            transform_dirty: Cell::new(true),
            velocity_dirty: Cell::new(true),
            acceleration_dirty: Cell::new(true),
        }
    }

    /// The world frame's cache: fixed constants, never dirty.
    fn world() -> Self {
        Self {
            world_transform: Cell::new(Pose::identity()),
            velocity: Cell::new(SpatialVec::zero()),
            acceleration: Cell::new(SpatialVec::zero()),
            transform_dirty: Cell::new(false),
            velocity_dirty: Cell::new(false),
            acceleration_dirty: Cell::new(false),
        }
    }
}

pub(crate) struct FrameNode {
    pub(crate) name: String,
    /// `None` only for the world frame.
    pub(crate) parent: Option<FrameId>,
    pub(crate) source: FrameSource,
    pub(crate) child_frames: Vec<FrameId>,
    pub(crate) child_entities: Vec<EntityId>,
    pub(crate) observer: Option<Box<dyn FrameObserver>>,
    pub(crate) cache: FrameCache,
}

/// A tree of reference frames rooted at the world frame.
///
/// Frames track their pose, velocity, and acceleration relative to their
/// parent and lazily derive the world-space equivalents on demand. Mutations
/// (reparenting, relative-state changes) invalidate the affected subtree
/// eagerly and synchronously, so no query ever observes a stale value.
///
/// Single-threaded: callers needing cross-thread access must wrap the tree
/// in their own mutual exclusion.
pub struct FrameTree {
    frames: Vec<Option<FrameNode>>,
    entities: Vec<Option<EntityNode>>,
}

impl FrameTree {
    /// Create a tree containing only the world frame.
    ///
    /// The world frame is built exactly once per tree, carries identity
    /// transform and zero velocity/acceleration forever, and can never be
    /// reparented or removed.
    pub fn new() -> Self {
        let world = FrameNode {
            name: "world".to_string(),
            parent: None,
            source: FrameSource::World,
            child_frames: Vec::new(),
            child_entities: Vec::new(),
            observer: None,
            cache: FrameCache::world(),
        };
        Self {
            frames: vec![Some(world)],
            entities: Vec::new(),
        }
    }

    /// The root of this tree.
    pub fn world(&self) -> FrameId {
        FrameId::WORLD
    }

    pub(crate) fn node(&self, id: FrameId) -> &FrameNode {
        self.frames[id.0].as_ref().expect("use of a removed frame id")
    }

    fn node_mut(&mut self, id: FrameId) -> &mut FrameNode {
        self.frames[id.0].as_mut().expect("use of a removed frame id")
    }

    pub(crate) fn entity(&self, id: EntityId) -> &EntityNode {
        self.entities[id.0]
            .as_ref()
            .expect("use of a removed entity id")
    }

    fn entity_mut(&mut self, id: EntityId) -> &mut EntityNode {
        self.entities[id.0]
            .as_mut()
            .expect("use of a removed entity id")
    }

    //--------------------------------------------------------------------
    // Construction & removal
    //--------------------------------------------------------------------

    /// Attach a new frame under `parent`.
    ///
    /// The frame starts with every cache stale and fires the parent's
    /// `child_attached` observer. Panics if `source` is `FrameSource::World`.
    pub fn add_frame(&mut self, name: &str, parent: FrameId, source: FrameSource) -> FrameId {
        assert!(
            !matches!(source, FrameSource::World),
            "FrameSource::World is reserved for the tree root"
        );
        let _ = self.node(parent);
        let id = FrameId(self.frames.len());
        self.frames.push(Some(FrameNode {
            name: name.to_string(),
            parent: Some(parent),
            source,
            child_frames: Vec::new(),
            child_entities: Vec::new(),
            observer: None,
            cache: FrameCache::stale(),
        }));
        self.node_mut(parent).child_frames.push(id);
        debug!(frame = name, ?id, ?parent, "frame attached");
        self.fire_attached(parent, ChildRef::Frame(id));
        id
    }

    /// Attach a frame at a constant offset from `parent`.
    pub fn add_fixed_frame(&mut self, name: &str, parent: FrameId, pose: Pose) -> FrameId {
        self.add_frame(name, parent, FrameSource::Fixed(pose))
    }

    /// Attach a freely repositionable frame under `parent`, initially at the
    /// parent's origin and at rest.
    pub fn add_free_frame(&mut self, name: &str, parent: FrameId) -> FrameId {
        self.add_frame(name, parent, FrameSource::Free(FreeState::default()))
    }

    /// Attach a new entity under `parent`, with all change flags raised.
    pub fn add_entity(&mut self, name: &str, parent: FrameId) -> EntityId {
        let _ = self.node(parent);
        let id = EntityId(self.entities.len());
        self.entities.push(Some(EntityNode::new(name, parent)));
        self.node_mut(parent).child_entities.push(id);
        debug!(entity = name, ?id, ?parent, "entity attached");
        self.fire_attached(parent, ChildRef::Entity(id));
        id
    }

    /// Detach and destroy a frame.
    ///
    /// Rejected for the world frame and for frames that still own child
    /// frames or entities: those must be reparented or removed first. The id
    /// is never reused.
    pub fn remove_frame(&mut self, frame: FrameId) -> Result<()> {
        if frame == FrameId::WORLD {
            return Err(StructureError::WorldImmutable);
        }
        let node = self.node(frame);
        if !node.child_frames.is_empty() || !node.child_entities.is_empty() {
            return Err(StructureError::HasChildren(frame));
        }
        let parent = node.parent.expect("non-world frame has a parent");
        self.node_mut(parent).child_frames.retain(|&c| c != frame);
        self.frames[frame.0] = None;
        debug!(?frame, ?parent, "frame removed");
        self.fire_detached(parent, ChildRef::Frame(frame));
        Ok(())
    }

    /// Detach and destroy an entity. The id is never reused.
    pub fn remove_entity(&mut self, entity: EntityId) {
        let parent = self.entity(entity).parent;
        self.node_mut(parent).child_entities.retain(|&e| e != entity);
        self.entities[entity.0] = None;
        debug!(?entity, ?parent, "entity removed");
        self.fire_detached(parent, ChildRef::Entity(entity));
    }

    //--------------------------------------------------------------------
    // Reparenting
    //--------------------------------------------------------------------

    /// Move `frame` (and with it, its whole subtree) under `new_parent`.
    ///
    /// A no-op when the parent is unchanged. Rejected, with the tree left
    /// untouched, when `frame` is the world or when `new_parent` is `frame`
    /// itself or one of its descendants. On success the old parent's
    /// `child_detached` and the new parent's `child_attached` observers fire,
    /// and a transform notification sweeps the moved subtree (velocity and
    /// acceleration caches go stale through the cascade).
    ///
    /// The frame keeps its *relative* state, so its world pose changes unless
    /// the caller compensates.
    pub fn set_parent(&mut self, frame: FrameId, new_parent: FrameId) -> Result<()> {
        if frame == FrameId::WORLD {
            return Err(StructureError::WorldImmutable);
        }
        let _ = self.node(new_parent);
        let old_parent = self.node(frame).parent.expect("non-world frame has a parent");
        if old_parent == new_parent {
            return Ok(());
        }
        if self.is_or_descends_from(new_parent, frame) {
            return Err(StructureError::WouldCycle { frame, new_parent });
        }

        self.node_mut(old_parent).child_frames.retain(|&c| c != frame);
        self.node_mut(frame).parent = Some(new_parent);
        self.node_mut(new_parent).child_frames.push(frame);
        debug!(?frame, ?old_parent, ?new_parent, "frame reparented");
        self.fire_detached(old_parent, ChildRef::Frame(frame));
        self.fire_attached(new_parent, ChildRef::Frame(frame));
        self.notify_transform_update(frame);
        Ok(())
    }

    /// Move an entity to a new parent frame.
    ///
    /// No-op when the parent is unchanged; otherwise updates both membership
    /// sets, fires the detach/attach observers, and raises all of the
    /// entity's change flags (its effective ancestry changed).
    pub fn set_entity_parent(&mut self, entity: EntityId, new_parent: FrameId) {
        let _ = self.node(new_parent);
        let old_parent = self.entity(entity).parent;
        if old_parent == new_parent {
            return;
        }
        self.node_mut(old_parent).child_entities.retain(|&e| e != entity);
        self.entity_mut(entity).parent = new_parent;
        self.node_mut(new_parent).child_entities.push(entity);
        debug!(?entity, ?old_parent, ?new_parent, "entity reparented");
        self.fire_detached(old_parent, ChildRef::Entity(entity));
        self.fire_attached(new_parent, ChildRef::Entity(entity));
        let changes = &self.entity(entity).changes;
        changes.raise_transform();
        changes.raise_velocity();
        changes.raise_acceleration();
    }

    /// True when `candidate` is `ancestor` or lies in its subtree.
    fn is_or_descends_from(&self, candidate: FrameId, ancestor: FrameId) -> bool {
        let mut cursor = Some(candidate);
        while let Some(id) = cursor {
            if id == ancestor {
                return true;
            }
            cursor = self.node(id).parent;
        }
        false
    }

    //--------------------------------------------------------------------
    // Membership
    //--------------------------------------------------------------------

    /// Parent frame; `None` only for the world.
    pub fn parent(&self, frame: FrameId) -> Option<FrameId> {
        self.node(frame).parent
    }

    /// The frames whose parent is `frame`.
    pub fn child_frames(&self, frame: FrameId) -> &[FrameId] {
        &self.node(frame).child_frames
    }

    /// Number of child frames.
    pub fn child_frame_count(&self, frame: FrameId) -> usize {
        self.node(frame).child_frames.len()
    }

    /// The entities whose parent is `frame`.
    pub fn child_entities(&self, frame: FrameId) -> &[EntityId] {
        &self.node(frame).child_entities
    }

    /// Number of child entities.
    pub fn child_entity_count(&self, frame: FrameId) -> usize {
        self.node(frame).child_entities.len()
    }

    /// True only for the unique world frame.
    pub fn is_world(&self, frame: FrameId) -> bool {
        frame == FrameId::WORLD
    }

    /// True while `frame` has not been removed.
    pub fn contains_frame(&self, frame: FrameId) -> bool {
        self.frames.get(frame.0).is_some_and(|slot| slot.is_some())
    }

    /// True while `entity` has not been removed.
    pub fn contains_entity(&self, entity: EntityId) -> bool {
        self.entities
            .get(entity.0)
            .is_some_and(|slot| slot.is_some())
    }

    pub fn frame_name(&self, frame: FrameId) -> &str {
        &self.node(frame).name
    }

    pub fn entity_name(&self, entity: EntityId) -> &str {
        &self.entity(entity).name
    }

    /// Current parent frame of an entity.
    pub fn entity_parent(&self, entity: EntityId) -> FrameId {
        self.entity(entity).parent
    }

    //--------------------------------------------------------------------
    // Observers
    //--------------------------------------------------------------------

    /// Install the attach/detach observer of a frame, replacing any previous
    /// one.
    pub fn set_observer(&mut self, frame: FrameId, observer: Box<dyn FrameObserver>) {
        self.node_mut(frame).observer = Some(observer);
    }

    /// Remove and return a frame's observer, if any.
    pub fn take_observer(&mut self, frame: FrameId) -> Option<Box<dyn FrameObserver>> {
        self.node_mut(frame).observer.take()
    }

    fn fire_attached(&mut self, frame: FrameId, child: ChildRef) {
        if let Some(mut observer) = self.node_mut(frame).observer.take() {
            observer.child_attached(child);
            self.node_mut(frame).observer = Some(observer);
        }
    }

    fn fire_detached(&mut self, frame: FrameId, child: ChildRef) {
        if let Some(mut observer) = self.node_mut(frame).observer.take() {
            observer.child_detached(child);
            self.node_mut(frame).observer = Some(observer);
        }
    }

    //--------------------------------------------------------------------
    // Relative-state mutation
    //--------------------------------------------------------------------

    /// Set the relative pose of a free frame, then invalidate the subtree's
    /// transforms (and, through the cascade, velocities and accelerations).
    pub fn set_relative_transform(&mut self, frame: FrameId, pose: Pose) -> Result<()> {
        match &mut self.node_mut(frame).source {
            FrameSource::Free(state) => state.pose = pose,
            _ => return Err(StructureError::NotFree(frame)),
        }
        self.notify_transform_update(frame);
        Ok(())
    }

    /// Set the relative spatial velocity of a free frame, then invalidate the
    /// subtree's velocities and accelerations.
    pub fn set_relative_spatial_velocity(
        &mut self,
        frame: FrameId,
        velocity: SpatialVec,
    ) -> Result<()> {
        match &mut self.node_mut(frame).source {
            FrameSource::Free(state) => state.velocity = velocity,
            _ => return Err(StructureError::NotFree(frame)),
        }
        self.notify_velocity_update(frame);
        Ok(())
    }

    /// Set the primary relative acceleration of a free frame, then invalidate
    /// the subtree's accelerations.
    pub fn set_relative_spatial_acceleration(
        &mut self,
        frame: FrameId,
        acceleration: SpatialVec,
    ) -> Result<()> {
        match &mut self.node_mut(frame).source {
            FrameSource::Free(state) => state.acceleration = acceleration,
            _ => return Err(StructureError::NotFree(frame)),
        }
        self.notify_acceleration_update(frame);
        Ok(())
    }

    /// Mutable access to a `Custom` frame's concrete kinematics provider.
    ///
    /// Returns `None` when the frame is not custom or carries a different
    /// provider type. After changing provider state, call the matching
    /// `notify_*_update`; the tree cannot see inside the provider.
    pub fn kinematics_mut<K: FrameKinematics>(&mut self, frame: FrameId) -> Option<&mut K> {
        match &mut self.node_mut(frame).source {
            FrameSource::Custom(kinematics) => {
                let provider: &mut dyn std::any::Any = kinematics.as_mut();
                provider.downcast_mut::<K>()
            }
            _ => None,
        }
    }

    //--------------------------------------------------------------------
    // Invalidation
    //--------------------------------------------------------------------

    /// This frame's pose changed: invalidate the world transform (and the
    /// dependent velocity and acceleration) of the frame and of its entire
    /// subtree, and raise the matching change flags on every entity below.
    ///
    /// Eager, depth-first, and unconditional: re-invalidating an
    /// already-stale descendant is a harmless no-op. Completes before
    /// returning; the world frame's own constants are never marked stale.
    pub fn notify_transform_update(&mut self, frame: FrameId) {
        self.invalidate_transform(frame);
    }

    /// This frame's relative velocity changed: invalidate velocities and
    /// accelerations over the subtree.
    pub fn notify_velocity_update(&mut self, frame: FrameId) {
        self.invalidate_velocity(frame);
    }

    /// This frame's relative acceleration changed: invalidate accelerations
    /// over the subtree.
    pub fn notify_acceleration_update(&mut self, frame: FrameId) {
        self.invalidate_acceleration(frame);
    }

    // The walkers only touch cells, so the recursion can hold shared
    // borrows of the child lists.

    fn invalidate_transform(&self, frame: FrameId) {
        // World velocity depends on the world transform through the adjoint.
        self.invalidate_velocity(frame);
        let node = self.node(frame);
        if node.parent.is_some() {
            node.cache.transform_dirty.set(true);
        }
        for &child in &node.child_frames {
            self.invalidate_transform(child);
        }
        for &entity in &node.child_entities {
            self.entity(entity).changes.raise_transform();
        }
    }

    fn invalidate_velocity(&self, frame: FrameId) {
        // World acceleration depends on the world velocity.
        self.invalidate_acceleration(frame);
        let node = self.node(frame);
        if node.parent.is_some() {
            node.cache.velocity_dirty.set(true);
        }
        for &child in &node.child_frames {
            self.invalidate_velocity(child);
        }
        for &entity in &node.child_entities {
            self.entity(entity).changes.raise_velocity();
        }
    }

    fn invalidate_acceleration(&self, frame: FrameId) {
        let node = self.node(frame);
        if node.parent.is_some() {
            node.cache.acceleration_dirty.set(true);
        }
        for &child in &node.child_frames {
            self.invalidate_acceleration(child);
        }
        for &entity in &node.child_entities {
            self.entity(entity).changes.raise_acceleration();
        }
    }

    //--------------------------------------------------------------------
    // Entity change flags
    //--------------------------------------------------------------------

    /// Snapshot of an entity's raised change flags.
    pub fn entity_changes(&self, entity: EntityId) -> EntityChanges {
        self.entity(entity).changes.snapshot()
    }

    /// Lower all of an entity's change flags.
    pub fn clear_entity_changes(&mut self, entity: EntityId) {
        self.entity(entity).changes.clear();
    }
}

impl Default for FrameTree {
    fn default() -> Self {
        Self::new()
    }
}
